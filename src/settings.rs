use std::fmt::{Debug, Formatter, Result};
use std::io;
use std::thread::{Builder, JoinHandle};

/* ---------- */

/// Used to configure the properties of a worker's thread.
pub struct Settings {
    builder: Builder,
    cores: Vec<usize>,
}

impl Settings {
    /// Returns the base [`Settings`] with default parameters.
    #[inline]
    pub fn new() -> Self {
        Self {
            builder: Builder::new(),
            cores: Vec::new(),
        }
    }

    /// Sets the thread's name.
    ///
    /// The name must not contains null bytes (`\0`).
    #[inline]
    pub fn name<T: ToString>(self, name: T) -> Self {
        Self {
            builder: self.builder.name(name.to_string()),
            ..self
        }
    }

    /// Sets the thread's stack size.
    ///
    /// The actual stack size may be greater than this value if the platform specifies a minimal stack size.
    #[inline]
    pub fn stack_size(self, size: usize) -> Self {
        Self {
            builder: self.builder.stack_size(size),
            ..self
        }
    }

    /// Pins the thread to the given CPU IDs.
    ///
    /// An empty list leaves the affinity to the OS scheduler.
    #[inline]
    pub fn pinned<C: Into<Vec<usize>>>(self, cores: C) -> Self {
        Self {
            cores: cores.into(),
            ..self
        }
    }

    /// Spawns `f` in a new thread configured with these settings.
    ///
    /// Failing to set the affinity isn't fatal: the thread runs unpinned and a warning is logged.
    pub(crate) fn spawn<F>(self, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let cores = self.cores;

        self.builder.spawn(move || {
            if !cores.is_empty() {
                if let Err(err) = affinity::set_thread_affinity(&cores) {
                    tracing::warn!(?cores, "failed to pin worker thread: {err}");
                }
            }

            f()
        })
    }
}

impl Default for Settings {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Settings {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Settings")
            .field("builder", &self.builder)
            .field("cores", &self.cores)
            .finish()
    }
}

/* ---------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_thread() {
        let (tx, rx) = crossbeam_channel::bounded(1);

        Settings::new()
            .name("pizzeria-test")
            .stack_size(256 * 1024)
            .spawn(move || {
                let name = std::thread::current().name().map(str::to_owned);
                tx.send(name).unwrap();
            })
            .expect("failed to spawn the thread")
            .join()
            .unwrap();

        assert_eq!(rx.recv().unwrap().as_deref(), Some("pizzeria-test"));
    }

    #[test]
    fn pinned_thread() {
        let (tx, rx) = crossbeam_channel::bounded(1);

        Settings::new()
            .pinned([0])
            .spawn(move || {
                tx.send(affinity::get_thread_affinity().unwrap()).unwrap();
            })
            .expect("failed to spawn the thread")
            .join()
            .unwrap();

        assert_eq!(rx.recv().unwrap(), vec![0]);
    }
}
