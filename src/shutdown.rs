use std::fmt::{Debug, Formatter};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::iterator::{Handle, Signals};
use signal_hook::flag;

use crate::Cancelled;

/* ---------- */

type Hook = Box<dyn FnOnce() + Send>;

/// A cancellation token shared by a [`Coordinator`] and all its workers.
///
/// Workers check [`Shutdown::is_running`] between iterations and sleep through
/// [`Shutdown::sleep`], which returns early once [`Shutdown::stop`] is called.
/// Blocking operations living outside the token (like [`BoundedQueue::pop`]) are
/// interrupted through hooks registered with [`Shutdown::on_stop`].
///
/// [`Coordinator`]: crate::Coordinator
/// [`BoundedQueue::pop`]: crate::BoundedQueue::pop
#[derive(Default, Clone)]
pub struct Shutdown(Arc<Inner>);

#[derive(Default)]
struct Inner {
    stopped: Arc<AtomicBool>,
    hooks: Mutex<Hooks>,
    wakeup: Condvar,
}

#[derive(Default)]
struct Hooks {
    fired: bool,
    pending: Vec<Hook>,
}

impl Shutdown {
    /// Returns a new running token.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether or not the workers should keep running.
    #[inline]
    pub fn is_running(&self) -> bool {
        !self.0.stopped.load(Ordering::SeqCst)
    }

    /// Requests every worker sharing this token to stop.
    ///
    /// Wakes up sleeping workers and runs the registered hooks, once. Calling it
    /// again is a no-op.
    pub fn stop(&self) {
        self.0.stopped.store(true, Ordering::SeqCst);

        let hooks = {
            let mut hooks = self.0.lock_hooks();
            self.0.wakeup.notify_all();

            if hooks.fired {
                return;
            }

            hooks.fired = true;
            std::mem::take(&mut hooks.pending)
        };

        for hook in hooks {
            hook();
        }
    }

    /// Registers `hook` to be called when the token is stopped.
    ///
    /// If the token is already stopped, `hook` is called right away.
    pub fn on_stop<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut hooks = self.0.lock_hooks();
        if hooks.fired {
            drop(hooks);
            hook();
            return;
        }

        hooks.pending.push(Box::new(hook));
    }

    /// Blocks the calling thread for `duration`, or until the token is stopped.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the token is stopped before or while sleeping.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pizzeria::{Shutdown, Cancelled};
    /// # use std::time::{Duration, Instant};
    /// let shutdown = Shutdown::new();
    /// let stopper = shutdown.clone();
    ///
    /// std::thread::spawn(move || {
    ///     std::thread::sleep(Duration::from_millis(50));
    ///     stopper.stop();
    /// });
    ///
    /// let now = Instant::now();
    /// assert_eq!(shutdown.sleep(Duration::from_secs(60)), Err(Cancelled));
    /// assert!(now.elapsed() < Duration::from_secs(60));
    /// ```
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now() + duration;
        let mut hooks = self.0.lock_hooks();

        loop {
            if !self.is_running() {
                return Err(Cancelled);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }

            hooks = match self.0.wakeup.wait_timeout(hooks, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

impl Inner {
    // Hooks run outside the lock, the guarded state can't be left half-updated.
    #[inline]
    fn lock_hooks(&self) -> MutexGuard<'_, Hooks> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for Shutdown {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shutdown")
            .field("running", &self.is_running())
            .finish()
    }
}

/* ---------- */

/// Stops `shutdown` on the first termination signal.
///
/// If for some reasons the workers aren't stopped after the first signal,
/// users can send another one to kill the process ungracefully.
///
/// The flag handlers stay installed for the life of the process: once the token
/// is stopped, any termination signal kills the process.
pub(crate) fn enable_graceful_shutdown(shutdown: &Shutdown) -> io::Result<SignalWatcher> {
    for sig in TERM_SIGNALS {
        flag::register_conditional_shutdown(*sig, 1, shutdown.0.stopped.clone())?;
        flag::register(*sig, shutdown.0.stopped.clone())?;
    }

    let mut signals = Signals::new(TERM_SIGNALS)?;
    let handle = signals.handle();
    let shutdown = shutdown.clone();

    let thread = std::thread::Builder::new()
        .name("pizzeria-signals".to_owned())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                tracing::info!(signal = sig, "termination signal received, shutting down");
                shutdown.stop();
            }
        })?;

    Ok(SignalWatcher {
        handle,
        thread: Some(thread),
    })
}

/// Owns the signal handlers installed by [`enable_graceful_shutdown`].
///
/// Dropping it stops watching for the first signal.
pub(crate) struct SignalWatcher {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for SignalWatcher {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/* ---------- */

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn sleep_full_duration() {
        let shutdown = Shutdown::new();
        let now = Instant::now();

        assert_eq!(shutdown.sleep(Duration::from_millis(100)), Ok(()));
        assert!(now.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn sleep_zero() {
        assert_eq!(Shutdown::new().sleep(Duration::ZERO), Ok(()));
    }

    #[test]
    fn stop_interrupts_sleep() {
        let shutdown = Shutdown::new();
        let stopper = shutdown.clone();
        let now = Instant::now();

        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            stopper.stop();
        });

        assert_eq!(shutdown.sleep(Duration::from_secs(30)), Err(Cancelled));
        assert!(now.elapsed() < Duration::from_secs(5));
        thread.join().unwrap();
    }

    #[test]
    fn sleep_after_stop() {
        let shutdown = Shutdown::new();
        shutdown.stop();

        assert!(!shutdown.is_running());
        assert_eq!(shutdown.sleep(Duration::ZERO), Err(Cancelled));
    }

    #[test]
    fn hooks_run_once() {
        let shutdown = Shutdown::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        shutdown.on_stop(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        shutdown.stop();
        shutdown.stop();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Registered late, called right away.
        let counter = calls.clone();
        shutdown.on_stop(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clones_share_state() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();

        assert!(clone.is_running());
        shutdown.stop();
        assert!(!clone.is_running());
    }
}
