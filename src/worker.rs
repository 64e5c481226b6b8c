use std::ops::DerefMut;

use crate::settings::Settings;
use crate::shutdown::Shutdown;
use crate::Error;

/* ---------- */

/// A worker is a loop running on its own thread until its [`Shutdown`] token is stopped.
///
/// Producers and consumers are workers: they never talk to each other directly, every
/// interaction goes through the [`BoundedQueue`] they were given when built.
///
/// Workers are defined by one main method, [`Worker::run`], which runs the actual loop. This method
/// has a default implementation that first calls the [`Worker::on_start`] method once, then calls
/// [`Worker::on_update`] in the loop until it returns [`ControlFlow::Break`] or the token is stopped.
///
/// # Examples
///
/// A worker counting its iterations, sleeping 10ms between each of them:
///
/// ```
/// # use pizzeria::{Worker, ControlFlow, Shutdown};
/// # use std::time::Duration;
/// #[derive(Debug, Default)]
/// struct Counter {
///     count: usize
/// }
///
/// impl Worker for Counter {
///     fn on_update(&mut self, shutdown: &Shutdown) -> ControlFlow {
///         self.count += 1;
///         if self.count == 10 {
///             return ControlFlow::Break;
///         }
///
///         // An interrupted sleep means we're asked to stop.
///         match shutdown.sleep(Duration::from_millis(10)) {
///             Ok(()) => ControlFlow::Continue,
///             Err(_) => ControlFlow::Break,
///         }
///     }
/// }
///
/// let mut counter = Counter::default();
/// counter.run(Shutdown::new());
/// assert_eq!(counter.count, 10);
/// ```
///
/// [`BoundedQueue`]: crate::BoundedQueue
pub trait Worker: Send {
    /// Called once before entering the worker loop.
    ///
    /// By default, this does nothing.
    #[inline]
    fn on_start(&mut self) {}

    /// Does one iteration of the worker loop.
    ///
    /// `shutdown` is the token the worker runs under, blocking calls should go through it
    /// so they can be interrupted. By default, this method just returns [`ControlFlow::Break`].
    #[inline]
    fn on_update(&mut self, _shutdown: &Shutdown) -> ControlFlow {
        ControlFlow::Break
    }

    /// Main worker loop, spawned in a new thread by the [`Coordinator`].
    ///
    /// By default, this first calls [`Worker::on_start`] then [`Worker::on_update`] in a loop
    /// that spins until [`shutdown.is_running()`] returns `false`.
    ///
    /// [`Coordinator`]: crate::Coordinator
    /// [`shutdown.is_running()`]: crate::Shutdown::is_running
    #[inline]
    fn run(&mut self, shutdown: Shutdown) {
        self.on_start();

        while shutdown.is_running() {
            if let ControlFlow::Break = self.on_update(&shutdown) {
                break;
            }
        }
    }
}

impl<T: Worker + ?Sized> Worker for Box<T> {
    #[inline]
    fn on_start(&mut self) {
        self.deref_mut().on_start()
    }

    #[inline]
    fn on_update(&mut self, shutdown: &Shutdown) -> ControlFlow {
        self.deref_mut().on_update(shutdown)
    }

    #[inline]
    fn run(&mut self, shutdown: Shutdown) {
        self.deref_mut().run(shutdown)
    }
}

/* ---------- */

/// Builds a [`Worker`] right before it's launched by the [`Coordinator`].
///
/// Contexts carry everything a worker needs (the shared queue, its pacing, its random
/// source) and the [`Settings`] of the thread it will run on.
///
/// [`Coordinator`]: crate::Coordinator
pub trait Context {
    /// The type of [`Worker`] built from this context.
    type Target: Worker;

    /// Consumes `self` to build the targeted [`Worker`].
    fn into_worker(self) -> Result<Self::Target, Error>;

    /// Returns the [`Settings`] used to configure the worker's thread.
    ///
    /// By default, it returns default thread settings.
    #[inline]
    fn settings(&self) -> Settings {
        Settings::default()
    }
}

/* ---------- */

/// Defines the control flow of [`Workers`].
///
/// [`Workers`]: crate::Worker
#[derive(Debug, PartialEq)]
pub enum ControlFlow {
    /// Tells the worker loop to go on.
    Continue,
    /// Tells the worker loop to stop.
    Break,
}

/* ---------- */

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    struct Spinner(usize);

    impl Worker for Spinner {
        fn on_update(&mut self, _: &Shutdown) -> ControlFlow {
            self.0 += 1;
            std::thread::sleep(Duration::from_millis(1));
            ControlFlow::Continue
        }
    }

    #[test]
    fn default_update_breaks() {
        struct Idle;
        impl Worker for Idle {}

        Idle.run(Shutdown::new());
    }

    #[test]
    fn stopped_token_skips_the_loop() {
        let shutdown = Shutdown::new();
        shutdown.stop();

        let mut spinner = Spinner(0);
        spinner.run(shutdown);
        assert_eq!(spinner.0, 0);
    }

    #[test]
    fn boxed_worker_stops_with_its_token() {
        let shutdown = Shutdown::new();
        let mut worker: Box<dyn Worker> = Box::new(Spinner(0));

        let token = shutdown.clone();
        let thread = std::thread::spawn(move || worker.run(token));

        std::thread::sleep(Duration::from_millis(20));
        shutdown.stop();
        thread.join().unwrap();
    }
}
