use std::sync::Arc;
use std::thread::JoinHandle;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::consumer::{ConsumerContext, Quota};
use crate::observer::{NoopObserver, Observer};
use crate::producer::ProducerContext;
use crate::queue::BoundedQueue;
use crate::shutdown::{Shutdown, SignalWatcher};
use crate::status::StatusReporter;
use crate::worker::{Context, Worker};
use crate::Error;

/* ---------- */

/// Starts the kitchen and owns its workers.
///
/// The coordinator builds one [`BoundedQueue`], then launches the consumers, the single
/// producer and the status reporter on their own threads, all sharing that queue and the
/// coordinator's [`Shutdown`] token. Stopping the token closes the queue, releasing every
/// worker blocked on it.
///
/// When dropped, a coordinator stops and waits for all the workers to complete.
///
/// # Examples
///
/// ```
/// # use pizzeria::{Config, Coordinator, Interval};
/// let config = Config::new(2, 3)
///     .producer_interval(Interval::fixed(0))
///     .consumer_interval(Interval::fixed(0))
///     .production_limit(10)
///     .consumption_limit(10);
///
/// let mut coordinator = Coordinator::start(config).unwrap();
/// coordinator.wait();
///
/// assert_eq!(coordinator.queue().size(), 0);
/// ```
pub struct Coordinator {
    shutdown: Shutdown,
    queue: Arc<BoundedQueue>,
    workers: Vec<JoinHandle<()>>,
    status: Option<JoinHandle<()>>,
    signals: Option<SignalWatcher>,
}

impl Coordinator {
    /// Starts the workers described by `config`, without any observer.
    ///
    /// See [`Coordinator::start_with_observer`].
    #[inline]
    pub fn start(config: Config) -> Result<Self, Error> {
        Self::start_with_observer(config, Arc::new(NoopObserver))
    }

    /// Starts the workers described by `config`, reporting to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `config` isn't valid, in which case nothing is
    /// started and `observer` isn't called. If a worker thread fails to start, the workers
    /// already launched are stopped and joined before [`Error::ThreadStart`] is returned.
    pub fn start_with_observer(config: Config, observer: Arc<dyn Observer>) -> Result<Self, Error> {
        config.validate()?;

        let queue = Arc::new(BoundedQueue::with_observer(
            config.capacity,
            observer.clone(),
        )?);
        observer.on_capacity_configured(config.capacity, config.consumers);

        let shutdown = Shutdown::new();
        let closing = queue.clone();
        shutdown.on_stop(move || closing.close());

        let mut coordinator = Self {
            shutdown,
            queue,
            workers: Vec::new(),
            status: None,
            signals: None,
        };

        tracing::info!(
            capacity = config.capacity,
            consumers = config.consumers,
            production_limit = ?config.production_limit,
            consumption_limit = ?config.consumption_limit,
            "starting the kitchen"
        );

        let quota = config.consumption_limit.map(Quota::new);
        for id in 0..config.consumers {
            let ctx = ConsumerContext::new(
                id,
                coordinator.queue.clone(),
                observer.clone(),
                rng_for(config.seed, id as u64 + 1),
            )
            .interval(config.consumer_interval)
            .quota(quota.clone())
            .cores(config.cores.clone());

            let thread = coordinator.launch_from_context(ctx)?;
            coordinator.workers.push(thread);
        }

        let ctx = ProducerContext::new(
            coordinator.queue.clone(),
            observer.clone(),
            rng_for(config.seed, 0),
        )
        .interval(config.producer_interval)
        .limit(config.production_limit)
        .cores(config.cores.clone());

        let thread = coordinator.launch_from_context(ctx)?;
        coordinator.workers.push(thread);

        if let Some(period) = config.status_period_duration() {
            let reporter = StatusReporter::new(coordinator.queue.clone(), observer, period);
            let thread = coordinator.launch_from_context(reporter)?;
            coordinator.status = Some(thread);
        }

        Ok(coordinator)
    }

    /// Enables the workers to be gracefully stopped with a `Ctrl+C` or a `SIGTERM` signal.
    ///
    /// If the graceful shutdown doesn't have any effects, users can still
    /// send a second signal to forcefully kill the process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signal`] if the signal handlers could not be installed.
    pub fn enable_graceful_shutdown(&mut self) -> Result<(), Error> {
        if self.signals.is_none() {
            let watcher =
                crate::shutdown::enable_graceful_shutdown(&self.shutdown).map_err(Error::Signal)?;
            self.signals = Some(watcher);
        }

        Ok(())
    }

    /// Returns the queue shared by the workers.
    #[inline]
    pub fn queue(&self) -> &Arc<BoundedQueue> {
        &self.queue
    }

    /// Returns the token the workers run under.
    #[inline]
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Returns whether or not the workers are still asked to run.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    /// Asks every worker to stop, interrupting their blocking calls.
    ///
    /// This doesn't wait for them, see [`Coordinator::wait`].
    #[inline]
    pub fn stop(&self) {
        tracing::info!("stopping the kitchen");
        self.shutdown.stop()
    }

    /// Blocks the calling thread until the producer and every consumer stop.
    ///
    /// The status reporter has nothing left to report at that point: it's stopped and
    /// joined too. Without production and consumption limits, workers only stop through
    /// [`Coordinator::stop`] or a signal.
    pub fn wait(&mut self) {
        for thread in self.workers.drain(..) {
            join(thread);
        }

        if let Some(thread) = self.status.take() {
            self.shutdown.stop();
            join(thread);
        }
    }

    #[inline]
    fn launch_from_context<W, C>(&mut self, ctx: C) -> Result<JoinHandle<()>, Error>
    where
        W: Worker + 'static,
        C: Context<Target = W>,
    {
        let settings = ctx.settings();
        let mut worker = ctx.into_worker().inspect_err(|_| self.shutdown.stop())?;
        let shutdown = self.shutdown.clone();

        settings
            .spawn(move || worker.run(shutdown))
            .map_err(Error::ThreadStart)
            .inspect_err(|_| self.shutdown.stop())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown.stop();
        self.wait();
    }
}

/* ---------- */

#[inline]
fn rng_for(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}

#[inline]
fn join(thread: JoinHandle<()>) {
    let name = thread.thread().name().unwrap_or("worker").to_owned();
    if thread.join().is_err() {
        tracing::error!(worker = %name, "worker panicked");
    }
}

/* ---------- */

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::config::Interval;
    use crate::test_utils::*;

    const DEADLINE: Duration = Duration::from_secs(10);

    fn fast(capacity: usize, consumers: usize) -> Config {
        Config::new(capacity, consumers)
            .producer_interval(Interval::fixed(0))
            .consumer_interval(Interval::fixed(0))
            .status_period(None)
            .seed(42)
    }

    /// Runs `f` on another thread, failing if it doesn't complete before the deadline.
    fn within_deadline<F: FnOnce() + Send + 'static>(f: F) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            f();
            let _ = tx.send(());
        });

        rx.recv_timeout(DEADLINE).expect("deadlocked");
    }

    #[test]
    fn invalid_config_starts_nothing() {
        let observer = Arc::new(RecordingObserver::default());

        let res = Coordinator::start_with_observer(Config::new(0, 2), observer.clone());

        assert!(matches!(res, Err(Error::InvalidConfiguration(_))));
        assert!(observer.events().is_empty());
    }

    #[test]
    fn bounded_run_loses_nothing() {
        let observer = Arc::new(RecordingObserver::default());
        let config = fast(2, 3).production_limit(50).consumption_limit(50);

        let obs = observer.clone();
        within_deadline(move || {
            let mut coordinator = Coordinator::start_with_observer(config, obs).unwrap();
            coordinator.wait();
            assert_eq!(coordinator.queue().size(), 0);
        });

        let events = observer.events();
        assert_eq!(events.first(), Some(&Event::Configured(2, 3)));

        let produced = observer.produced();
        assert_eq!(produced.len(), 50);
        assert_eq!(produced, observer.consumed());
        assert!(observer.occupancies().iter().all(|occupancy| *occupancy <= 2));
    }

    #[test]
    fn single_slot_with_contention() {
        let observer = Arc::new(RecordingObserver::default());
        let config = fast(1, 3).production_limit(200).consumption_limit(200);

        let obs = observer.clone();
        within_deadline(move || {
            Coordinator::start_with_observer(config, obs).unwrap().wait();
        });

        assert_eq!(observer.consumed().len(), 200);
        assert!(observer.occupancies().iter().all(|occupancy| *occupancy <= 1));
    }

    #[test]
    fn every_enqueued_kind_is_dequeued() {
        let observer = Arc::new(RecordingObserver::default());
        let config = fast(3, 2).production_limit(30).consumption_limit(30);

        let obs = observer.clone();
        within_deadline(move || {
            Coordinator::start_with_observer(config, obs).unwrap().wait();
        });

        let mut enqueued = Vec::new();
        let mut dequeued = Vec::new();
        for event in observer.events() {
            match event {
                Event::Enqueued(kind, _) => enqueued.push(kind),
                Event::Dequeued(kind, _) => dequeued.push(kind),
                _ => (),
            }
        }
        enqueued.sort();
        dequeued.sort();
        assert_eq!(enqueued, dequeued);
    }

    #[test]
    fn stop_unbounded_run() {
        let observer = Arc::new(RecordingObserver::default());
        let config = fast(2, 2)
            .producer_interval(Interval::between(1, 5))
            .consumer_interval(Interval::between(1, 10))
            .status_period(Some(Duration::from_millis(5)));

        let coordinator = Coordinator::start_with_observer(config, observer.clone()).unwrap();
        let has_status = |events: Vec<Event>| events.iter().any(|e| matches!(e, Event::Status(_)));
        while observer.consumed().len() < 5 || !has_status(observer.events()) {
            std::thread::sleep(Duration::from_millis(1));
        }

        let now = Instant::now();
        coordinator.stop();
        assert!(!coordinator.is_running());
        assert!(coordinator.queue().is_closed());
        drop(coordinator);

        assert!(now.elapsed() < DEADLINE);
    }

    #[test]
    fn no_consumers() {
        let config = fast(3, 0).production_limit(10);
        let coordinator = Coordinator::start(config).unwrap();

        while coordinator.queue().size() < 3 {
            std::thread::sleep(Duration::from_millis(1));
        }

        // The producer stays blocked on the full queue until stopped.
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(coordinator.queue().size(), 3);

        within_deadline(move || drop(coordinator));
    }

    #[test]
    fn slow_consumer_paces_the_producer() {
        let observer = Arc::new(RecordingObserver::default());
        let config = fast(1, 1)
            .consumer_interval(Interval::fixed(30))
            .production_limit(4)
            .consumption_limit(4);

        let now = Instant::now();
        let obs = observer.clone();
        within_deadline(move || {
            Coordinator::start_with_observer(config, obs).unwrap().wait();
        });

        // The consumer pauses after each of its 4 items.
        assert!(now.elapsed() >= Duration::from_millis(120));
        assert_eq!(observer.consumed().len(), 4);
    }

    #[test]
    fn graceful_shutdown_can_be_enabled() {
        let mut coordinator = Coordinator::start(fast(1, 1)).unwrap();

        coordinator.enable_graceful_shutdown().unwrap();
        coordinator.enable_graceful_shutdown().unwrap();
        assert!(coordinator.is_running());
    }
}
