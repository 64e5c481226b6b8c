use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::Interval;
use crate::observer::Observer;
use crate::queue::BoundedQueue;
use crate::settings::Settings;
use crate::shutdown::Shutdown;
use crate::worker::{Context, ControlFlow, Worker};
use crate::Error;

/* ---------- */

/// Takes items out of the queue and eats them.
///
/// Each iteration pops the oldest item (blocking while the queue is empty), reports it,
/// drops it, then pauses for a duration drawn from its [`Interval`].
///
/// Several consumers can share one queue. Nothing decides which of them gets a given
/// item: whichever wakes up first and still finds one takes it.
pub struct Consumer<R = StdRng> {
    id: usize,
    queue: Arc<BoundedQueue>,
    observer: Arc<dyn Observer>,
    interval: Interval,
    quota: Option<Quota>,
    rng: R,
    consumed: u64,
}

impl<R: Rng + Send> Consumer<R> {
    /// Returns how many items this consumer took so far.
    #[inline]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}

impl<R: Rng + Send> Worker for Consumer<R> {
    fn on_start(&mut self) {
        tracing::info!(consumer = self.id, "consumer started");
    }

    fn on_update(&mut self, shutdown: &Shutdown) -> ControlFlow {
        if let Some(quota) = self.quota.as_ref() {
            if !quota.claim() {
                tracing::info!(
                    consumer = self.id,
                    consumed = self.consumed,
                    "consumption quota exhausted"
                );
                return ControlFlow::Break;
            }
        }

        let Ok(item) = self.queue.pop() else {
            tracing::info!(
                consumer = self.id,
                consumed = self.consumed,
                "consumer cancelled"
            );
            return ControlFlow::Break;
        };

        self.consumed += 1;
        tracing::debug!(
            consumer = self.id,
            kind = %item.kind(),
            serial = item.serial(),
            "item consumed"
        );
        self.observer
            .on_item_consumed(self.id, item.kind(), self.consumed);
        drop(item);

        let pause = self.interval.sample(&mut self.rng);
        match shutdown.sleep(pause) {
            Ok(()) => ControlFlow::Continue,
            Err(_) => ControlFlow::Break,
        }
    }
}

/* ---------- */

/// A number of pops shared by a group of consumers.
///
/// A consumer claims one unit before each pop and stops once none are left, so the
/// group as a whole takes exactly as many items as the quota allows.
#[derive(Debug, Clone)]
pub struct Quota(Arc<AtomicU64>);

impl Quota {
    /// Returns a quota of `total` pops.
    #[inline]
    pub fn new(total: u64) -> Self {
        Self(Arc::new(AtomicU64::new(total)))
    }

    /// Returns the number of pops left.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Takes one unit, returning `false` if there's none left.
    #[inline]
    fn claim(&self) -> bool {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

/* ---------- */

/// Builds a [`Consumer`].
pub struct ConsumerContext<R = StdRng> {
    id: usize,
    queue: Arc<BoundedQueue>,
    observer: Arc<dyn Observer>,
    interval: Interval,
    quota: Option<Quota>,
    rng: R,
    cores: Vec<usize>,
}

impl<R: Rng + Send> ConsumerContext<R> {
    /// Returns a context for the consumer number `id` popping from `queue` and drawing from `rng`.
    pub fn new(id: usize, queue: Arc<BoundedQueue>, observer: Arc<dyn Observer>, rng: R) -> Self {
        Self {
            id,
            queue,
            observer,
            interval: Interval::fixed(0),
            quota: None,
            rng,
            cores: Vec::new(),
        }
    }

    /// Sets the pause between two items.
    #[inline]
    pub fn interval(self, interval: Interval) -> Self {
        Self { interval, ..self }
    }

    /// Shares `quota` with the consumer, if any.
    #[inline]
    pub fn quota(self, quota: Option<Quota>) -> Self {
        Self { quota, ..self }
    }

    /// Pins the consumer thread to `cores`.
    #[inline]
    pub fn cores(self, cores: Vec<usize>) -> Self {
        Self { cores, ..self }
    }
}

impl<R: Rng + Send> Context for ConsumerContext<R> {
    type Target = Consumer<R>;

    fn into_worker(self) -> Result<Self::Target, Error> {
        Ok(Consumer {
            id: self.id,
            queue: self.queue,
            observer: self.observer,
            interval: self.interval,
            quota: self.quota,
            rng: self.rng,
            consumed: 0,
        })
    }

    fn settings(&self) -> Settings {
        Settings::new()
            .name(format!("pizzeria-consumer-{}", self.id))
            .pinned(self.cores.clone())
    }
}

/* ---------- */
