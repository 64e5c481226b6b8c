use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::Interval;
use crate::item::{Item, Kind};
use crate::observer::Observer;
use crate::queue::BoundedQueue;
use crate::settings::Settings;
use crate::shutdown::Shutdown;
use crate::worker::{Context, ControlFlow, Worker};
use crate::Error;

/* ---------- */

/// Bakes items of random kinds and pushes them in the queue.
///
/// Each iteration picks a kind, pushes the new item (blocking while the queue is
/// full), reports it, then pauses for a duration drawn from its [`Interval`].
/// The producer stops once its token is stopped or, if it has one, once its limit
/// is reached.
pub struct Producer<R = StdRng> {
    queue: Arc<BoundedQueue>,
    observer: Arc<dyn Observer>,
    interval: Interval,
    limit: Option<u64>,
    rng: R,
    produced: u64,
}

impl<R: Rng + Send> Producer<R> {
    /// Returns how many items were pushed so far.
    #[inline]
    pub fn produced(&self) -> u64 {
        self.produced
    }
}

impl<R: Rng + Send> Worker for Producer<R> {
    fn on_start(&mut self) {
        tracing::info!(limit = ?self.limit, "producer started");
    }

    fn on_update(&mut self, shutdown: &Shutdown) -> ControlFlow {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            tracing::info!(produced = self.produced, "producer reached its limit");
            return ControlFlow::Break;
        }

        let kind = Kind::random(&mut self.rng);
        let item = Item::new(kind, self.produced + 1);

        let Ok(occupancy) = self.queue.push(item) else {
            tracing::info!(produced = self.produced, "producer cancelled");
            return ControlFlow::Break;
        };

        self.produced += 1;
        tracing::debug!(%kind, serial = self.produced, occupancy, "item produced");
        self.observer.on_item_produced(kind, self.produced);

        let pause = self.interval.sample(&mut self.rng);
        match shutdown.sleep(pause) {
            Ok(()) => ControlFlow::Continue,
            Err(_) => ControlFlow::Break,
        }
    }
}

/* ---------- */

/// Builds a [`Producer`].
pub struct ProducerContext<R = StdRng> {
    queue: Arc<BoundedQueue>,
    observer: Arc<dyn Observer>,
    interval: Interval,
    limit: Option<u64>,
    rng: R,
    cores: Vec<usize>,
}

impl<R: Rng + Send> ProducerContext<R> {
    /// Returns a context for a producer pushing to `queue` and drawing from `rng`.
    pub fn new(queue: Arc<BoundedQueue>, observer: Arc<dyn Observer>, rng: R) -> Self {
        Self {
            queue,
            observer,
            interval: Interval::fixed(0),
            limit: None,
            rng,
            cores: Vec::new(),
        }
    }

    /// Sets the pause between two items.
    #[inline]
    pub fn interval(self, interval: Interval) -> Self {
        Self { interval, ..self }
    }

    /// Stops the producer after `limit` items, if any.
    #[inline]
    pub fn limit(self, limit: Option<u64>) -> Self {
        Self { limit, ..self }
    }

    /// Pins the producer thread to `cores`.
    #[inline]
    pub fn cores(self, cores: Vec<usize>) -> Self {
        Self { cores, ..self }
    }
}

impl<R: Rng + Send> Context for ProducerContext<R> {
    type Target = Producer<R>;

    fn into_worker(self) -> Result<Self::Target, Error> {
        Ok(Producer {
            queue: self.queue,
            observer: self.observer,
            interval: self.interval,
            limit: self.limit,
            rng: self.rng,
            produced: 0,
        })
    }

    fn settings(&self) -> Settings {
        Settings::new()
            .name("pizzeria-producer")
            .pinned(self.cores.clone())
    }
}

/* ---------- */
