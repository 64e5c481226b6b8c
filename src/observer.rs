use crate::item::{Kind, KindCounts};

/* ---------- */

/// Receives notifications about what happens in the kitchen.
///
/// This is the boundary with whatever displays the system state. Notifications are
/// plain synchronous calls made from the worker threads, after the queue's lock has
/// been released: implementations may query the queue, but must be `Send + Sync` and
/// should return quickly since the calling worker waits for them.
///
/// Every method does nothing by default.
///
/// # Examples
///
/// ```
/// # use pizzeria::{Observer, Kind, KindCounts};
/// # use std::sync::atomic::{AtomicUsize, Ordering};
/// #[derive(Default)]
/// struct HighWaterMark(AtomicUsize);
///
/// impl Observer for HighWaterMark {
///     fn on_item_enqueued(&self, _: Kind, occupancy: usize, _: &KindCounts) {
///         self.0.fetch_max(occupancy, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait Observer: Send + Sync {
    /// Called once, before any worker starts.
    #[inline]
    fn on_capacity_configured(&self, _capacity: usize, _consumers: usize) {}

    /// Called after an item has been pushed in the queue.
    #[inline]
    fn on_item_enqueued(&self, _kind: Kind, _occupancy: usize, _counts: &KindCounts) {}

    /// Called after an item has been popped from the queue.
    #[inline]
    fn on_item_dequeued(&self, _kind: Kind, _occupancy: usize, _counts: &KindCounts) {}

    /// Called by the producer after each item it managed to enqueue.
    ///
    /// `produced` is the producer's running count, starting at 1.
    #[inline]
    fn on_item_produced(&self, _kind: Kind, _produced: u64) {}

    /// Called by a consumer after each item it took out of the queue.
    ///
    /// `consumed` is that consumer's running count, starting at 1.
    #[inline]
    fn on_item_consumed(&self, _consumer: usize, _kind: Kind, _consumed: u64) {}

    /// Called periodically with the current number of items in the queue.
    #[inline]
    fn on_periodic_status(&self, _occupancy: usize) {}
}

/* ---------- */

/// An [`Observer`] that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/* ---------- */

/// An [`Observer`] that turns every notification into a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_capacity_configured(&self, capacity: usize, consumers: usize) {
        tracing::info!(capacity, consumers, "kitchen configured");
    }

    fn on_item_enqueued(&self, kind: Kind, occupancy: usize, counts: &KindCounts) {
        tracing::info!(%kind, occupancy, %counts, "pizza placed in the buffer");
    }

    fn on_item_dequeued(&self, kind: Kind, occupancy: usize, counts: &KindCounts) {
        tracing::info!(%kind, occupancy, %counts, "pizza taken from the buffer");
    }

    fn on_item_produced(&self, kind: Kind, produced: u64) {
        tracing::info!(%kind, produced, "baking");
    }

    fn on_item_consumed(&self, consumer: usize, kind: Kind, consumed: u64) {
        tracing::info!(consumer, %kind, consumed, "eating");
    }

    fn on_periodic_status(&self, occupancy: usize) {
        tracing::info!(occupancy, "pizzas in the buffer");
    }
}
