use std::sync::{Arc, Mutex};

use crate::{BoundedQueue, Kind, KindCounts, Observer, Shutdown, Worker};

/* ---------- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Configured(usize, usize),
    Enqueued(Kind, usize),
    Dequeued(Kind, usize),
    Produced(Kind, u64),
    Consumed(usize, Kind, u64),
    Status(usize),
}

/// Records every notification in order.
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<Event>>,
    last_counts: Mutex<Option<KindCounts>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn last_counts(&self) -> Option<KindCounts> {
        *self.last_counts.lock().unwrap()
    }

    /// Queue occupancies reported by pushes and pops.
    pub(crate) fn occupancies(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Enqueued(_, occupancy) | Event::Dequeued(_, occupancy) => Some(occupancy),
                _ => None,
            })
            .collect()
    }

    /// Kinds reported by the producer, sorted.
    pub(crate) fn produced(&self) -> Vec<Kind> {
        let mut kinds = self
            .events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Produced(kind, _) => Some(kind),
                _ => None,
            })
            .collect::<Vec<_>>();
        kinds.sort();
        kinds
    }

    /// Kinds reported by all the consumers, sorted.
    pub(crate) fn consumed(&self) -> Vec<Kind> {
        let mut kinds = self
            .events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Consumed(_, kind, _) => Some(kind),
                _ => None,
            })
            .collect::<Vec<_>>();
        kinds.sort();
        kinds
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event)
    }
}

impl Observer for RecordingObserver {
    fn on_capacity_configured(&self, capacity: usize, consumers: usize) {
        self.record(Event::Configured(capacity, consumers))
    }

    fn on_item_enqueued(&self, kind: Kind, occupancy: usize, counts: &KindCounts) {
        *self.last_counts.lock().unwrap() = Some(*counts);
        self.record(Event::Enqueued(kind, occupancy))
    }

    fn on_item_dequeued(&self, kind: Kind, occupancy: usize, counts: &KindCounts) {
        *self.last_counts.lock().unwrap() = Some(*counts);
        self.record(Event::Dequeued(kind, occupancy))
    }

    fn on_item_produced(&self, kind: Kind, produced: u64) {
        self.record(Event::Produced(kind, produced))
    }

    fn on_item_consumed(&self, consumer: usize, kind: Kind, consumed: u64) {
        self.record(Event::Consumed(consumer, kind, consumed))
    }

    fn on_periodic_status(&self, occupancy: usize) {
        self.record(Event::Status(occupancy))
    }
}

/* ---------- */

/// Returns a queue whose waiters are released when `shutdown` stops, the way the
/// coordinator wires it.
pub(crate) fn queue_for(
    capacity: usize,
    observer: Arc<dyn Observer>,
    shutdown: &Shutdown,
) -> Arc<BoundedQueue> {
    let queue = Arc::new(BoundedQueue::with_observer(capacity, observer).unwrap());

    let closing = queue.clone();
    shutdown.on_stop(move || closing.close());

    queue
}

/// Runs `worker` to completion on its own thread.
pub(crate) fn spawn_worker<W: Worker + 'static>(
    mut worker: W,
    shutdown: &Shutdown,
) -> std::thread::JoinHandle<()> {
    let shutdown = shutdown.clone();
    std::thread::spawn(move || worker.run(shutdown))
}
