use std::sync::Arc;
use std::time::Duration;

use crate::observer::Observer;
use crate::queue::BoundedQueue;
use crate::settings::Settings;
use crate::shutdown::Shutdown;
use crate::worker::{Context, ControlFlow, Worker};
use crate::Error;

/* ---------- */

/// Reports the queue occupancy every `period`.
pub struct StatusReporter {
    queue: Arc<BoundedQueue>,
    observer: Arc<dyn Observer>,
    period: Duration,
}

impl StatusReporter {
    /// Returns a reporter reading `queue` and notifying `observer` every `period`.
    #[inline]
    pub fn new(queue: Arc<BoundedQueue>, observer: Arc<dyn Observer>, period: Duration) -> Self {
        Self {
            queue,
            observer,
            period,
        }
    }
}

impl Worker for StatusReporter {
    fn on_update(&mut self, shutdown: &Shutdown) -> ControlFlow {
        if shutdown.sleep(self.period).is_err() {
            return ControlFlow::Break;
        }

        let occupancy = self.queue.size();
        tracing::trace!(occupancy, "status tick");
        self.observer.on_periodic_status(occupancy);

        ControlFlow::Continue
    }
}

impl Context for StatusReporter {
    type Target = Self;

    #[inline]
    fn into_worker(self) -> Result<Self::Target, Error> {
        Ok(self)
    }

    #[inline]
    fn settings(&self) -> Settings {
        Settings::new().name("pizzeria-status")
    }
}

/* ---------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Item, Kind};
    use crate::test_utils::*;

    #[test]
    fn reports_occupancy() {
        let shutdown = Shutdown::new();
        let observer = Arc::new(RecordingObserver::default());
        let queue = queue_for(3, observer.clone(), &shutdown);
        queue.push(Item::new(Kind::Supreme, 1)).unwrap();
        queue.push(Item::new(Kind::Supreme, 2)).unwrap();

        let reporter = StatusReporter::new(queue, observer.clone(), Duration::from_millis(10));
        let thread = spawn_worker(reporter, &shutdown);

        while !observer.events().contains(&Event::Status(2)) {
            std::thread::sleep(Duration::from_millis(1));
        }

        shutdown.stop();
        thread.join().unwrap();
    }

    #[test]
    fn no_report_before_the_first_period() {
        let shutdown = Shutdown::new();
        let observer = Arc::new(RecordingObserver::default());
        let queue = queue_for(1, observer.clone(), &shutdown);

        let reporter = StatusReporter::new(queue, observer.clone(), Duration::from_secs(60));
        let thread = spawn_worker(reporter, &shutdown);

        std::thread::sleep(Duration::from_millis(20));
        shutdown.stop();
        thread.join().unwrap();

        assert!(observer.events().is_empty());
    }
}
