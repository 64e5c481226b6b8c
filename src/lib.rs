//! A bounded buffer shared by producer and consumer workers, each running on its own thread.
//!
//! # Philosophy
//!
//! The kitchen is made of a few long-lived `workers`: one producer baking pizzas, any number of
//! consumers eating them, and an optional status reporter. Workers never talk to each other:
//! everything goes through one [`BoundedQueue`], a fixed-capacity FIFO buffer that blocks producers
//! while it's full and consumers while it's empty.
//!
//! The queue is a single mutex and a single condition variable. Every push or pop wakes every waiter
//! up, each one checking its own condition again before going on.
//!
//! # Usage
//!
//! Here's a kitchen with a 3-pizza buffer and 2 consumers, that bakes 10 pizzas as fast as it can and
//! stops once they're all eaten.
//!
//! ```
//! # use pizzeria::{Config, Coordinator, Interval};
//! let config = Config::new(3, 2)
//!     .producer_interval(Interval::fixed(0))
//!     .consumer_interval(Interval::fixed(0))
//!     .production_limit(10)
//!     .consumption_limit(10);
//!
//! let mut coordinator = Coordinator::start(config).unwrap();
//! coordinator.wait();
//! ```
//!
//! # Features
//!
//! ## Watching the kitchen
//!
//! The [`Coordinator`] accepts an [`Observer`], notified from the worker threads each time a pizza is
//! placed in or taken from the buffer, baked, eaten, and periodically with the buffer occupancy.
//! [`LogObserver`] turns those notifications into `tracing` events.
//!
//! ```
//! # use pizzeria::{Config, Coordinator, Interval, Kind, KindCounts, Observer};
//! # use std::sync::Arc;
//! # use std::sync::atomic::{AtomicU64, Ordering};
//! #[derive(Default)]
//! struct Eaten(AtomicU64);
//!
//! impl Observer for Eaten {
//!     fn on_item_consumed(&self, _consumer: usize, _kind: Kind, _consumed: u64) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let eaten = Arc::new(Eaten::default());
//! let config = Config::new(1, 3)
//!     .producer_interval(Interval::fixed(0))
//!     .consumer_interval(Interval::fixed(0))
//!     .production_limit(20)
//!     .consumption_limit(20);
//!
//! let mut coordinator = Coordinator::start_with_observer(config, eaten.clone()).unwrap();
//! coordinator.wait();
//!
//! assert_eq!(eaten.0.load(Ordering::Relaxed), 20);
//! ```
//!
//! ## Stopping
//!
//! Workers run until they reach their limit or until the coordinator's [`Shutdown`] token is stopped,
//! either by [`Coordinator::stop`], by dropping the coordinator, or by a termination signal once
//! [`Coordinator::enable_graceful_shutdown`] has been called. Stopping closes the queue and wakes up
//! every worker, whether it's blocked on the queue or pausing between two pizzas.
//!
//! ## Configuring
//!
//! A [`Config`] can be built in code or loaded from a TOML file with [`Config::load`]. Pauses are drawn
//! uniformly from [`Intervals`] and pizza kinds uniformly from [`Kind::ALL`], using one random source per
//! worker, seeded from the configuration when it carries a seed.
//!
//! [`Intervals`]: crate::Interval
//!
//! ## Custom workers
//!
//! The producer and consumers are plain [`Workers`] built from [`Contexts`]. They can be run on any
//! thread with [`Worker::run`], as long as something closes the queue when the token stops.
//!
//! [`Workers`]: crate::Worker
//! [`Contexts`]: crate::Context

#![warn(missing_docs)]

mod config;
mod consumer;
mod coordinator;
mod error;
mod item;
mod observer;
mod producer;
mod queue;
mod settings;
mod shutdown;
mod status;
#[cfg(test)]
mod test_utils;
mod worker;

pub use config::*;
pub use consumer::*;
pub use coordinator::*;
pub use error::*;
pub use item::*;
pub use observer::*;
pub use producer::*;
pub use queue::*;
pub use settings::*;
pub use shutdown::Shutdown;
pub use status::*;
pub use worker::*;
