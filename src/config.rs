use std::path::Path;
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

use crate::{ConfigError, Error};

/* ---------- */

/// Everything the [`Coordinator`] needs to start the kitchen.
///
/// Can be built in code or loaded from a TOML file where every field but `capacity`
/// is optional:
///
/// ```toml
/// capacity = 5
/// consumers = 3
/// production_limit = 5
/// status_period_ms = 5000
///
/// [producer_interval]
/// min_ms = 1000
/// max_ms = 1000
/// ```
///
/// [`Coordinator`]: crate::Coordinator
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Maximum number of items in the buffer.
    pub capacity: usize,
    /// Number of consumer workers. Zero is allowed.
    #[serde(default = "defaults::consumers")]
    pub consumers: usize,
    /// Pause of the producer after each item.
    #[serde(default = "defaults::producer_interval")]
    pub producer_interval: Interval,
    /// Pause of each consumer after each item.
    #[serde(default = "defaults::consumer_interval")]
    pub consumer_interval: Interval,
    /// Number of items after which the producer stops. Unbounded if absent.
    #[serde(default)]
    pub production_limit: Option<u64>,
    /// Number of items after which the consumers, all together, stop. Unbounded if absent.
    #[serde(default)]
    pub consumption_limit: Option<u64>,
    /// Period of the status notifications, in milliseconds. Defaults to 5000, `None` disables them.
    #[serde(default = "defaults::status_period_ms")]
    pub status_period_ms: Option<u64>,
    /// Seed of the workers random sources. Taken from the OS if absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// CPU IDs to pin every worker thread to. Not pinned if empty.
    #[serde(default)]
    pub cores: Vec<usize>,
}

mod defaults {
    use super::Interval;

    pub fn consumers() -> usize {
        1
    }

    pub fn producer_interval() -> Interval {
        Interval::between(1500, 3000)
    }

    pub fn consumer_interval() -> Interval {
        Interval::between(1500, 4000)
    }

    pub fn status_period_ms() -> Option<u64> {
        Some(5000)
    }
}

impl Config {
    /// Returns a configuration with `capacity` and `consumers`, everything else defaulted.
    pub fn new(capacity: usize, consumers: usize) -> Self {
        Self {
            capacity,
            consumers,
            producer_interval: defaults::producer_interval(),
            consumer_interval: defaults::consumer_interval(),
            production_limit: None,
            consumption_limit: None,
            status_period_ms: defaults::status_period_ms(),
            seed: None,
            cores: Vec::new(),
        }
    }

    /// Loads a configuration from a TOML file.
    ///
    /// The configuration isn't validated, see [`Config::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml_to_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&toml_to_str)
    }

    /// Parses a configuration from a TOML string.
    #[inline]
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml)?)
    }

    /// Checks the configuration can be used to start the kitchen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the capacity is zero or an interval is reversed.
    pub fn validate(&self) -> Result<(), Error> {
        if self.capacity == 0 {
            return Err(Error::invalid("the buffer capacity must be at least 1"));
        }

        self.producer_interval
            .validate()
            .map_err(|msg| Error::invalid(format!("producer interval: {msg}")))?;
        self.consumer_interval
            .validate()
            .map_err(|msg| Error::invalid(format!("consumer interval: {msg}")))?;

        if self.status_period_ms == Some(0) {
            return Err(Error::invalid("the status period must be at least 1ms"));
        }

        Ok(())
    }

    /// Sets the producer pace.
    #[inline]
    pub fn producer_interval(self, interval: Interval) -> Self {
        Self {
            producer_interval: interval,
            ..self
        }
    }

    /// Sets the consumers pace.
    #[inline]
    pub fn consumer_interval(self, interval: Interval) -> Self {
        Self {
            consumer_interval: interval,
            ..self
        }
    }

    /// Stops the producer after `limit` items.
    #[inline]
    pub fn production_limit(self, limit: u64) -> Self {
        Self {
            production_limit: Some(limit),
            ..self
        }
    }

    /// Stops the consumers after they took `limit` items in total.
    #[inline]
    pub fn consumption_limit(self, limit: u64) -> Self {
        Self {
            consumption_limit: Some(limit),
            ..self
        }
    }

    /// Sets the period of the status notifications, `None` disabling them.
    ///
    /// The period is rounded up to the millisecond.
    #[inline]
    pub fn status_period(self, period: Option<Duration>) -> Self {
        let status_period_ms = period.map(|period| {
            let ms = period.as_nanos().div_ceil(1_000_000);
            u64::try_from(ms).unwrap_or(u64::MAX)
        });

        Self {
            status_period_ms,
            ..self
        }
    }

    /// Seeds the workers random sources.
    #[inline]
    pub fn seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    /// Pins every worker thread to `cores`.
    #[inline]
    pub fn cores<C: Into<Vec<usize>>>(self, cores: C) -> Self {
        Self {
            cores: cores.into(),
            ..self
        }
    }

    /// Returns the status period, if any.
    #[inline]
    pub fn status_period_duration(&self) -> Option<Duration> {
        self.status_period_ms.map(Duration::from_millis)
    }
}

/* ---------- */

/// An inclusive range of milliseconds a worker pauses for between two items.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Interval {
    /// Shortest pause.
    pub min_ms: u64,
    /// Longest pause.
    pub max_ms: u64,
}

impl Interval {
    /// Returns an interval always drawing `ms`.
    #[inline]
    pub fn fixed(ms: u64) -> Self {
        Self::between(ms, ms)
    }

    /// Returns an interval drawing uniformly in `[min_ms, max_ms]`.
    #[inline]
    pub fn between(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Draws a pause.
    ///
    /// A reversed interval behaves as a fixed one of its lower bound.
    #[inline]
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.min_ms >= self.max_ms {
            return Duration::from_millis(self.min_ms);
        }

        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }

    #[inline]
    fn validate(&self) -> Result<(), String> {
        if self.min_ms > self.max_ms {
            return Err(format!(
                "min_ms ({}) is greater than max_ms ({})",
                self.min_ms, self.max_ms
            ));
        }

        Ok(())
    }
}

/* ---------- */
