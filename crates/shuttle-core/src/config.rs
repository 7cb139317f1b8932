//! Worker configuration.
//!
//! Component-level defaults live here; per-task settings override the
//! locator timings for a single dispatch.

use std::time::Duration;

use crate::placeholder::PlaceholderResolver;

/// Randomized pause after a successful page read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelay {
    min: Duration,
    max: Duration,
}

impl SettleDelay {
    /// Bounds are swapped when given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw a delay uniformly from `[min, max]`.
    pub fn sample(&self) -> Duration {
        use rand::Rng;
        if self.min == self.max {
            return self.min;
        }
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

impl Default for SettleDelay {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_millis(750))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorConfig {
    /// How long one branch of the cascade waits for its element.
    pub element_wait: Duration,
    pub poll_interval: Duration,
    pub settle: SettleDelay,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            element_wait: Duration::from_millis(5000),
            poll_interval: Duration::from_millis(100),
            settle: SettleDelay::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name of the module this worker runs.
    pub module: String,
    pub locator: LocatorConfig,
    /// Exit right after the result instead of waiting for the host to hang up.
    pub exit_after_result: bool,
    /// Resolve `{{name}}` in addition to `${name}`.
    pub brace_placeholders: bool,
}

impl WorkerConfig {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            locator: LocatorConfig::default(),
            exit_after_result: false,
            brace_placeholders: true,
        }
    }

    pub fn resolver(&self) -> PlaceholderResolver {
        if self.brace_placeholders {
            PlaceholderResolver::default()
        } else {
            PlaceholderResolver::dollar_only()
        }
    }
}
