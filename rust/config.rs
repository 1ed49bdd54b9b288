//! Execution settings passed explicitly into elementwise operations.
//!
//! Nothing here is global. A [`Config`] is a small `Copy` value handed to
//! [`Tensor::zip`](crate::Tensor::zip) and its arithmetic shorthands, and is
//! read when the call happens.

use crate::error::Result;

/// Environment variable holding the degree of parallelism.
pub const NUM_THREADS_ENV: &str = "STRIDEX_NUM_THREADS";

/// Environment variable enabling fail-fast error surfacing.
pub const INTERACTIVE_ENV: &str = "STRIDEX_INTERACTIVE";

/// Degree of parallelism and error surfacing mode.
///
/// # Example
///
/// ```rust
/// use stridex::Config;
///
/// let config = Config::default().with_parallelism(4);
/// assert_eq!(config.workers(2), 2);
/// assert_eq!(config.workers(100), 4);
/// assert_eq!(Config::sequential().workers(100), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Worker count: 0 uses every hardware thread, 1 runs on the caller.
    pub parallelism: usize,
    /// Panic on errors instead of returning them.
    pub interactive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallelism: 0,
            interactive: false,
        }
    }
}

impl Config {
    /// Single worker, errors returned.
    pub fn sequential() -> Self {
        Self {
            parallelism: 1,
            interactive: false,
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Reads [`NUM_THREADS_ENV`] and [`INTERACTIVE_ENV`].
    ///
    /// Missing variables keep the defaults; unparsable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(NUM_THREADS_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(n) => config.parallelism = n,
                Err(_) => log::warn!("ignoring {}={:?}: not a thread count", NUM_THREADS_ENV, raw),
            }
        }
        if let Ok(raw) = std::env::var(INTERACTIVE_ENV) {
            match parse_flag(&raw) {
                Some(flag) => config.interactive = flag,
                None => log::warn!("ignoring {}={:?}: not a boolean", INTERACTIVE_ENV, raw),
            }
        }
        config
    }

    /// Number of workers to split a leading axis of `extent` rows across.
    ///
    /// Never zero and never more than `extent`, so every worker gets at
    /// least one row.
    pub fn workers(&self, extent: usize) -> usize {
        let requested = match self.parallelism {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };
        requested.min(extent).max(1)
    }

    /// Passes `result` through, or panics on an error in interactive mode.
    pub fn escalate<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Err(err) if self.interactive => {
                log::error!("{}", err);
                panic!("{}", err);
            }
            other => other,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TensorError;

    #[test]
    fn config_workers_clamped() {
        let config = Config::default().with_parallelism(8);
        assert_eq!(config.workers(3), 3);
        assert_eq!(config.workers(20), 8);
        assert_eq!(config.workers(0), 1);
        assert_eq!(Config::sequential().workers(1000), 1);

        let all = Config::default().workers(usize::MAX);
        assert!(all >= 1);
    }

    #[test]
    fn config_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" yes "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn config_escalate_passthrough() {
        let config = Config::default();
        let err: Result<()> = Err(TensorError::BadStep);
        assert_eq!(config.escalate(err), Err(TensorError::BadStep));
        assert_eq!(config.with_interactive(true).escalate(Ok(5)), Ok(5));
    }

    #[test]
    #[should_panic(expected = "bad step")]
    fn config_escalate_interactive() {
        let config = Config::sequential().with_interactive(true);
        let _ = config.escalate::<()>(Err(TensorError::BadStep));
    }
}
