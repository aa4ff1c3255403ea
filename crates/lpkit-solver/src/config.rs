use std::time::Duration;

use crate::problem::Problem;

/// Solver message verbosity, with the numeric codes used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum MessageLevel {
    /// No output
    Off = 0,
    /// Warnings and errors only
    #[default]
    Error = 1,
    /// Normal output
    On = 2,
    /// Full output
    All = 3,
    /// Debug output
    Debug = 4,
}

impl MessageLevel {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MessageLevel::Off),
            1 => Some(MessageLevel::Error),
            2 => Some(MessageLevel::On),
            3 => Some(MessageLevel::All),
            4 => Some(MessageLevel::Debug),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Directive for a `tracing` filter that shows what this level asks for.
    pub fn as_filter(self) -> &'static str {
        match self {
            MessageLevel::Off => "off",
            MessageLevel::Error => "warn",
            MessageLevel::On => "info",
            MessageLevel::All => "debug",
            MessageLevel::Debug => "trace",
        }
    }

    pub(crate) fn shows(self, wanted: MessageLevel) -> bool {
        self >= wanted
    }
}

/// Which capability a problem is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveKind {
    Lp,
    Mip,
}

impl SolveKind {
    /// `Mip` when any column is integer or binary.
    pub fn for_problem(problem: &Problem) -> Self {
        if problem.num_integer() > 0 {
            SolveKind::Mip
        } else {
            SolveKind::Lp
        }
    }
}

/// Parameters for a single solve call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveConfig {
    pub msg_level: MessageLevel,
    pub time_limit: Option<Duration>,
    pub iteration_limit: Option<usize>,
    pub presolve: bool,
    /// Relative MIP gap accepted before the search stops
    pub mip_gap: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            msg_level: MessageLevel::Error,
            time_limit: None,
            iteration_limit: None,
            presolve: true,
            mip_gap: 0.0,
        }
    }
}

impl SolveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_msg_level(mut self, level: MessageLevel) -> Self {
        self.msg_level = level;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    pub fn with_presolve(mut self, presolve: bool) -> Self {
        self.presolve = presolve;
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = gap;
        self
    }
}

/// Wall-clock cutoff derived from a time limit.
///
/// `Instant` is unavailable on `wasm32-unknown-unknown`, so time limits are
/// not enforced there.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    #[cfg(not(target_arch = "wasm32"))]
    at: Option<std::time::Instant>,
}

impl Deadline {
    pub(crate) fn after(limit: Option<Duration>) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self {
                at: limit.map(|d| std::time::Instant::now() + d),
            }
        }
        #[cfg(target_arch = "wasm32")]
        {
            let _ = limit;
            Self {}
        }
    }

    pub(crate) fn expired(&self) -> bool {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.at.is_some_and(|at| std::time::Instant::now() >= at)
        }
        #[cfg(target_arch = "wasm32")]
        {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_level_codes() {
        for code in 0..=4 {
            assert_eq!(MessageLevel::from_code(code).unwrap().code() as i64, code);
        }
        assert!(MessageLevel::from_code(5).is_none());
        assert!(MessageLevel::All.shows(MessageLevel::On));
        assert!(!MessageLevel::Off.shows(MessageLevel::Error));
    }

    #[test]
    fn test_config_builder() {
        let config = SolveConfig::new()
            .with_presolve(false)
            .with_iteration_limit(10)
            .with_mip_gap(0.01);
        assert!(!config.presolve);
        assert_eq!(config.iteration_limit, Some(10));
        assert_eq!(config.mip_gap, 0.01);
        assert_eq!(config.msg_level, MessageLevel::Error);
        assert!(config.time_limit.is_none());
    }

    #[test]
    fn test_deadline() {
        assert!(!Deadline::after(None).expired());
        assert!(Deadline::after(Some(Duration::ZERO)).expired());
    }
}
