use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Value domain assumed for free symbols.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Domain {
    /// Every symbol is a `uint256`: an integer `>= 0`.
    #[default]
    Unsigned,
    /// Every symbol is an unbounded integer.
    Integer,
}

impl Domain {
    pub fn is_unsigned(self) -> bool {
        self == Domain::Unsigned
    }
}

/// Shared flag for cancelling a running solver call from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on the only long-running step, the constraint-solver call. Hitting
/// any of them degrades the answer to "unknown".
#[derive(Clone, Debug)]
pub struct SolverLimits {
    pub timeout: Option<Duration>,
    /// Disjunction branches explored before giving up.
    pub max_branches: usize,
    /// Inequalities kept alive during one elimination.
    pub max_rows: usize,
    pub cancel: Option<CancelToken>,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(5)),
            max_branches: 4096,
            max_rows: 2048,
            cancel: None,
        }
    }
}

/// Settings handed to each component at construction.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Emit per-step traces (`debug`/`trace` level) from every stage.
    pub trace: bool,
    pub domain: Domain,
    pub limits: SolverLimits,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.limits.timeout = timeout;
        self
    }

    pub fn with_limits(mut self, limits: SolverLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.limits.cancel = Some(cancel);
        self
    }
}
