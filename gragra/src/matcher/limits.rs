use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often (in search steps) the deadline is compared against the clock.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// A flag another thread can trip to stop an in-flight search.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on a single matcher run. The default is unbounded.
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    pub max_steps: Option<u64>,
    pub timeout: Option<Duration>,
    pub cancellation: Option<CancellationToken>,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        SearchLimits::default()
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("search exceeded its limit of {limit} steps")]
    StepLimitExceeded { limit: u64 },
    #[error("search ran past its deadline")]
    DeadlineExceeded,
    #[error("search was cancelled")]
    Cancelled,
}

/// Counts search steps and decides when the search must stop.
#[derive(Debug)]
pub(crate) struct StepBudget<'a> {
    limits: &'a SearchLimits,
    deadline: Option<Instant>,
    steps: u64,
}

impl<'a> StepBudget<'a> {
    pub(crate) fn start(limits: &'a SearchLimits) -> Self {
        StepBudget {
            limits,
            deadline: limits.timeout.map(|timeout| Instant::now() + timeout),
            steps: 0,
        }
    }

    pub(crate) fn steps(&self) -> u64 {
        self.steps
    }

    /// Accounts for one more step; fails once any limit is hit.
    pub(crate) fn tick(&mut self) -> Result<(), MatchError> {
        self.steps += 1;
        if let Some(limit) = self.limits.max_steps
            && self.steps > limit
        {
            return Err(MatchError::StepLimitExceeded { limit });
        }
        if let Some(token) = &self.limits.cancellation
            && token.is_cancelled()
        {
            return Err(MatchError::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && self.steps % DEADLINE_CHECK_INTERVAL == 1
            && Instant::now() >= deadline
        {
            return Err(MatchError::DeadlineExceeded);
        }
        Ok(())
    }
}
