// ABOUTME: Bounded polling as an explicit state machine.
// ABOUTME: Waiting until a probe is ready, or exhausted after a fixed number of attempts.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// How often to probe and how many probes to allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Waiting for draining instances: 15 minutes.
    pub const DRAIN: PollPolicy = PollPolicy::new(Duration::from_secs(30), 30);

    /// Waiting for a target to report healthy.
    pub const HEALTH: PollPolicy = PollPolicy::new(Duration::from_secs(30), 1000);

    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on time spent sleeping between probes.
    pub fn budget(&self) -> Duration {
        self.interval
            .saturating_mul(self.max_attempts.saturating_sub(1))
    }
}

/// Where a poll currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// `attempt` probes made so far, none ready.
    Waiting { attempt: u32 },
    Done,
    Exhausted { attempts: u32 },
}

/// Counts probe results against a policy.
#[derive(Debug, Clone)]
pub struct PollBudget {
    max_attempts: u32,
    state: PollState,
}

impl PollBudget {
    /// A budget always allows at least one probe.
    pub fn new(policy: &PollPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts.max(1),
            state: PollState::Waiting { attempt: 0 },
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Record one probe result and return the new state. Terminal states stick.
    pub fn record(&mut self, ready: bool) -> PollState {
        if let PollState::Waiting { attempt } = self.state {
            let attempt = attempt + 1;
            self.state = if ready {
                PollState::Done
            } else if attempt >= self.max_attempts {
                PollState::Exhausted { attempts: attempt }
            } else {
                PollState::Waiting { attempt }
            };
        }
        self.state
    }
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Ready(T),
    Pending,
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    Ready { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Probe until ready or the policy's attempts run out, sleeping `interval`
/// between probes. Probe errors end the poll immediately.
pub async fn poll_until<T, E, F, Fut>(policy: &PollPolicy, mut probe: F) -> Result<Polled<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Probe<T>, E>>,
{
    let mut budget = PollBudget::new(policy);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match probe(attempt).await? {
            Probe::Ready(value) => {
                budget.record(true);
                return Ok(Polled::Ready {
                    value,
                    attempts: attempt,
                });
            }
            Probe::Pending => {
                if let PollState::Exhausted { attempts } = budget.record(false) {
                    return Ok(Polled::Exhausted { attempts });
                }
                tracing::debug!(attempt, "not ready, sleeping {:?}", policy.interval);
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}
