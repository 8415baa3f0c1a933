use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Paces the status poll loop.
#[async_trait]
pub trait Scheduler: Debug + Send + Sync {
    /// Resolves when the next tick is due.
    async fn wait(&self);
}

/// Ticks on a fixed wall-clock interval.
#[derive(Debug, Clone, Copy)]
pub struct IntervalScheduler {
    period: Duration,
}

impl IntervalScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

#[async_trait]
impl Scheduler for IntervalScheduler {
    async fn wait(&self) {
        tokio::time::sleep(self.period).await;
    }
}

/// Releases exactly one tick per [`StepScheduler::step`] call.
///
/// Steps issued before anyone waits are banked, so a test can drive the
/// poll loop tick by tick without real delays.
#[derive(Debug)]
pub struct StepScheduler {
    permits: Semaphore,
}

impl StepScheduler {
    pub fn new() -> Self {
        Self {
            permits: Semaphore::new(0),
        }
    }

    pub fn step(&self) {
        self.permits.add_permits(1);
    }
}

impl Default for StepScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scheduler for StepScheduler {
    async fn wait(&self) {
        match self.permits.acquire().await {
            Ok(permit) => permit.forget(),
            // closed semaphore: never tick again
            Err(_) => std::future::pending::<()>().await,
        }
    }
}

/// Handle to a running poll loop.
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { token, task }
    }

    /// Stops scheduling further ticks. The loop observes this before its next
    /// status call and drops any response still in flight.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
