//! Single-flight coordination of the session refresh call.
//!
//! The first caller to need a refresh becomes the leader and runs it. Callers
//! arriving while it is in flight join a wait queue and are settled, in
//! arrival order, with the leader's outcome. The lock guards only the flag and
//! the queue and is never held across an await.

use crate::error::{Error, Result};
use std::{
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tokio::sync::oneshot;
use tracing::debug;

type Waiter = oneshot::Sender<Result<()>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

enum Turn {
    Leader,
    Follower(oneshot::Receiver<Result<()>>),
}

#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `refresh` unless one is already in flight, in which case wait for
    /// that one instead. Every caller observes the same outcome.
    ///
    /// # Errors
    /// Returns the refresh failure, or `Error::RefreshAbandoned` if the leader
    /// was dropped before settling.
    pub async fn refresh<F, Fut>(&self, refresh: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        match self.join() {
            Turn::Follower(settled) => {
                debug!("refresh already in flight, waiting for its outcome");
                settled.await.unwrap_or(Err(Error::RefreshAbandoned))
            }
            Turn::Leader => {
                let mut leader = LeaderGuard {
                    coordinator: self,
                    settled: false,
                };
                let outcome = refresh().await;
                leader.settle(outcome.clone());
                outcome
            }
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of callers queued behind the in-flight refresh.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    fn join(&self) -> Turn {
        let mut state = self.lock();
        if state.in_flight {
            let (sender, receiver) = oneshot::channel();
            state.waiters.push(sender);
            Turn::Follower(receiver)
        } else {
            state.in_flight = true;
            Turn::Leader
        }
    }

    fn settle(&self, outcome: Result<()>) {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };

        debug!(waiters = waiters.len(), ok = outcome.is_ok(), "refresh settled");
        for waiter in waiters {
            // A waiter whose request was dropped has nothing left to resume.
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Settles the queue even when the leader's future is dropped mid-refresh.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl LeaderGuard<'_> {
    fn settle(&mut self, outcome: Result<()>) {
        self.settled = true;
        self.coordinator.settle(outcome);
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.settle(Err(Error::RefreshAbandoned));
        }
    }
}
