//! Coordinator — the single lock and broadcast signal over all shared state.
//!
//! The coordinator owns the role queue, the instance pool, the active party
//! count and the quiescence flag. Every read and write of that state goes
//! through one `tokio::sync::Mutex`, and every mutation that could satisfy
//! some waiter is followed by `Notify::notify_waiters` before the lock is
//! dropped.
//!
//! Waiters (the party former and the controller) follow one protocol, see
//! [`Coordinator::wait_until`]: register for the next broadcast, take the
//! lock, evaluate the predicate, and only then suspend. A broadcast sent
//! between the check and the suspension is therefore never missed, and
//! every wake re-evaluates from scratch.

use std::sync::Arc;

use lfg_core::{CoreError, FinalReport, Role, RoleQueue, StatusSnapshot};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::pool::InstancePool;
use crate::rule::{can_form_party, find_free_instance};
use crate::run::{spawn_run, RunTimer};

/// State guarded by the coordinator lock.
#[derive(Debug)]
struct SharedState {
    queue: RoleQueue,
    pool: InstancePool,
    /// Parties currently inside an instance. Always equals the number of
    /// occupied slots when observed under the lock.
    active_parties: usize,
    /// Initial seeding is done; gates the termination predicate.
    quiescent: bool,
    /// The party former has observed termination and exited.
    closed: bool,
}

impl SharedState {
    fn is_terminated(&self) -> bool {
        self.active_parties == 0 && !can_form_party(&self.queue) && self.quiescent
    }

    /// Instance the next party should go to, if a party can be formed now.
    fn ready_instance(&self) -> Option<usize> {
        if can_form_party(&self.queue) {
            find_free_instance(&self.pool)
        } else {
            None
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            queue: self.queue,
            instances: self.pool.snapshot(),
            active_parties: self.active_parties,
            quiescent: self.quiescent,
            closed: self.closed,
        }
    }
}

/// Outcome of one party former iteration.
enum FormerStep {
    Formed { instance: usize },
    Exit,
}

struct Inner {
    state: Mutex<SharedState>,
    changed: Notify,
    timer: RunTimer,
}

/// Shared handle to the simulation state. Cheap to clone.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Create a coordinator with `instances` idle slots and an empty queue.
    pub fn new(instances: usize, timer: RunTimer) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SharedState {
                    queue: RoleQueue::default(),
                    pool: InstancePool::new(instances),
                    active_parties: 0,
                    quiescent: false,
                    closed: false,
                }),
                changed: Notify::new(),
                timer,
            }),
        }
    }

    pub(crate) fn timer(&self) -> &RunTimer {
        &self.inner.timer
    }

    /// Add an initial batch of players to the queue.
    pub async fn seed(&self, queue: RoleQueue) {
        let mut state = self.inner.state.lock().await;
        state.queue.add(Role::Tank, queue.tanks);
        state.queue.add(Role::Healer, queue.healers);
        state.queue.add(Role::Dps, queue.dps);
        info!(queue = %state.queue, "queue seeded");
        self.inner.changed.notify_waiters();
    }

    /// Add `amount` players of `role` while the simulation runs.
    ///
    /// Returns the queue after the addition. Rejected with
    /// [`SimError::Closed`] once the party former has exited, so a finished
    /// simulation can never be revived.
    pub async fn add_players(&self, role: Role, amount: u64) -> SimResult<RoleQueue> {
        if amount == 0 {
            return Err(CoreError::InvalidAmount(amount.to_string()).into());
        }
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Err(SimError::Closed);
        }
        state.queue.add(role, amount);
        info!(%role, amount, queue = %state.queue, "players added");
        self.inner.changed.notify_waiters();
        Ok(state.queue)
    }

    /// Declare initial seeding complete, enabling termination.
    pub async fn mark_quiescent(&self) {
        let mut state = self.inner.state.lock().await;
        state.quiescent = true;
        debug!("initial seeding complete");
        self.inner.changed.notify_waiters();
    }

    /// Current state, read under the lock.
    pub async fn status(&self) -> StatusSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    /// Per-instance statistics and the remaining queue.
    pub async fn report(&self) -> FinalReport {
        let state = self.inner.state.lock().await;
        FinalReport {
            instances: state.pool.summaries(),
            remaining: state.queue,
        }
    }

    /// Block until no party is active, none can be formed, and seeding is
    /// complete. Returns the state observed at that moment.
    pub async fn wait_for_termination(&self) -> StatusSnapshot {
        self.wait_until(|state| state.is_terminated().then(|| state.snapshot()))
            .await
    }

    /// Start the party former on its own task.
    pub fn spawn_party_former(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.run_party_former().await })
    }

    /// The party forming loop. Returns only once termination is observed.
    pub async fn run_party_former(&self) {
        debug!("party former started");
        loop {
            let step = self
                .wait_until(|state| {
                    if state.is_terminated() {
                        state.closed = true;
                        return Some(FormerStep::Exit);
                    }
                    let instance = state.ready_instance()?;
                    state.queue.take_party();
                    state.pool.assign(instance);
                    state.active_parties += 1;
                    debug_assert_eq!(state.active_parties, state.pool.occupied_count());

                    info!(
                        instance,
                        remaining = %state.queue,
                        active = state.active_parties,
                        "party formed"
                    );
                    info!(status = ?state.pool.snapshot(), "instance status");
                    spawn_run(self.clone(), instance);
                    Some(FormerStep::Formed { instance })
                })
                .await;

            match step {
                FormerStep::Formed { instance } => {
                    debug!(instance, "party dispatched");
                }
                FormerStep::Exit => {
                    info!("no more parties can be formed, party former exiting");
                    return;
                }
            }
        }
    }

    /// Record a finished run: free the instance and wake every waiter.
    pub(crate) async fn complete_run(&self, instance: usize, duration_secs: u64) {
        let mut state = self.inner.state.lock().await;
        state.pool.release(instance, duration_secs);
        state.active_parties = state
            .active_parties
            .checked_sub(1)
            .expect("run completed with no active parties");
        debug_assert_eq!(state.active_parties, state.pool.occupied_count());

        info!(
            instance,
            duration_secs,
            active = state.active_parties,
            "instance freed"
        );
        info!(status = ?state.pool.snapshot(), "instance status");
        self.inner.changed.notify_waiters();
    }

    /// Suspend until `check` returns `Some`, re-evaluating after every
    /// broadcast. `check` runs with the lock held and may mutate state;
    /// any mutation it makes is broadcast before the lock is released.
    async fn wait_until<T, F>(&self, mut check: F) -> T
    where
        F: FnMut(&mut SharedState) -> Option<T>,
    {
        loop {
            let notified = self.inner.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.inner.state.lock().await;
                if let Some(out) = check(&mut *state) {
                    self.inner.changed.notify_waiters();
                    return out;
                }
            }

            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_coordinator_is_idle() {
        let coordinator = Coordinator::new(2, RunTimer::fixed(1));
        let status = coordinator.status().await;
        assert_eq!(status.queue, RoleQueue::default());
        assert_eq!(status.instances.len(), 2);
        assert_eq!(status.active_parties, 0);
        assert!(!status.quiescent);
        assert!(!status.closed);
    }

    #[tokio::test]
    async fn add_players_updates_queue() {
        let coordinator = Coordinator::new(1, RunTimer::fixed(1));
        coordinator.add_players(Role::Tank, 2).await.unwrap();
        let queue = coordinator.add_players(Role::Dps, 5).await.unwrap();
        assert_eq!(queue, RoleQueue::new(2, 0, 5));
    }

    #[tokio::test]
    async fn zero_amount_is_rejected_without_mutation() {
        let coordinator = Coordinator::new(1, RunTimer::fixed(1));
        let err = coordinator.add_players(Role::Healer, 0).await.unwrap_err();
        assert!(matches!(err, SimError::Core(_)));
        assert_eq!(coordinator.status().await.queue, RoleQueue::default());
    }

    #[tokio::test]
    async fn termination_requires_quiescence() {
        let coordinator = Coordinator::new(1, RunTimer::fixed(0));
        {
            let state = coordinator.inner.state.lock().await;
            assert!(!state.is_terminated());
        }
        coordinator.mark_quiescent().await;
        let status = coordinator.wait_for_termination().await;
        assert!(status.quiescent);
        assert_eq!(status.active_parties, 0);
    }

    #[tokio::test]
    async fn additions_after_former_exit_are_rejected() {
        let coordinator = Coordinator::new(1, RunTimer::fixed(0));
        coordinator.mark_quiescent().await;
        coordinator.spawn_party_former().await.unwrap();

        assert!(coordinator.status().await.closed);
        let err = coordinator.add_players(Role::Tank, 1).await.unwrap_err();
        assert!(matches!(err, SimError::Closed));
        assert_eq!(coordinator.status().await.queue, RoleQueue::default());
    }

    #[tokio::test(start_paused = true)]
    async fn formation_consumes_roles_and_occupies_instance_together() {
        let coordinator = Coordinator::new(2, RunTimer::fixed(10));
        coordinator.seed(RoleQueue::new(1, 1, 4)).await;
        let former = coordinator.spawn_party_former();

        // Let the former run without advancing the paused clock.
        tokio::task::yield_now().await;
        let status = coordinator
            .wait_until(|state| (state.active_parties == 1).then(|| state.snapshot()))
            .await;
        assert_eq!(status.queue, RoleQueue::new(0, 0, 1));
        assert_eq!(status.occupied(), 1);

        coordinator.mark_quiescent().await;
        coordinator.wait_for_termination().await;
        former.await.unwrap();
    }
}
