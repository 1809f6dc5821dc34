//! Run controller — drives one simulation from seeding to final report.
//!
//! Sequence:
//! 1. seed the queue and build the pool
//! 2. start the party former
//! 3. wait for the hold future (immediately ready unless the caller wants
//!    to keep the simulation open), then mark seeding complete
//! 4. wait for the termination predicate
//! 5. join the party former and produce the final report

use std::future::Future;

use lfg_core::{FinalReport, SimConfig};
use tracing::{debug, info};

use crate::coordinator::Coordinator;
use crate::error::{SimError, SimResult};
use crate::run::RunTimer;

pub struct RunController {
    config: SimConfig,
    coordinator: Coordinator,
}

impl RunController {
    pub fn new(config: SimConfig) -> Self {
        let config = config.normalized();
        let timer = RunTimer::new(config.min_time, config.max_time, config.seed);
        let coordinator = Coordinator::new(config.instances as usize, timer);
        Self {
            config,
            coordinator,
        }
    }

    /// Handle for live additions and status queries while running.
    pub fn coordinator(&self) -> Coordinator {
        self.coordinator.clone()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run to completion, marking seeding complete right away.
    pub async fn run(self) -> SimResult<FinalReport> {
        self.run_until(std::future::ready(())).await
    }

    /// Run to completion, keeping termination disabled until `hold` resolves.
    pub async fn run_until<F>(self, hold: F) -> SimResult<FinalReport>
    where
        F: Future<Output = ()>,
    {
        info!(
            instances = self.config.instances,
            min_time = self.config.min_time,
            max_time = self.config.max_time,
            "simulation starting"
        );
        self.coordinator.seed(self.config.initial_queue()).await;
        let former = self.coordinator.spawn_party_former();

        hold.await;
        self.coordinator.mark_quiescent().await;

        let status = self.coordinator.wait_for_termination().await;
        debug!(queue = %status.queue, "termination observed");

        // Additions may still revive formation until the former itself has
        // observed termination; its exit is the final word.
        former
            .await
            .map_err(|e| SimError::FormerFailed(e.to_string()))?;

        let report = self.coordinator.report().await;
        info!(
            parties = report.parties_served(),
            remaining = %report.remaining,
            "simulation finished"
        );
        Ok(report)
    }
}
