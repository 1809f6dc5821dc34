//! Dungeon runs — one detached task per formed party.
//!
//! A run draws its duration from the shared [`RunTimer`], sleeps without
//! holding the coordinator lock, then reports completion back through the
//! coordinator, which frees the instance and wakes all waiters.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::coordinator::Coordinator;

/// Source of run durations shared by every dungeon run.
///
/// Durations are drawn uniformly from the closed interval
/// `[min_secs, max_secs]`. The generator has its own lock since runs draw
/// from it concurrently and outside the coordinator lock.
#[derive(Debug)]
pub struct RunTimer {
    min_secs: u64,
    max_secs: u64,
    rng: Mutex<StdRng>,
}

impl RunTimer {
    /// Create a timer over `[min_secs, max_secs]`.
    ///
    /// With `seed` set the sequence of draws is reproducible; otherwise the
    /// generator is seeded from OS entropy.
    ///
    /// # Panics
    ///
    /// Panics if `min_secs > max_secs`. Bounds are ordered once, by
    /// `SimConfig::normalized`, before a timer is built.
    pub fn new(min_secs: u64, max_secs: u64, seed: Option<u64>) -> Self {
        assert!(
            min_secs <= max_secs,
            "run time bounds out of order: {min_secs} > {max_secs}"
        );
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            min_secs,
            max_secs,
            rng: Mutex::new(rng),
        }
    }

    /// Fixed-duration timer.
    pub fn fixed(secs: u64) -> Self {
        Self::new(secs, secs, Some(0))
    }

    /// Draw one run duration, in seconds.
    pub fn draw(&self) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(self.min_secs..=self.max_secs)
    }
}

/// Spawn the run for a party that was just assigned `instance`.
///
/// The task is not joined by its spawner; it is accounted for only by the
/// coordinator's active party count.
pub(crate) fn spawn_run(coordinator: Coordinator, instance: usize) {
    tokio::spawn(async move {
        let duration_secs = coordinator.timer().draw();
        debug!(instance, duration_secs, "dungeon run started");

        tokio::time::sleep(Duration::from_secs(duration_secs)).await;

        coordinator.complete_run(instance, duration_secs).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_within_bounds() {
        let timer = RunTimer::new(2, 5, Some(42));
        for _ in 0..500 {
            let d = timer.draw();
            assert!((2..=5).contains(&d), "draw {d} out of range");
        }
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn reversed_bounds_panic() {
        RunTimer::new(8, 3, None);
    }

    #[test]
    fn equal_bounds_always_draw_that_value() {
        let timer = RunTimer::fixed(4);
        for _ in 0..20 {
            assert_eq!(timer.draw(), 4);
        }
    }

    #[test]
    fn same_seed_reproduces_sequence() {
        let a = RunTimer::new(0, 1000, Some(9));
        let b = RunTimer::new(0, 1000, Some(9));
        let xs: Vec<u64> = (0..16).map(|_| a.draw()).collect();
        let ys: Vec<u64> = (0..16).map(|_| b.draw()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn timer_is_shareable_across_threads() {
        let timer = std::sync::Arc::new(RunTimer::new(1, 3, Some(1)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let timer = timer.clone();
                std::thread::spawn(move || (0..100).map(|_| timer.draw()).all(|d| (1..=3).contains(&d)))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
