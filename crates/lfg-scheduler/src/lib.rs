//! lfg-scheduler — party formation and dungeon instance scheduling.
//!
//! Players queue per role; whenever a full party (1 tank, 1 healer,
//! 3 DPS) is queued and an instance is idle, the party former consumes
//! the party and spawns a dungeon run on that instance. Runs sleep for a
//! random duration, then free their instance and record statistics.
//!
//! # Architecture
//!
//! ```text
//! RunController
//!   └── Coordinator (one Mutex<SharedState> + one Notify broadcast)
//!       ├── RoleQueue        (tanks / healers / dps counts)
//!       ├── InstancePool     (Idle / Occupied slots + usage stats)
//!       ├── party former     (long-lived task, exits on termination)
//!       └── dungeon runs     (detached tasks, one per party)
//! ```
//!
//! Every mutation happens under the coordinator's lock and is followed by
//! a broadcast; every waiter re-checks its predicate after each wake.

pub mod controller;
pub mod coordinator;
pub mod error;
pub mod pool;
pub mod rule;
pub mod run;

pub use controller::RunController;
pub use coordinator::Coordinator;
pub use error::{SimError, SimResult};
pub use pool::{DungeonInstance, InstancePool};
pub use run::RunTimer;
