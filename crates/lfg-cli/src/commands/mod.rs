pub mod queue;
pub mod setup;
