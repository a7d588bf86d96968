//! State module for tracking exploration progress
//!
//! # Components
//!
//! - `JobState`: interpretation of the persisted `jobInProgress` / `jobComplete` flags
//! - `ExplorerState`: the state machine of a single exploration run

mod explorer_state;
mod job_state;

pub use explorer_state::ExplorerState;
pub use job_state::JobState;
