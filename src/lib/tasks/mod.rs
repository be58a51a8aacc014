pub mod state;
pub mod types;

pub use state::valid_state_transition;
pub use types::{Task, TaskError, TaskStatus};
