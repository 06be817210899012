mod candidate_buffer;
mod coordinator;
mod coordinator_command;
mod inbox;
mod session_state;
mod state_reporter;

pub use candidate_buffer::*;
pub use coordinator::*;
pub use coordinator_command::*;
pub use inbox::*;
pub use session_state::*;
pub use state_reporter::*;
