#[cfg(test)]
pub(crate) mod fake;
mod manager;
mod multiplexer;
mod orchestrator;
mod session;

pub use manager::{is_inside_tmux, TmuxManager};
pub use multiplexer::Multiplexer;
pub use orchestrator::{generate_unique_name, SessionOrchestrator};
pub use session::{parse_session_list, Session, LIST_FORMAT};

/// Exit status of `tmux list-sessions` when no server or no session exists
pub const NO_SESSIONS_EXIT_CODE: i32 = 1;
