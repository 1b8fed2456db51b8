pub mod session_guard;
pub mod token;

pub use session_guard::{CurrentSession, SessionGuard};
pub use token::TokenInspector;
