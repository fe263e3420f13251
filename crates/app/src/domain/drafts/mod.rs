//! Drafts
//!
//! Edit sessions that buffer an administrator's changes to one product and
//! push them to the store on save.

pub mod errors;
pub mod pending;
pub mod session;

pub use errors::DraftError;
pub use session::{DraftSession, DraftSessions, SessionPhase, UploadTarget};
