/// EESA moderation client
///
/// Review queues for the pending submissions of the EESA platform (uploaded
/// notes, alumni and teacher registrations), backed by the platform's REST API.

pub mod auth;
pub mod backend;
pub mod config;
pub mod confirm;
pub mod context;
pub mod error;
pub mod notify;
pub mod queue;

pub use error::{ModerationError, ModerationResult};
