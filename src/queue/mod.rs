/// Moderation queue
///
/// Holds a server-provided collection of submissions, filters it locally and
/// moves single items from pending to approved or removed.

pub mod envelope;
pub mod filter;
pub mod manager;
pub mod models;
pub mod payload;
pub mod transition;

pub use envelope::Page;
pub use filter::{Facet, FacetValue, FilteredView, ItemFilter, StatusFilter};
pub use manager::{ModerationQueue, QueueOptions, TransitionOutcome};
pub use models::{ItemId, ModerationItem, ModerationStatus, QueueKind, Statistics};
pub use payload::{Account, Note, Reviewable};
pub use transition::{apply_transition, Transition, TransitionEffect};
