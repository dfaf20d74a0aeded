/// Moderation backend
///
/// The REST backend owns every item. A queue talks to it through
/// `ModerationBackend` only: one idempotent listing call and one
/// non-idempotent transition call per review decision.

pub mod http;

pub use http::HttpBackend;

use crate::{
    error::ModerationResult,
    queue::{
        payload::Reviewable, ItemId, ModerationItem, Page, QueueKind, StatusFilter, Transition,
    },
};
use async_trait::async_trait;

/// Backend operations a queue depends on
#[async_trait]
pub trait ModerationBackend: Send + Sync {
    /// Payload type the listing decodes into
    type Payload: Reviewable;

    /// Which review page this backend serves
    fn kind(&self) -> QueueKind;

    /// Fetch the listing for `scope`; an empty listing is not an error
    async fn fetch_items(
        &self,
        scope: StatusFilter,
    ) -> ModerationResult<Page<ModerationItem<Self::Payload>>>;

    /// Issue one authoritative transition; never retried by the caller
    async fn transition(&self, id: &ItemId, transition: Transition) -> ModerationResult<()>;
}
