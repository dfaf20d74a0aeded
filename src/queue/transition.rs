/// Review transitions and the collection reducer
///
/// Per-item state machine:
///
/// ```text
/// pending --approve--> approved
/// pending --reject---> removed
/// ```
///
/// `approved` and `removed` are terminal. Rejection is a hard delete on the
/// backend, so a rejected item leaves every local list.
use crate::{
    error::{ModerationError, ModerationResult},
    queue::{ItemId, ModerationItem, ModerationStatus},
};
use serde::{Deserialize, Serialize};

/// Review decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Approve,
    Reject,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Approve => "approve",
            Transition::Reject => "reject",
        }
    }

    pub fn from_str(s: &str) -> ModerationResult<Self> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(Transition::Approve),
            "reject" => Ok(Transition::Reject),
            _ => Err(ModerationError::Validation(format!("Invalid transition: {}", s))),
        }
    }

    /// Resolve what this transition does to an item in `status`
    pub fn effect_on(&self, id: &ItemId, status: ModerationStatus) -> ModerationResult<TransitionEffect> {
        match (self, status) {
            (Transition::Approve, ModerationStatus::Pending) => {
                Ok(TransitionEffect::SetStatus(ModerationStatus::Approved))
            }
            (Transition::Reject, ModerationStatus::Pending) => Ok(TransitionEffect::Remove),
            _ => Err(ModerationError::InvalidTransition {
                id: id.clone(),
                action: self.as_str(),
                status: status.as_str(),
            }),
        }
    }
}

/// Local effect of an acknowledged transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    SetStatus(ModerationStatus),
    Remove,
}

/// Check that `transition` is allowed for `id` within `items`
pub fn validate_transition<P>(
    items: &[ModerationItem<P>],
    id: &ItemId,
    transition: Transition,
) -> ModerationResult<TransitionEffect> {
    let item = items
        .iter()
        .find(|item| &item.id == id)
        .ok_or_else(|| ModerationError::NotFound(id.clone()))?;

    transition.effect_on(id, item.status)
}

/// Apply an acknowledged transition to a collection
///
/// Only the item with `id` changes. Order of the remaining items is kept.
pub fn apply_transition<P>(
    mut items: Vec<ModerationItem<P>>,
    id: &ItemId,
    transition: Transition,
) -> ModerationResult<Vec<ModerationItem<P>>> {
    apply_transition_in_place(&mut items, id, transition)?;
    Ok(items)
}

/// In-place form of `apply_transition`; leaves `items` untouched on error
pub fn apply_transition_in_place<P>(
    items: &mut Vec<ModerationItem<P>>,
    id: &ItemId,
    transition: Transition,
) -> ModerationResult<()> {
    match validate_transition(items, id, transition)? {
        TransitionEffect::SetStatus(status) => {
            for item in items.iter_mut().filter(|item| &item.id == id) {
                item.status = status;
            }
        }
        TransitionEffect::Remove => items.retain(|item| &item.id != id),
    }

    Ok(())
}
