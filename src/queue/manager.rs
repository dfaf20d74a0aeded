/// Moderation queue manager
use crate::{
    auth::AuthContext,
    backend::ModerationBackend,
    confirm::Confirmer,
    error::{ModerationError, ModerationResult},
    notify::{Notice, Notifier},
    queue::{
        filter::{ItemFilter, StatusFilter},
        transition::{apply_transition_in_place, validate_transition, Transition},
        payload::Reviewable,
        ItemId, ModerationItem, QueueKind, Statistics,
    },
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Queue behavior switches
#[derive(Debug, Clone, Copy)]
pub struct QueueOptions {
    /// Refuse a transition on an id while another one for it is outstanding.
    /// Turning this off allows duplicate calls for the same id.
    pub guard_in_flight: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            guard_in_flight: true,
        }
    }
}

/// What happened to a requested transition
///
/// Informational only; the reviewer has already been told through the
/// notifier by the time this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Backend acknowledged and the local collection was updated
    Applied,
    /// Reviewer declined the confirmation, no call was issued
    Declined,
    /// Refused before any call was issued
    Refused(String),
    /// Backend call failed, local state unchanged
    Failed(String),
}

struct QueueState<P> {
    items: Vec<ModerationItem<P>>,
    /// Total reported by the server for the last listing
    server_count: usize,
    /// Pending total from the pending listing, when the loaded scope is wider
    pending_total: Option<usize>,
    in_flight: HashSet<ItemId>,
    /// Acknowledgement times of approvals made through this queue
    approved_at: HashMap<ItemId, DateTime<Utc>>,
}

impl<P> Default for QueueState<P> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            server_count: 0,
            pending_total: None,
            in_flight: HashSet::new(),
            approved_at: HashMap::new(),
        }
    }
}

/// Review queue for one kind of submission
pub struct ModerationQueue<B: ModerationBackend> {
    backend: Arc<B>,
    auth: AuthContext,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    options: QueueOptions,
    state: Mutex<QueueState<B::Payload>>,
}

impl<B: ModerationBackend> ModerationQueue<B> {
    pub fn new(
        backend: Arc<B>,
        auth: AuthContext,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            backend,
            auth,
            notifier,
            confirmer,
            options: QueueOptions::default(),
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn with_options(mut self, options: QueueOptions) -> Self {
        self.options = options;
        self
    }

    pub fn kind(&self) -> QueueKind {
        self.backend.kind()
    }

    /// Replace the local collection with the backend listing for `scope`
    ///
    /// Any scope other than pending also fetches the pending listing so the
    /// pending counter does not depend on the loaded scope. Failures empty the
    /// collection and raise a notice; they are never returned. Returns the
    /// number of items now held.
    pub async fn refresh(&self, scope: StatusFilter) -> usize {
        let kind = self.kind();

        if let Err(e) = self.auth.require_moderator(kind) {
            warn!(kind = kind.as_str(), "Refusing to fetch: {}", e);
            self.clear().await;
            self.notifier.notify(Notice::error(e.to_string()));
            return 0;
        }

        let (listing, pending) = if scope == StatusFilter::Pending {
            (self.backend.fetch_items(scope).await, None)
        } else {
            let (listing, pending) = futures::join!(
                self.backend.fetch_items(scope),
                self.backend.fetch_items(StatusFilter::Pending)
            );
            (listing, Some(pending))
        };

        let pending_total = match pending {
            Some(Ok(page)) => Some(page.items.iter().filter(|item| item.is_pending()).count()),
            Some(Err(e)) => {
                warn!(kind = kind.as_str(), "Pending listing unavailable, counting loaded items: {}", e);
                None
            }
            None => None,
        };

        match listing {
            Ok(page) => {
                let mut state = self.state.lock().await;
                state.server_count = page.count;
                state.pending_total = pending_total;
                state.items = page.items;
                info!(
                    kind = kind.as_str(),
                    scope = scope.as_str(),
                    count = state.items.len(),
                    "Fetched moderation items"
                );
                state.items.len()
            }
            Err(e) => {
                error!(kind = kind.as_str(), "Error fetching items: {}", e);
                self.clear().await;
                self.notifier
                    .notify(Notice::error(format!("Failed to fetch {}", kind.as_str())));
                0
            }
        }
    }

    async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.items.clear();
        state.server_count = 0;
        state.pending_total = None;
    }

    /// Items kept by `filter`, in collection order
    ///
    /// Pure over the fetched data; recomputed on every call.
    pub async fn load(&self, filter: &ItemFilter) -> Vec<ModerationItem<B::Payload>> {
        let state = self.state.lock().await;
        filter.view(&state.items).to_vec()
    }

    pub async fn items(&self) -> Vec<ModerationItem<B::Payload>> {
        self.state.lock().await.items.clone()
    }

    pub async fn get(&self, id: &ItemId) -> Option<ModerationItem<B::Payload>> {
        let state = self.state.lock().await;
        state.items.iter().find(|item| &item.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Total the server reported for the last listing
    pub async fn server_count(&self) -> usize {
        self.state.lock().await.server_count
    }

    /// Dashboard counters for the loaded collection
    ///
    /// `pending_count` comes from the pending listing whatever scope is
    /// loaded; the other counters cover the loaded collection.
    pub async fn statistics(&self) -> Statistics {
        let today = Utc::now().date_naive();
        let state = self.state.lock().await;
        let mut stats = Statistics::tally(&state.items, today, |item| {
            state
                .approved_at
                .get(&item.id)
                .copied()
                .or_else(|| item.payload.reviewed_at())
        });
        if let Some(pending) = state.pending_total {
            stats.pending_count = pending;
        }
        stats
    }

    /// Approve a pending item
    pub async fn approve(&self, id: impl Into<ItemId>) -> TransitionOutcome {
        let id = id.into();
        if let Err(e) = self.begin(&id, Transition::Approve).await {
            return self.refuse(&id, Transition::Approve, e);
        }
        self.execute(id, Transition::Approve).await
    }

    /// Reject a pending item after the reviewer confirms
    ///
    /// Rejection deletes the submission on the backend and cannot be undone.
    pub async fn reject(&self, id: impl Into<ItemId>) -> TransitionOutcome {
        let id = id.into();
        let kind = self.kind();

        if let Err(e) = self.precheck(&id, Transition::Reject).await {
            return self.refuse(&id, Transition::Reject, e);
        }

        let prompt = format!(
            "Are you sure you want to reject this {}? This action cannot be undone.",
            kind.noun().to_lowercase()
        );
        if !self.confirmer.confirm(&prompt).await {
            info!(kind = kind.as_str(), id = %id, "Rejection cancelled");
            return TransitionOutcome::Declined;
        }

        if let Err(e) = self.begin(&id, Transition::Reject).await {
            return self.refuse(&id, Transition::Reject, e);
        }
        self.execute(id, Transition::Reject).await
    }

    /// Local checks that need no reservation
    async fn precheck(&self, id: &ItemId, transition: Transition) -> ModerationResult<()> {
        self.auth.require_moderator(self.kind())?;

        let state = self.state.lock().await;
        validate_transition(&state.items, id, transition)?;
        if self.options.guard_in_flight && state.in_flight.contains(id) {
            return Err(ModerationError::InFlight(id.clone()));
        }
        Ok(())
    }

    /// Check and reserve `id` for one outstanding call
    async fn begin(&self, id: &ItemId, transition: Transition) -> ModerationResult<()> {
        self.auth.require_moderator(self.kind())?;

        let mut state = self.state.lock().await;
        validate_transition(&state.items, id, transition)?;
        if self.options.guard_in_flight && !state.in_flight.insert(id.clone()) {
            return Err(ModerationError::InFlight(id.clone()));
        }
        Ok(())
    }

    async fn execute(&self, id: ItemId, transition: Transition) -> TransitionOutcome {
        let kind = self.kind();
        info!(kind = kind.as_str(), id = %id, action = transition.as_str(), "Submitting transition");

        let result = self.backend.transition(&id, transition).await;

        let mut state = self.state.lock().await;
        state.in_flight.remove(&id);

        match result {
            Ok(()) => {
                match apply_transition_in_place(&mut state.items, &id, transition) {
                    Ok(()) => {
                        if let Some(pending) = state.pending_total.as_mut() {
                            *pending = pending.saturating_sub(1);
                        }
                    }
                    Err(e) => {
                        // collection changed while the call was outstanding
                        debug!(kind = kind.as_str(), id = %id, "Acknowledged transition not applied locally: {}", e);
                    }
                }
                if transition == Transition::Approve {
                    state.approved_at.insert(id.clone(), Utc::now());
                } else {
                    state.approved_at.remove(&id);
                }
                drop(state);

                let message = match transition {
                    Transition::Approve => format!("{} approved successfully!", kind.noun()),
                    Transition::Reject => format!("{} rejected and removed", kind.noun()),
                };
                info!(kind = kind.as_str(), id = %id, action = transition.as_str(), "Transition applied");
                self.notifier.notify(Notice::success(message));
                TransitionOutcome::Applied
            }
            Err(e) => {
                drop(state);
                error!(kind = kind.as_str(), id = %id, action = transition.as_str(), "Transition failed: {}", e);
                let message = format!(
                    "Failed to {} {}: {}",
                    transition.as_str(),
                    kind.noun().to_lowercase(),
                    e
                );
                self.notifier.notify(Notice::error(message.clone()));
                TransitionOutcome::Failed(message)
            }
        }
    }

    fn refuse(&self, id: &ItemId, transition: Transition, e: ModerationError) -> TransitionOutcome {
        warn!(kind = self.kind().as_str(), id = %id, action = transition.as_str(), "Transition refused: {}", e);
        let message = e.to_string();
        self.notifier.notify(Notice::error(message.clone()));
        TransitionOutcome::Refused(message)
    }
}
