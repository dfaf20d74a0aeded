/// Application context and dependency injection
use crate::{
    auth::{AuthContext, SessionUser},
    backend::HttpBackend,
    config::ClientConfig,
    confirm::Confirmer,
    error::ModerationResult,
    notify::Notifier,
    queue::{Account, ModerationQueue, Note, QueueOptions},
};
use std::sync::Arc;
use tracing::info;

/// Shared services for building review queues
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ClientConfig>,
    pub auth: AuthContext,
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: ClientConfig, notifier: Arc<dyn Notifier>) -> ModerationResult<Self> {
        config.validate()?;

        let auth = match config.session.role {
            Some(role) => AuthContext::authenticated(SessionUser {
                id: config.session.user_id,
                role,
            }),
            None => AuthContext::anonymous(),
        };

        info!(
            base_url = %config.api.base_url,
            role = config.session.role.map(|r| r.as_str()).unwrap_or("anonymous"),
            "Moderation client configured"
        );

        Ok(Self {
            config: Arc::new(config),
            auth,
            notifier,
        })
    }

    fn options(&self) -> QueueOptions {
        QueueOptions {
            guard_in_flight: self.config.queue.guard_in_flight,
        }
    }

    /// Notes verification queue
    pub fn notes_queue(
        &self,
        confirmer: Arc<dyn Confirmer>,
    ) -> ModerationResult<ModerationQueue<HttpBackend<Note>>> {
        let backend = Arc::new(HttpBackend::<Note>::notes(&self.config.api)?);
        Ok(ModerationQueue::new(backend, self.auth.clone(), Arc::clone(&self.notifier), confirmer)
            .with_options(self.options()))
    }

    /// Notes queue of the administrators' academics page
    pub fn academics_queue(
        &self,
        confirmer: Arc<dyn Confirmer>,
    ) -> ModerationResult<ModerationQueue<HttpBackend<Note>>> {
        let backend = Arc::new(HttpBackend::<Note>::academics(&self.config.api)?);
        Ok(ModerationQueue::new(backend, self.auth.clone(), Arc::clone(&self.notifier), confirmer)
            .with_options(self.options()))
    }

    /// Alumni registration queue
    pub fn alumni_queue(
        &self,
        confirmer: Arc<dyn Confirmer>,
    ) -> ModerationResult<ModerationQueue<HttpBackend<Account>>> {
        let backend = Arc::new(HttpBackend::<Account>::alumni(&self.config.api)?);
        Ok(ModerationQueue::new(backend, self.auth.clone(), Arc::clone(&self.notifier), confirmer)
            .with_options(self.options()))
    }

    /// Teacher registration queue
    pub fn teachers_queue(
        &self,
        confirmer: Arc<dyn Confirmer>,
    ) -> ModerationResult<ModerationQueue<HttpBackend<Account>>> {
        let backend = Arc::new(HttpBackend::<Account>::teachers(&self.config.api)?);
        Ok(ModerationQueue::new(backend, self.auth.clone(), Arc::clone(&self.notifier), confirmer)
            .with_options(self.options()))
    }
}
