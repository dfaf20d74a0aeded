/// REST implementation of the moderation backend
use crate::{
    backend::ModerationBackend,
    config::ApiConfig,
    error::{BackendErrorBody, ModerationError, ModerationResult},
    queue::{
        payload::{Account, Note, Reviewable},
        ItemId, ModerationItem, Page, QueueKind, StatusFilter, Transition,
    },
};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, warn};

/// Secondary listing merged into the primary one
struct ExtraListing<P> {
    path: &'static str,
    keep: fn(&P) -> bool,
}

/// One backend request
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// HTTP client for one review page
pub struct HttpBackend<P> {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    kind: QueueKind,
    extra_listing: Option<ExtraListing<P>>,
    _payload: PhantomData<fn() -> P>,
}

impl HttpBackend<Note> {
    /// Notes verification page
    pub fn notes(config: &ApiConfig) -> ModerationResult<Self> {
        Self::new(QueueKind::Notes, config, None)
    }

    /// Academics management page for administrators
    pub fn academics(config: &ApiConfig) -> ModerationResult<Self> {
        Self::new(QueueKind::Academics, config, None)
    }
}

impl HttpBackend<Account> {
    /// Alumni approval page
    pub fn alumni(config: &ApiConfig) -> ModerationResult<Self> {
        Self::new(QueueKind::Alumni, config, None)
    }

    /// Teacher approval page
    ///
    /// Approved teachers have no listing of their own; they are picked out of
    /// the general user listing by username or email.
    pub fn teachers(config: &ApiConfig) -> ModerationResult<Self> {
        Self::new(
            QueueKind::Teachers,
            config,
            Some(ExtraListing {
                path: "/api/auth/admin/students/",
                keep: looks_like_teacher,
            }),
        )
    }
}

fn looks_like_teacher(account: &Account) -> bool {
    account.username.contains("teacher") || account.email.contains("teacher")
}

impl<P: Reviewable> HttpBackend<P> {
    fn new(
        kind: QueueKind,
        config: &ApiConfig,
        extra_listing: Option<ExtraListing<P>>,
    ) -> ModerationResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModerationError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            kind,
            extra_listing,
            _payload: PhantomData,
        })
    }

    /// Send a request and return the JSON body, or `Null` for empty bodies
    async fn send(&self, endpoint: Endpoint) -> ModerationResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint.path);
        debug!(method = %endpoint.method, url = %url, "Backend request");

        let mut request = self.client.request(endpoint.method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &endpoint.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body: BackendErrorBody = serde_json::from_str(&text).unwrap_or_default();
            return Err(ModerationError::Backend {
                status: status.as_u16(),
                message: body.into_message(status.canonical_reason().unwrap_or("request failed")),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }

    async fn fetch_extra(&self, extra: &ExtraListing<P>) -> ModerationResult<Page<ModerationItem<P>>> {
        let endpoint = Endpoint {
            method: Method::GET,
            path: extra.path.to_string(),
            body: None,
        };

        let mut page = Page::normalize(self.send(endpoint).await?)?;
        page.items.retain(|item| (extra.keep)(&item.payload));
        page.count = page.items.len();
        Ok(page)
    }
}

/// Listing endpoint for a page and status scope
pub fn list_endpoint(kind: QueueKind, scope: StatusFilter) -> Endpoint {
    let path = match (kind, scope) {
        (QueueKind::Notes | QueueKind::Academics, StatusFilter::Pending) => {
            "/api/academics/notes/pending/"
        }
        (QueueKind::Notes | QueueKind::Academics, StatusFilter::Approved) => {
            "/api/academics/notes/approved/"
        }
        (QueueKind::Notes | QueueKind::Academics, StatusFilter::All) => {
            "/api/academics/notes/?approved_only=false"
        }
        (QueueKind::Alumni, _) => "/api/auth/admin/alumni/",
        (QueueKind::Teachers, _) => "/api/auth/admin/teachers/pending/",
    };

    Endpoint {
        method: Method::GET,
        path: path.to_string(),
        body: None,
    }
}

/// Transition endpoint for a page
pub fn transition_endpoint(kind: QueueKind, id: &ItemId, transition: Transition) -> Endpoint {
    let segment = id.path_segment();
    match (kind, transition) {
        (QueueKind::Notes | QueueKind::Academics, Transition::Approve) => Endpoint {
            method: Method::POST,
            path: "/api/academics/notes/approve/".to_string(),
            body: Some(json!({ "note_id": id })),
        },
        (QueueKind::Notes, Transition::Reject) => Endpoint {
            method: Method::DELETE,
            path: format!("/api/academics/notes/{}/reject/", segment),
            body: None,
        },
        (QueueKind::Academics, Transition::Reject) => Endpoint {
            method: Method::DELETE,
            path: format!("/api/academics/notes/{}/delete/", segment),
            body: None,
        },
        (QueueKind::Alumni, action) | (QueueKind::Teachers, action) => Endpoint {
            method: Method::POST,
            path: format!(
                "/api/auth/admin/{}/{}/{}/",
                kind.as_str(),
                segment,
                action.as_str()
            ),
            body: None,
        },
    }
}

#[async_trait]
impl<P: Reviewable> ModerationBackend for HttpBackend<P> {
    type Payload = P;

    fn kind(&self) -> QueueKind {
        self.kind
    }

    async fn fetch_items(&self, scope: StatusFilter) -> ModerationResult<Page<ModerationItem<P>>> {
        let primary = async {
            let body = self.send(list_endpoint(self.kind, scope)).await?;
            Page::<ModerationItem<P>>::normalize(body)
        };

        let extra = match &self.extra_listing {
            Some(extra) => extra,
            None => return primary.await,
        };

        // either listing alone is enough; the scope is applied after merging
        let (primary, secondary) = futures::join!(primary, self.fetch_extra(extra));
        let mut page = match (primary, secondary) {
            (Ok(primary), Ok(secondary)) => primary.merge(secondary),
            (Ok(primary), Err(e)) => {
                warn!(kind = self.kind.as_str(), path = extra.path, "Secondary listing failed: {}", e);
                primary
            }
            (Err(e), Ok(secondary)) => {
                warn!(kind = self.kind.as_str(), "Primary listing failed: {}", e);
                secondary
            }
            (Err(e), Err(_)) => return Err(e),
        };

        page.items.retain(|item| scope.accepts(item.status));
        page.count = page.items.len();
        Ok(page)
    }

    async fn transition(&self, id: &ItemId, transition: Transition) -> ModerationResult<()> {
        self.send(transition_endpoint(self.kind, id, transition)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ApiConfig {
        ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            token: None,
            timeout_secs: 5,
            user_agent: "eesa-moderation-test".to_string(),
        }
    }

    #[test]
    fn test_note_list_endpoints() {
        assert_eq!(
            list_endpoint(QueueKind::Notes, StatusFilter::Pending).path,
            "/api/academics/notes/pending/"
        );
        assert_eq!(
            list_endpoint(QueueKind::Notes, StatusFilter::All).path,
            "/api/academics/notes/?approved_only=false"
        );
        assert_eq!(
            list_endpoint(QueueKind::Alumni, StatusFilter::Pending).path,
            "/api/auth/admin/alumni/"
        );
    }

    #[test]
    fn test_note_transitions() {
        let approve = transition_endpoint(QueueKind::Notes, &ItemId::Int(12), Transition::Approve);
        assert_eq!(approve.method, Method::POST);
        assert_eq!(approve.path, "/api/academics/notes/approve/");
        assert_eq!(approve.body, Some(json!({"note_id": 12})));

        let reject = transition_endpoint(QueueKind::Notes, &ItemId::Int(12), Transition::Reject);
        assert_eq!(reject.method, Method::DELETE);
        assert_eq!(reject.path, "/api/academics/notes/12/reject/");
        assert!(reject.body.is_none());
    }

    #[test]
    fn test_academics_reject_deletes() {
        let approve = transition_endpoint(QueueKind::Academics, &ItemId::Int(7), Transition::Approve);
        assert_eq!(approve.path, "/api/academics/notes/approve/");
        assert_eq!(approve.body, Some(json!({"note_id": 7})));

        let reject = transition_endpoint(QueueKind::Academics, &ItemId::Int(7), Transition::Reject);
        assert_eq!(reject.method, Method::DELETE);
        assert_eq!(reject.path, "/api/academics/notes/7/delete/");
        assert_eq!(
            list_endpoint(QueueKind::Academics, StatusFilter::All).path,
            "/api/academics/notes/?approved_only=false"
        );
    }

    #[test]
    fn test_registration_transitions() {
        let approve = transition_endpoint(QueueKind::Alumni, &ItemId::Int(4), Transition::Approve);
        assert_eq!(approve.path, "/api/auth/admin/alumni/4/approve/");

        let reject = transition_endpoint(QueueKind::Teachers, &ItemId::from("t 1"), Transition::Reject);
        assert_eq!(reject.method, Method::POST);
        assert_eq!(reject.path, "/api/auth/admin/teachers/t%201/reject/");
    }

    #[test]
    fn test_teacher_heuristic() {
        let mut account: Account = serde_json::from_value(json!({"id": 1})).unwrap();
        assert!(!looks_like_teacher(&account));
        account.email = "teacher.rao@example.com".to_string();
        assert!(looks_like_teacher(&account));
    }

    #[test]
    fn test_constructors_keep_kind() {
        assert_eq!(HttpBackend::<Note>::notes(&api()).unwrap().kind(), QueueKind::Notes);
        assert_eq!(HttpBackend::<Note>::academics(&api()).unwrap().kind(), QueueKind::Academics);
        assert_eq!(HttpBackend::<Account>::teachers(&api()).unwrap().kind(), QueueKind::Teachers);
        assert_eq!(HttpBackend::<Account>::alumni(&api()).unwrap().base_url, "http://localhost:8000");
    }
}
