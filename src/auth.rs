/// Authorization context for moderation
///
/// The signed-in user is injected into the queue rather than read from
/// ambient state. The queue only asks whether the user may moderate a kind.
use crate::{
    error::{ModerationError, ModerationResult},
    queue::QueueKind,
};
use serde::{Deserialize, Serialize};

/// Platform roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Alumni,
    Teacher,
    /// Technical lead of the association
    TechHead,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Alumni => "alumni",
            Role::Teacher => "teacher",
            Role::TechHead => "tech_head",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> ModerationResult<Self> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "alumni" => Ok(Role::Alumni),
            "teacher" => Ok(Role::Teacher),
            "tech_head" => Ok(Role::TechHead),
            "admin" => Ok(Role::Admin),
            _ => Err(ModerationError::Validation(format!("Invalid role: {}", s))),
        }
    }

    /// Check if this role may review items of the given kind
    pub fn can_moderate(&self, kind: QueueKind) -> bool {
        match kind {
            QueueKind::Notes => matches!(self, Role::Teacher | Role::TechHead),
            QueueKind::Academics | QueueKind::Alumni | QueueKind::Teachers => *self == Role::Admin,
        }
    }
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub role: Role,
}

/// Read-only authorization capability handed to a queue
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user: Option<SessionUser>,
}

impl AuthContext {
    pub fn authenticated(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Fail unless the current user may moderate `kind`
    pub fn require_moderator(&self, kind: QueueKind) -> ModerationResult<()> {
        let user = self.user.as_ref().ok_or_else(|| {
            ModerationError::Authorization("Sign in to review submissions".to_string())
        })?;

        if !user.role.can_moderate(kind) {
            return Err(ModerationError::Authorization(format!(
                "Role {} cannot review {}",
                user.role.as_str(),
                kind.as_str()
            )));
        }

        Ok(())
    }
}
