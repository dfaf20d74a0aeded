/// Submission payloads shown in the review queues
use crate::queue::{
    filter::{Facet, FacetValue},
    ItemId, ModerationItem, ModerationStatus,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Display hooks the queue uses to filter a payload without interpreting it
pub trait Reviewable: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Backend identifier
    fn item_id(&self) -> ItemId;

    /// Status as reported by the backend
    fn status(&self) -> ModerationStatus;

    /// Displayable text the free-text search runs against
    fn search_fields(&self) -> Vec<&str>;

    /// Categorical value for a facet, `None` when the payload has no such field
    fn facet(&self, facet: Facet) -> Option<FacetValue>;

    /// When the item was last reviewed, if the backend exposes it
    fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// One-line description for listings
    fn summary(&self) -> String;

    /// Wrap the wire record into a queue item
    fn into_item(self) -> ModerationItem<Self> {
        ModerationItem {
            id: self.item_id(),
            status: self.status(),
            payload: self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeDetails {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub year: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectDetails {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub semester: i64,
    #[serde(default)]
    pub scheme_details: Option<SchemeDetails>,
}

/// Uploader of a note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uploader {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

/// Study note awaiting verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub note_type: String,
    #[serde(default)]
    pub module_number: i64,
    /// Missing when the subject was deleted after upload
    #[serde(default)]
    pub subject_details: Option<SubjectDetails>,
    #[serde(default)]
    pub uploaded_by: Option<Uploader>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Reviewable for Note {
    fn item_id(&self) -> ItemId {
        ItemId::Int(self.id)
    }

    fn status(&self) -> ModerationStatus {
        ModerationStatus::from_approved(self.is_approved)
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        if let Some(subject) = &self.subject_details {
            fields.push(subject.name.as_str());
            fields.push(subject.code.as_str());
        }
        if let Some(uploader) = &self.uploaded_by {
            fields.push(uploader.first_name.as_str());
            fields.push(uploader.last_name.as_str());
        }
        fields
    }

    fn facet(&self, facet: Facet) -> Option<FacetValue> {
        let subject = self.subject_details.as_ref();
        match facet {
            Facet::Scheme => subject
                .and_then(|s| s.scheme_details.as_ref())
                .map(|scheme| FacetValue::Text(scheme.name.clone())),
            Facet::Semester => subject.map(|s| FacetValue::Number(s.semester)),
            Facet::NoteType => Some(FacetValue::Text(self.note_type.clone())),
            Facet::Role => self
                .uploaded_by
                .as_ref()
                .map(|u| FacetValue::Text(u.role.clone())),
            Facet::Module => Some(FacetValue::Number(self.module_number)),
            Facet::Active => None,
        }
    }

    fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        if self.is_approved {
            self.updated_at
        } else {
            None
        }
    }

    fn summary(&self) -> String {
        let subject = match &self.subject_details {
            Some(s) => format!("{} ({}) sem {}", s.name, s.code, s.semester),
            None => "unknown subject".to_string(),
        };
        let uploader = match &self.uploaded_by {
            Some(u) => format!("{} {}", u.first_name, u.last_name),
            None => "unknown uploader".to_string(),
        };
        format!("{} | {} | {}", self.title, subject, uploader)
    }
}

/// Alumni or teacher registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_approved: bool,
}

impl Reviewable for Account {
    fn item_id(&self) -> ItemId {
        ItemId::Int(self.id)
    }

    fn status(&self) -> ModerationStatus {
        ModerationStatus::from_approved(self.is_approved)
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.username.as_str(),
        ]
    }

    fn facet(&self, facet: Facet) -> Option<FacetValue> {
        match facet {
            Facet::Active => Some(FacetValue::Flag(self.is_active)),
            _ => None,
        }
    }

    fn summary(&self) -> String {
        format!(
            "{} {} <{}> @{}",
            self.first_name, self.last_name, self.email, self.username
        )
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_from_backend_json() {
        let json = r#"{
            "id": 4,
            "title": "Circuits Notes",
            "description": "Module 1 summary",
            "note_type": "lecture",
            "module_number": 1,
            "subject_details": {
                "id": 2, "name": "Circuits", "code": "EE101", "semester": 2,
                "scheme_details": {"id": 1, "name": "2019 Scheme", "year": 2019}
            },
            "uploaded_by": {
                "id": 8, "first_name": "Devi", "last_name": "S",
                "email": "devi@example.com", "role": "student"
            },
            "file": null,
            "is_approved": false,
            "created_at": "2024-08-01T10:15:00Z",
            "updated_at": "2024-08-01T10:15:00Z"
        }"#;

        let note: Note = serde_json::from_str(json).unwrap();
        let item = note.into_item();
        assert_eq!(item.id, ItemId::Int(4));
        assert_eq!(item.status, ModerationStatus::Pending);
        assert_eq!(
            item.payload.facet(Facet::Semester),
            Some(FacetValue::Number(2))
        );
        assert!(item.payload.reviewed_at().is_none());
    }

    #[test]
    fn test_note_without_subject_or_uploader() {
        let note: Note = serde_json::from_str(
            r#"{"id": 6, "title": "Orphaned notes", "subject_details": null}"#,
        )
        .unwrap();
        assert!(note.subject_details.is_none());
        assert!(note.uploaded_by.is_none());
        assert_eq!(note.search_fields(), vec!["Orphaned notes", ""]);
        assert_eq!(note.facet(Facet::Semester), None);
        assert_eq!(note.facet(Facet::Scheme), None);
        assert_eq!(
            note.summary(),
            "Orphaned notes | unknown subject | unknown uploader"
        );
    }

    #[test]
    fn test_account_tolerates_missing_names() {
        let account: Account =
            serde_json::from_str(r#"{"id": 3, "email": "t@example.com", "is_approved": true}"#)
                .unwrap();
        assert_eq!(account.first_name, "");
        assert_eq!(account.status(), ModerationStatus::Approved);
        assert_eq!(account.facet(Facet::Active), Some(FacetValue::Flag(false)));
        assert_eq!(account.facet(Facet::Semester), None);
    }
}
