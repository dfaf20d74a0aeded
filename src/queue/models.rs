/// Moderation item models
use crate::error::{ModerationError, ModerationResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque item identifier as issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl ItemId {
    /// Identifier encoded for use inside a URL path
    pub fn path_segment(&self) -> String {
        match self {
            ItemId::Int(n) => n.to_string(),
            ItemId::Str(s) => urlencoding::encode(s).into_owned(),
        }
    }

    /// Parse a command-line identifier, preferring the numeric form
    pub fn parse(s: &str) -> ItemId {
        s.parse::<i64>()
            .map(ItemId::Int)
            .unwrap_or_else(|_| ItemId::Str(s.to_string()))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(n) => write!(f, "{}", n),
            ItemId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        ItemId::Int(n)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Str(s.to_string())
    }
}

/// Review status of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> ModerationResult<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "rejected" => Ok(ModerationStatus::Rejected),
            _ => Err(ModerationError::Validation(format!("Invalid status: {}", s))),
        }
    }

    /// Map the backend's `is_approved` flag
    pub fn from_approved(is_approved: bool) -> Self {
        if is_approved {
            ModerationStatus::Approved
        } else {
            ModerationStatus::Pending
        }
    }
}

/// One unit awaiting human review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationItem<P> {
    pub id: ItemId,
    pub status: ModerationStatus,
    pub payload: P,
}

impl<P> ModerationItem<P> {
    pub fn new(id: impl Into<ItemId>, status: ModerationStatus, payload: P) -> Self {
        Self {
            id: id.into(),
            status,
            payload,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ModerationStatus::Pending
    }
}

/// Which review page a queue backs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    /// Uploaded study notes, verified by teaching staff
    Notes,
    /// Uploaded study notes, managed by administrators
    Academics,
    /// Alumni registrations
    Alumni,
    /// Teacher registrations
    Teachers,
}

impl QueueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueKind::Notes => "notes",
            QueueKind::Academics => "academics",
            QueueKind::Alumni => "alumni",
            QueueKind::Teachers => "teachers",
        }
    }

    pub fn from_str(s: &str) -> ModerationResult<Self> {
        match s.to_lowercase().as_str() {
            "notes" => Ok(QueueKind::Notes),
            "academics" => Ok(QueueKind::Academics),
            "alumni" => Ok(QueueKind::Alumni),
            "teachers" => Ok(QueueKind::Teachers),
            _ => Err(ModerationError::Validation(format!("Invalid queue: {}", s))),
        }
    }

    /// Singular noun used in notices
    pub fn noun(&self) -> &'static str {
        match self {
            QueueKind::Notes | QueueKind::Academics => "Note",
            QueueKind::Alumni => "Alumni",
            QueueKind::Teachers => "Teacher",
        }
    }
}

/// Dashboard counters for a loaded collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub pending_count: usize,
    pub approved_today: usize,
    pub total_reviewed: usize,
}

impl Statistics {
    /// Count a collection as of `today` (UTC)
    pub fn tally<'a, P, I, F>(items: I, today: NaiveDate, reviewed_at: F) -> Self
    where
        P: 'a,
        I: IntoIterator<Item = &'a ModerationItem<P>>,
        F: Fn(&ModerationItem<P>) -> Option<DateTime<Utc>>,
    {
        let mut stats = Statistics::default();
        for item in items {
            match item.status {
                ModerationStatus::Pending => stats.pending_count += 1,
                ModerationStatus::Approved => {
                    stats.total_reviewed += 1;
                    if reviewed_at(item).map_or(false, |at| at.date_naive() == today) {
                        stats.approved_today += 1;
                    }
                }
                ModerationStatus::Rejected => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_item_id_untagged_serde() {
        let ids: Vec<ItemId> = serde_json::from_str(r#"[12, "a1b2"]"#).unwrap();
        assert_eq!(ids, vec![ItemId::Int(12), ItemId::Str("a1b2".to_string())]);
    }

    #[test]
    fn test_item_id_path_segment() {
        assert_eq!(ItemId::Int(5).path_segment(), "5");
        assert_eq!(ItemId::from("a b/c").path_segment(), "a%20b%2Fc");
    }

    #[test]
    fn test_item_id_parse() {
        assert_eq!(ItemId::parse("17"), ItemId::Int(17));
        assert_eq!(ItemId::parse("x-17"), ItemId::Str("x-17".to_string()));
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(ModerationStatus::from_str("Pending").unwrap(), ModerationStatus::Pending);
        assert!(ModerationStatus::from_str("archived").is_err());
        assert_eq!(ModerationStatus::from_approved(true), ModerationStatus::Approved);
        assert_eq!(ModerationStatus::from_approved(false), ModerationStatus::Pending);
    }

    #[test]
    fn test_queue_kind_from_str() {
        assert_eq!(QueueKind::from_str("teachers").unwrap(), QueueKind::Teachers);
        assert_eq!(QueueKind::from_str("Academics").unwrap(), QueueKind::Academics);
        assert_eq!(QueueKind::Academics.noun(), "Note");
        assert!(QueueKind::from_str("students").is_err());
    }

    #[test]
    fn test_statistics_tally() {
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let items = vec![
            ModerationItem::new(1_i64, ModerationStatus::Pending, Some(1)),
            ModerationItem::new(2_i64, ModerationStatus::Approved, Some(1)),
            ModerationItem::new(3_i64, ModerationStatus::Approved, Some(0)),
            ModerationItem::new(4_i64, ModerationStatus::Approved, None),
        ];

        let stats = Statistics::tally(&items, today, |item| {
            item.payload.map(|days_ago| {
                Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap() - chrono::Duration::days(days_ago)
            })
        });

        assert_eq!(
            stats,
            Statistics {
                pending_count: 1,
                approved_today: 1,
                total_reviewed: 3,
            }
        );
    }
}
