/// Normalization of list responses
///
/// The backend answers list calls with either a bare array or an object that
/// carries the array under a page-specific key. `Page::normalize` is the one
/// place that shape is resolved.
use crate::{
    error::{ModerationError, ModerationResult},
    queue::{payload::Reviewable, ModerationItem},
};
use serde_json::Value;
use tracing::warn;

/// Keys the backend may nest a listing under, in lookup order
pub const LIST_KEYS: &[&str] = &[
    "results",
    "pending_notes",
    "approved_notes",
    "notes",
    "alumni",
    "pending_teachers",
    "students",
];

/// One normalized listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Server-side total; equals `items.len()` when the server omits it
    pub count: usize,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
        }
    }
}

impl<P: Reviewable> Page<ModerationItem<P>> {
    /// Turn a raw list response into a deduplicated page
    ///
    /// Rows that do not decode are skipped with a warning; only a body that
    /// is not a listing at all is an error.
    pub fn normalize(body: Value) -> ModerationResult<Self> {
        let (raw_items, count) = match body {
            Value::Null => (Vec::new(), None),
            Value::Array(items) => (items, None),
            Value::Object(mut map) => {
                let count = map
                    .get("count")
                    .and_then(Value::as_u64)
                    .map(|c| c as usize);
                let items = LIST_KEYS
                    .iter()
                    .find_map(|key| match map.remove(*key) {
                        Some(Value::Array(items)) => Some(items),
                        _ => None,
                    })
                    .unwrap_or_default();
                (items, count)
            }
            other => {
                return Err(ModerationError::Decode(format!(
                    "Expected a list response, got {}",
                    other
                )))
            }
        };

        let mut page = Page::default();
        for raw in raw_items {
            match serde_json::from_value::<P>(raw) {
                Ok(payload) => page.push_unique(payload.into_item()),
                Err(e) => warn!("Skipping undecodable list row: {}", e),
            }
        }
        page.count = count.unwrap_or(page.items.len());

        Ok(page)
    }

    /// Append another listing, keeping the first occurrence of each id
    pub fn merge(mut self, other: Self) -> Self {
        for item in other.items {
            self.push_unique(item);
        }
        self.count = self.items.len();
        self
    }

    fn push_unique(&mut self, item: ModerationItem<P>) {
        // linear scan; listings are page-sized
        if !self.items.iter().any(|existing| existing.id == item.id) {
            self.items.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{
        payload::{Account, Note},
        ItemId, ModerationStatus,
    };
    use serde_json::json;

    fn account(id: i64, approved: bool) -> Value {
        json!({
            "id": id,
            "first_name": "Nila",
            "last_name": "K",
            "email": format!("nila{}@example.com", id),
            "username": format!("nila{}", id),
            "is_active": true,
            "is_approved": approved
        })
    }

    #[test]
    fn test_bare_array() {
        let page: Page<ModerationItem<Account>> =
            Page::normalize(json!([account(1, false), account(2, true)])).unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.items[1].status, ModerationStatus::Approved);
    }

    #[test]
    fn test_keyed_object_with_count() {
        let body = json!({"pending_teachers": [account(5, false)], "count": 12});
        let page: Page<ModerationItem<Account>> = Page::normalize(body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.count, 12);
    }

    #[test]
    fn test_results_key_wins() {
        let body = json!({"results": [account(1, false)], "alumni": [account(2, false)]});
        let page: Page<ModerationItem<Account>> = Page::normalize(body).unwrap();
        assert_eq!(page.items[0].id, ItemId::Int(1));
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_empty_shapes() {
        let page: Page<ModerationItem<Account>> = Page::normalize(Value::Null).unwrap();
        assert!(page.items.is_empty());

        let page: Page<ModerationItem<Account>> = Page::normalize(json!({"count": 0})).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.count, 0);
    }

    #[test]
    fn test_scalar_body_is_decode_error() {
        let result: ModerationResult<Page<ModerationItem<Account>>> = Page::normalize(json!("oops"));
        assert!(matches!(result, Err(ModerationError::Decode(_))));
    }

    #[test]
    fn test_duplicates_dropped() {
        let body = json!({"alumni": [account(1, false), account(1, true), account(2, false)]});
        let page: Page<ModerationItem<Account>> = Page::normalize(body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].status, ModerationStatus::Pending);
        assert_eq!(page.items[1].id, ItemId::Int(2));
    }

    #[test]
    fn test_bad_rows_do_not_sink_the_listing() {
        let body = json!({"notes": [
            {
                "id": 1,
                "title": "Circuits Notes",
                "subject_details": {"id": 2, "name": "Circuits", "code": "EE101", "semester": 2},
                "uploaded_by": {"id": 8, "first_name": "Devi"}
            },
            {"id": 2, "title": "Signals Notes", "subject_details": null, "uploaded_by": null},
            {"id": 3, "subject_details": null}
        ]});
        let page: Page<ModerationItem<Note>> = Page::normalize(body).unwrap();

        let ids: Vec<ItemId> = page.items.iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids, vec![ItemId::Int(1), ItemId::Int(2)]);
        assert!(page.items[1].payload.subject_details.is_none());
        assert_eq!(page.count, 2);
    }

    #[test]
    fn test_merge_keeps_first() {
        let a: Page<ModerationItem<Account>> =
            Page::normalize(json!([account(1, false), account(2, false)])).unwrap();
        let b: Page<ModerationItem<Account>> =
            Page::normalize(json!([account(2, true), account(3, true)])).unwrap();
        let merged = a.merge(b);
        assert_eq!(merged.count, 3);
        assert_eq!(merged.items[1].status, ModerationStatus::Pending);
    }
}
