/// Client-side filtering of a loaded collection
///
/// A filter is a set of predicates combined with AND. Empty predicates match
/// everything, so `ItemFilter::default()` keeps the whole collection.
use crate::{
    error::{ModerationError, ModerationResult},
    queue::{payload::Reviewable, ModerationItem, ModerationStatus},
};
use serde::{Deserialize, Serialize};

/// Categorical field a payload may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Scheme,
    Semester,
    NoteType,
    /// Uploader role
    Role,
    Module,
    /// Account activation flag
    Active,
}

impl Facet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Scheme => "scheme",
            Facet::Semester => "semester",
            Facet::NoteType => "note_type",
            Facet::Role => "role",
            Facet::Module => "module",
            Facet::Active => "active",
        }
    }

    pub fn from_str(s: &str) -> ModerationResult<Self> {
        match s.to_lowercase().as_str() {
            "scheme" => Ok(Facet::Scheme),
            "semester" => Ok(Facet::Semester),
            "note_type" => Ok(Facet::NoteType),
            "role" => Ok(Facet::Role),
            "module" => Ok(Facet::Module),
            "active" => Ok(Facet::Active),
            _ => Err(ModerationError::Validation(format!("Invalid facet: {}", s))),
        }
    }
}

/// Value of a facet, either on an item or in a predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetValue {
    Text(String),
    Number(i64),
    Flag(bool),
}

impl FacetValue {
    /// Whether this predicate value accepts an item's value
    ///
    /// Text compares case-insensitively and an empty text accepts anything.
    /// Numbers and flags compare exactly. Mixed kinds never match.
    pub fn accepts(&self, actual: &FacetValue) -> bool {
        match (self, actual) {
            (FacetValue::Text(wanted), _) if wanted.is_empty() => true,
            (FacetValue::Text(wanted), FacetValue::Text(got)) => {
                wanted.to_lowercase() == got.to_lowercase()
            }
            (FacetValue::Number(wanted), FacetValue::Number(got)) => wanted == got,
            (FacetValue::Flag(wanted), FacetValue::Flag(got)) => wanted == got,
            _ => false,
        }
    }

    /// An empty text predicate, which also accepts items lacking the field
    pub fn is_wildcard(&self) -> bool {
        matches!(self, FacetValue::Text(wanted) if wanted.is_empty())
    }
}

/// Which review states are visible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Approved => "approved",
        }
    }

    pub fn from_str(s: &str) -> ModerationResult<Self> {
        match s.to_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "approved" => Ok(StatusFilter::Approved),
            _ => Err(ModerationError::Validation(format!("Invalid status filter: {}", s))),
        }
    }

    pub fn accepts(&self, status: ModerationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == ModerationStatus::Pending,
            StatusFilter::Approved => status == ModerationStatus::Approved,
        }
    }
}

/// Filter descriptor for `load`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub search: Option<String>,
    pub status: StatusFilter,
    pub facets: Vec<(Facet, FacetValue)>,
}

impl ItemFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_facet(mut self, facet: Facet, value: FacetValue) -> Self {
        self.facets.push((facet, value));
        self
    }

    /// Check every predicate against one item
    pub fn matches<P: Reviewable>(&self, item: &ModerationItem<P>) -> bool {
        self.matches_search(&item.payload)
            && self.status.accepts(item.status)
            && self.facets.iter().all(|(facet, wanted)| {
                item.payload
                    .facet(*facet)
                    .map_or(wanted.is_wildcard(), |actual| wanted.accepts(&actual))
            })
    }

    fn matches_search<P: Reviewable>(&self, payload: &P) -> bool {
        let needle = match self.search.as_deref() {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return true,
        };

        payload
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Lazy view of the items this filter keeps
    pub fn view<'a, P: Reviewable>(&'a self, items: &'a [ModerationItem<P>]) -> FilteredView<'a, P> {
        FilteredView { items, filter: self }
    }
}

/// Restartable filtered view over a borrowed collection
///
/// Nothing is cached: every call to `iter` re-evaluates the filter, so a view
/// always reflects the filter and collection it borrows.
pub struct FilteredView<'a, P> {
    items: &'a [ModerationItem<P>],
    filter: &'a ItemFilter,
}

impl<'a, P: Reviewable> FilteredView<'a, P> {
    pub fn iter(&self) -> impl Iterator<Item = &'a ModerationItem<P>> + Clone + 'a {
        let filter = self.filter;
        self.items.iter().filter(move |item| filter.matches(item))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn to_vec(&self) -> Vec<ModerationItem<P>> {
        self.iter().cloned().collect()
    }
}
