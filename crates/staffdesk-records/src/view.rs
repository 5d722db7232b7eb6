//! Filter, sort and paginate pipeline for list views
//!
//! [`ViewQuery::apply`] is a pure function of its inputs: it never touches the
//! store and returns the same page for the same records and query.

use chrono::NaiveDate;
use serde::Serialize;
use staffdesk_core::utils::contains_ignore_case;
use staffdesk_core::{Error, Record, Result};
use std::cmp::Ordering;

/// A single filter; a query matches a record only if all of its predicates do
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<R: Record> {
    /// Case-insensitive substring match over any of the named text fields
    Search {
        /// Text to look for; empty matches everything
        text: String,
        /// Fields searched
        fields: Vec<String>,
    },
    /// Exact status match
    Status(R::Status),
    /// A list field contains `value` (e.g. `assigned_to`)
    Member {
        /// List field
        field: String,
        /// Element looked for
        value: String,
    },
    /// Case-insensitive equality on a text field
    Equals {
        /// Text field
        field: String,
        /// Expected value
        value: String,
    },
    /// Inclusive date range on a date field
    DateRange {
        /// Date field
        field: String,
        /// Earliest date, if bounded
        from: Option<NaiveDate>,
        /// Latest date, if bounded
        to: Option<NaiveDate>,
    },
}

impl<R: Record> Predicate<R> {
    /// Search helper
    pub fn search(text: impl Into<String>, fields: &[&str]) -> Self {
        Self::Search {
            text: text.into(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    /// Membership helper
    pub fn member(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Member {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Equality helper
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether `record` satisfies this predicate
    pub fn matches(&self, record: &R) -> bool {
        match self {
            Self::Search { text, fields } => {
                let needle = text.trim();
                needle.is_empty()
                    || fields.iter().any(|field| {
                        record
                            .text_field(field)
                            .is_some_and(|value| contains_ignore_case(&value, needle))
                    })
            }
            Self::Status(status) => record.status() == *status,
            Self::Member { field, value } => record
                .list_field(field)
                .is_some_and(|items| items.iter().any(|item| item == value)),
            Self::Equals { field, value } => record
                .text_field(field)
                .is_some_and(|actual| actual.eq_ignore_ascii_case(value)),
            Self::DateRange { field, from, to } => {
                record.date_field(field).is_some_and(|date| {
                    from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
                })
            }
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// Sort on one named field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field passed to [`Record::sort_value`]
    pub field: String,
    /// Direction
    pub direction: SortDirection,
}

impl SortSpec {
    /// Ascending sort
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    // Records without the field go last in either direction.
    fn compare<R: Record>(&self, a: &R, b: &R) -> Ordering {
        match (a.sort_value(&self.field), b.sort_value(&self.field)) {
            (Some(x), Some(y)) => match self.direction {
                SortDirection::Ascending => x.cmp(&y),
                SortDirection::Descending => y.cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// One page of a list view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<R> {
    /// Records on this page
    pub items: Vec<R>,
    /// Records matching the filters across all pages
    pub total_count: usize,
    /// Number of pages (0 when nothing matches)
    pub total_pages: usize,
    /// Page actually returned (1-based, after clamping)
    pub page: usize,
    /// Page size used
    pub page_size: usize,
}

impl<R> Page<R> {
    /// Whether a later page exists
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Filters, sort and page selection for a list view
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery<R: Record> {
    /// Conjunctive predicates
    pub predicates: Vec<Predicate<R>>,
    /// Optional ordering; store order otherwise
    pub sort: Option<SortSpec>,
    /// Requested page (1-based; clamped into range)
    pub page: i64,
    /// Rows per page (must be positive)
    pub page_size: i64,
}

impl<R: Record> Default for ViewQuery<R> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            sort: None,
            page: 1,
            page_size: 10,
        }
    }
}

impl<R: Record> ViewQuery<R> {
    /// Query for the first page with the given size
    pub fn new(page_size: i64) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Add a predicate
    #[must_use]
    pub fn filter(mut self, predicate: Predicate<R>) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Set the ordering
    #[must_use]
    pub fn sort_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Select a page
    #[must_use]
    pub fn page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    /// Whether `record` passes every predicate
    pub fn matches(&self, record: &R) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Run the pipeline over `records`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `page_size` is not positive.
    pub fn apply(&self, records: &[R]) -> Result<Page<R>> {
        let page_size = usize::try_from(self.page_size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                Error::config(format!("page_size must be positive, got {}", self.page_size))
            })?;

        let mut matched: Vec<&R> = records.iter().filter(|r| self.matches(r)).collect();

        if let Some(sort) = &self.sort {
            // Stable: ties keep store order.
            matched.sort_by(|a, b| sort.compare(*a, *b));
        }

        let total_count = matched.len();
        let total_pages = total_count.div_ceil(page_size);
        let page = clamp_page(self.page, total_pages);

        let items = matched
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        Ok(Page {
            items,
            total_count,
            total_pages,
            page,
            page_size,
        })
    }
}

fn clamp_page(requested: i64, total_pages: usize) -> usize {
    let last = total_pages.max(1);
    usize::try_from(requested).map_or(1, |page| page.clamp(1, last))
}
