//! Search, facet filtering, sorting and paging for admin table views.
//!
//! Collections are small and loaded wholesale, so every list endpoint pulls
//! the full collection and narrows it here.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::text::contains_ci;

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query string accepted by every list endpoint.
///
/// `status` and `category` are facets each entity maps onto one of its own
/// fields (lead status, blog category, user role, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Text(String),
    Number(f64),
    Time(DateTime<Utc>),
}

impl SortKey {
    pub fn text(value: &str) -> Self {
        SortKey::Text(value.to_lowercase())
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

pub trait Listable {
    /// Fields matched by the `q` search.
    fn search_fields(&self) -> Vec<&str>;

    fn status_facet(&self) -> Option<&str> {
        None
    }

    fn category_facet(&self) -> Option<&str> {
        None
    }

    /// Key for a sortable field, `None` for unknown fields.
    fn sort_key(&self, field: &str) -> Option<SortKey>;

    fn default_sort() -> &'static str {
        "created_at"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

fn facet_matches(value: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted.map(str::trim).filter(|w| !w.is_empty() && *w != "all") {
        None => true,
        Some(wanted) => value.is_some_and(|v| v.eq_ignore_ascii_case(wanted)),
    }
}

/// Narrow and order `items` according to `query`, ignoring paging.
pub fn select<T: Listable>(items: Vec<T>, query: &ListQuery) -> Vec<T> {
    let needle = query.q.as_deref().map(str::trim).unwrap_or_default();

    let mut matched: Vec<T> = items
        .into_iter()
        .filter(|item| {
            needle.is_empty()
                || item
                    .search_fields()
                    .into_iter()
                    .any(|field| contains_ci(field, needle))
        })
        .filter(|item| facet_matches(item.status_facet(), query.status.as_deref()))
        .filter(|item| facet_matches(item.category_facet(), query.category.as_deref()))
        .collect();

    let order = query.order.unwrap_or_default();
    let requested = query.sort.as_deref().unwrap_or_else(|| T::default_sort());
    // A field is sortable when any item has a key for it; optional fields
    // leave gaps that sort last.
    let field = if matched.iter().any(|item| item.sort_key(requested).is_some()) {
        requested
    } else {
        T::default_sort()
    };

    matched.sort_by(|a, b| match (a.sort_key(field), b.sort_key(field)) {
        (Some(a), Some(b)) => match order {
            SortOrder::Asc => a.compare(&b),
            SortOrder::Desc => b.compare(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    matched
}

/// Narrow, order and page `items` according to `query`.
pub fn apply<T: Listable>(items: Vec<T>, query: &ListQuery) -> Page<T> {
    let matched = select(items, query);
    let total = matched.len();
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let page = query.page.unwrap_or(1).max(1);
    let skip = (page - 1).saturating_mul(per_page);
    let items = matched.into_iter().skip(skip).take(per_page).collect();

    Page {
        items,
        total,
        page,
        per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        status: &'static str,
        price: f64,
        rank: Option<f64>,
    }

    impl Listable for Row {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.name]
        }

        fn status_facet(&self) -> Option<&str> {
            Some(self.status)
        }

        fn sort_key(&self, field: &str) -> Option<SortKey> {
            match field {
                "name" => Some(SortKey::text(self.name)),
                "price" => Some(SortKey::Number(self.price)),
                "rank" => self.rank.map(SortKey::Number),
                _ => None,
            }
        }

        fn default_sort() -> &'static str {
            "name"
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Bali Escape", status: "new", price: 900.0, rank: None },
            Row { name: "Dubai Nights", status: "contacted", price: 1400.0, rank: Some(2.0) },
            Row { name: "Bali Luxe", status: "new", price: 2600.0, rank: None },
            Row { name: "Kerala Backwaters", status: "converted", price: 600.0, rank: Some(1.0) },
        ]
    }

    #[test]
    fn search_and_facet_combine() {
        let query = ListQuery {
            q: Some("bali".to_string()),
            status: Some("NEW".to_string()),
            ..Default::default()
        };
        let page = apply(rows(), &query);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn sorts_by_number_ascending() {
        let query = ListQuery {
            sort: Some("price".to_string()),
            order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let names: Vec<_> = apply(rows(), &query).items.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["Kerala Backwaters", "Bali Escape", "Dubai Nights", "Bali Luxe"]
        );
    }

    #[test]
    fn unknown_sort_field_falls_back_to_default() {
        let query = ListQuery {
            sort: Some("nonsense".to_string()),
            order: Some(SortOrder::Asc),
            ..Default::default()
        };
        assert_eq!(apply(rows(), &query).items[0].name, "Bali Escape");
    }

    #[test]
    fn pages_are_one_based_and_clamped() {
        let query = ListQuery {
            page: Some(2),
            per_page: Some(3),
            ..Default::default()
        };
        let page = apply(rows(), &query);
        assert_eq!(page.total, 4);
        assert_eq!(page.items.len(), 1);

        let huge = ListQuery {
            per_page: Some(10_000),
            ..Default::default()
        };
        assert_eq!(apply(rows(), &huge).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn optional_sort_field_keeps_its_order_when_the_first_item_lacks_it() {
        let query = ListQuery {
            sort: Some("rank".to_string()),
            order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let names: Vec<_> = apply(rows(), &query).items.iter().map(|r| r.name).collect();
        assert_eq!(names[..2], ["Kerala Backwaters", "Dubai Nights"]);

        let descending = ListQuery {
            order: Some(SortOrder::Desc),
            ..query
        };
        let names: Vec<_> = apply(rows(), &descending).items.iter().map(|r| r.name).collect();
        assert_eq!(names[..2], ["Dubai Nights", "Kerala Backwaters"]);
    }

    #[test]
    fn huge_page_numbers_yield_an_empty_page() {
        let query = ListQuery {
            page: Some(usize::MAX),
            per_page: Some(MAX_PER_PAGE),
            ..Default::default()
        };
        let page = apply(rows(), &query);
        assert_eq!(page.total, 4);
        assert!(page.items.is_empty());
    }

    #[test]
    fn facet_all_matches_everything() {
        let query = ListQuery {
            status: Some("all".to_string()),
            ..Default::default()
        };
        assert_eq!(apply(rows(), &query).total, 4);
    }
}
