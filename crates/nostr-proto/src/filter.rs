//! REQ filters and matching against events.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// A single NIP-01 filter. Every populated field is a conjunction; absent
/// fields impose no constraint. Tag filters (`#e`, `#p`, ...) are a NIP-01
/// extension this relay does not implement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Tests whether `event` satisfies every populated constraint in `filter`.
///
/// `ids`/`authors` are matched as full-length lowercase-hex equality, not
/// hex-prefix membership: prefix matching is a NIP-01 extension this relay
/// does not implement (see the note on supplemented behavior in the design
/// notes for this crate).
pub fn matches(event: &Event, filter: &Filter) -> bool {
    if let Some(ids) = &filter.ids {
        if ids.is_empty() || !ids.iter().any(|id| id == &event.id) {
            return false;
        }
    }
    if let Some(authors) = &filter.authors {
        if authors.is_empty() || !authors.iter().any(|a| a == &event.pubkey) {
            return false;
        }
    }
    if let Some(kinds) = &filter.kinds {
        if kinds.is_empty() || !kinds.contains(&event.kind) {
            return false;
        }
    }
    if let Some(since) = filter.since {
        if event.created_at < since {
            return false;
        }
    }
    if let Some(until) = filter.until {
        if event.created_at > until {
            return false;
        }
    }
    true
}

/// A subscription is satisfied by an event if ANY of its filters matches.
pub fn matches_any(event: &Event, filters: &[Filter]) -> bool {
    filters.iter().any(|f| matches(event, f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, pubkey: &str, kind: u64, created_at: i64) -> Event {
        Event {
            id: id.to_owned(),
            pubkey: pubkey.to_owned(),
            created_at,
            kind,
            tags: vec![],
            content: String::new(),
            sig: "0".repeat(128),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = Filter::default();
        let e = event("abc", "def", 1, 100);
        assert!(matches(&e, &f));
    }

    #[test]
    fn kinds_is_a_disjunction_within_the_field() {
        let f = Filter {
            kinds: Some(vec![1, 7]),
            ..Default::default()
        };
        assert!(matches(&event("a", "b", 1, 0), &f));
        assert!(matches(&event("a", "b", 7, 0), &f));
        assert!(!matches(&event("a", "b", 2, 0), &f));
    }

    #[test]
    fn empty_kinds_set_matches_nothing() {
        let f = Filter {
            kinds: Some(vec![]),
            ..Default::default()
        };
        assert!(!matches(&event("a", "b", 1, 0), &f));
    }

    #[test]
    fn since_and_until_are_inclusive_bounds() {
        let f = Filter {
            since: Some(100),
            until: Some(200),
            ..Default::default()
        };
        assert!(matches(&event("a", "b", 1, 100), &f));
        assert!(matches(&event("a", "b", 1, 200), &f));
        assert!(!matches(&event("a", "b", 1, 99), &f));
        assert!(!matches(&event("a", "b", 1, 201), &f));
    }

    #[test]
    fn authors_and_ids_require_exact_full_length_match_not_a_prefix() {
        let f = Filter {
            authors: Some(vec!["dead".to_owned()]),
            ..Default::default()
        };
        assert!(!matches(&event("a", "deadbeef", 1, 0), &f));
        assert!(matches(&event("a", "dead", 1, 0), &f));
    }

    #[test]
    fn matches_any_is_a_disjunction_of_filters() {
        let narrow = Filter {
            kinds: Some(vec![7]),
            ..Default::default()
        };
        let wide = Filter {
            kinds: Some(vec![1]),
            ..Default::default()
        };
        let e = event("a", "b", 1, 0);
        assert!(matches_any(&e, &[narrow, wide]));
    }
}
