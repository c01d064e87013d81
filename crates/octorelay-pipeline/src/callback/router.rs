// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dot-segmented callback token routing.
//!
//! A pattern such as `webhook.:subscription.refresh` is split on `.`;
//! `:name` segments capture the token segment at the same position. A
//! pattern never matches a shorter token, and an exact pattern only matches a
//! token of the same length. Every matching route runs, concurrently, each
//! seeing only its own captures.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::warn;

use octorelay_core::RelayError;
use octorelay_queue::events::CallbackQuery;

/// Values bound by `:name` segments.
pub type Captures = HashMap<String, String>;

#[async_trait]
pub trait RouteHandler: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn handle(&self, query: &CallbackQuery, captures: Captures) -> Result<(), RelayError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
    exact: bool,
}

impl Pattern {
    pub fn new(pattern: &str, exact: bool) -> Self {
        let segments = pattern
            .split('.')
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Capture(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        Self { segments, exact }
    }

    /// Matches an already split token.
    pub fn matches(&self, token: &[&str]) -> Option<Captures> {
        if self.segments.len() > token.len() {
            return None;
        }
        if self.exact && self.segments.len() != token.len() {
            return None;
        }
        let mut captures = Captures::new();
        for (segment, value) in self.segments.iter().zip(token) {
            match segment {
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
                Segment::Capture(name) => {
                    captures.insert(name.clone(), (*value).to_string());
                }
            }
        }
        Some(captures)
    }
}

struct Route {
    pattern: Pattern,
    handler: Arc<dyn RouteHandler>,
}

/// Route table, built once at startup.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, pattern: &str, exact: bool, handler: Arc<dyn RouteHandler>) -> Self {
        self.routes.push(Route {
            pattern: Pattern::new(pattern, exact),
            handler,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Runs every route matching `query.data`. Returns how many matched; the
    /// first route error is returned after all routes have finished.
    pub async fn dispatch(&self, query: &CallbackQuery) -> Result<usize, RelayError> {
        let token: Vec<&str> = query.data.split('.').collect();
        let matched: Vec<_> = self
            .routes
            .iter()
            .filter_map(|route| {
                route
                    .pattern
                    .matches(&token)
                    .map(|captures| route.handler.handle(query, captures))
            })
            .collect();
        let count = matched.len();

        let mut first_error = None;
        for (index, result) in join_all(matched).await.into_iter().enumerate() {
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    warn!(route = index, error = %e, "additional callback route error");
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn split(token: &str) -> Vec<&str> {
        token.split('.').collect()
    }

    #[test]
    fn literal_and_capture_segments() {
        let pattern = Pattern::new("webhook.:subscription.refresh", true);
        let captures = pattern.matches(&split("webhook.42.refresh")).unwrap();
        assert_eq!(captures["subscription"], "42");
        assert!(pattern.matches(&split("webhook.42.settings")).is_none());
        assert!(pattern.matches(&split("webhook.42.refresh.extra")).is_none());
    }

    #[test]
    fn prefix_pattern_matches_longer_tokens() {
        let pattern = Pattern::new("webhook.:subscription", false);
        let captures = pattern
            .matches(&split("webhook.7.settings.track_pushes.on"))
            .unwrap();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures["subscription"], "7");
    }

    #[test]
    fn longer_pattern_never_matches() {
        let pattern = Pattern::new("webhook.:subscription.refresh", false);
        assert!(pattern.matches(&split("webhook.7")).is_none());
    }

    fn token_strategy() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[a-z0-9_]{1,8}", 1..6)
    }

    proptest! {
        #[test]
        fn prefix_with_captures_binds_token_values(
            token in token_strategy(),
            mask in proptest::collection::vec(any::<bool>(), 6),
            cut in 0usize..6,
        ) {
            let len = 1 + cut % token.len();
            let pattern: Vec<String> = token[..len]
                .iter()
                .enumerate()
                .map(|(i, seg)| if mask[i] { format!(":v{i}") } else { seg.clone() })
                .collect();
            let refs: Vec<&str> = token.iter().map(String::as_str).collect();

            let captures = Pattern::new(&pattern.join("."), false).matches(&refs);
            prop_assert!(captures.is_some());
            let captures = captures.unwrap();
            for i in 0..len {
                if mask[i] {
                    prop_assert_eq!(&captures[&format!("v{i}")], &token[i]);
                }
            }

            let exact = Pattern::new(&pattern.join("."), true).matches(&refs);
            prop_assert_eq!(exact.is_some(), len == token.len());
        }

        #[test]
        fn patterns_longer_than_the_token_never_match(
            token in token_strategy(),
            extra in "[a-z]{1,4}",
        ) {
            let refs: Vec<&str> = token.iter().map(String::as_str).collect();
            let pattern = format!("{}.{}", token.join("."), extra);
            prop_assert!(Pattern::new(&pattern, false).matches(&refs).is_none());
        }
    }
}
