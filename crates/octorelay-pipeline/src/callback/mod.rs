// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline keyboard callbacks.

pub mod router;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;

use octorelay_core::RelayError;
use octorelay_queue::events::CallbackQuery;
use octorelay_queue::{EventHandler, Outcome};

pub use router::{Captures, Pattern, RouteHandler, Router};

/// Consumer of the Telegram events queue.
pub struct CallbackHandler {
    router: Arc<Router>,
}

impl CallbackHandler {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl EventHandler for CallbackHandler {
    type Event = CallbackQuery;

    fn name(&self) -> &str {
        "callback"
    }

    async fn handle(&self, query: CallbackQuery) -> Result<Outcome, RelayError> {
        match self.router.dispatch(&query).await? {
            0 => Ok(Outcome::skip(format!("no route for {}", query.data))),
            _ => Ok(Outcome::Done),
        }
    }
}
