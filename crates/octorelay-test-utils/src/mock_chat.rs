// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat API for deterministic testing.
//!
//! `MockChat` keeps the messages it "sent", reports `NotModified` when an
//! edit would not change a message, and `NotFound` for messages it never sent
//! or that a test removed with [`MockChat::forget_message`]. Failures can be
//! queued per operation, and sends can be held behind a gate to stage races.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use octorelay_core::types::{ChatId, ChatMember, ChatMessageId, InlineKeyboard};
use octorelay_core::{ChatApi, ChatError};

/// One recorded chat API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    Send {
        chat_id: ChatId,
        message_id: ChatMessageId,
        text: String,
    },
    Edit {
        chat_id: ChatId,
        message_id: ChatMessageId,
        text: String,
    },
    EditMarkup {
        chat_id: ChatId,
        message_id: ChatMessageId,
    },
    Delete {
        chat_id: ChatId,
        message_id: ChatMessageId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Shown {
    text: String,
    keyboard: Option<InlineKeyboard>,
}

#[derive(Default)]
struct State {
    next_id: i32,
    messages: HashMap<(ChatId, ChatMessageId), Shown>,
    calls: Vec<ChatCall>,
    send_failures: VecDeque<ChatError>,
    edit_failures: VecDeque<ChatError>,
    admins: HashMap<ChatId, HashSet<i64>>,
}

/// A mock chat API for tests.
pub struct MockChat {
    state: Arc<Mutex<State>>,
    send_gate: std::sync::Mutex<Option<Arc<Semaphore>>>,
    sends_started: AtomicUsize,
}

impl MockChat {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_id: 1,
                ..State::default()
            })),
            send_gate: std::sync::Mutex::new(None),
            sends_started: AtomicUsize::new(0),
        }
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<ChatCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn sent(&self) -> Vec<ChatCall> {
        self.calls()
            .await
            .into_iter()
            .filter(|c| matches!(c, ChatCall::Send { .. }))
            .collect()
    }

    pub async fn edits(&self) -> Vec<ChatCall> {
        self.calls()
            .await
            .into_iter()
            .filter(|c| matches!(c, ChatCall::Edit { .. }))
            .collect()
    }

    /// Current text of a message, if it exists.
    pub async fn text_of(&self, chat_id: ChatId, message_id: ChatMessageId) -> Option<String> {
        self.state
            .lock()
            .await
            .messages
            .get(&(chat_id, message_id))
            .map(|m| m.text.clone())
    }

    /// Current keyboard of a message, if it exists and has one.
    pub async fn keyboard_of(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
    ) -> Option<InlineKeyboard> {
        self.state
            .lock()
            .await
            .messages
            .get(&(chat_id, message_id))
            .and_then(|m| m.keyboard.clone())
    }

    /// Simulates the message being deleted in the chat.
    pub async fn forget_message(&self, chat_id: ChatId, message_id: ChatMessageId) {
        self.state.lock().await.messages.remove(&(chat_id, message_id));
    }

    /// The next send fails with `error` (queued, FIFO).
    pub async fn fail_next_send(&self, error: ChatError) {
        self.state.lock().await.send_failures.push_back(error);
    }

    /// The next edit fails with `error` (queued, FIFO).
    pub async fn fail_next_edit(&self, error: ChatError) {
        self.state.lock().await.edit_failures.push_back(error);
    }

    pub async fn set_admins(&self, chat_id: ChatId, user_ids: &[i64]) {
        self.state
            .lock()
            .await
            .admins
            .insert(chat_id, user_ids.iter().copied().collect());
    }

    /// Makes every later send wait for a permit on the returned semaphore.
    pub fn hold_sends(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.send_gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(gate.clone());
        gate
    }

    /// Number of `send_message` calls that have started (including held ones).
    pub fn sends_started(&self) -> usize {
        self.sends_started.load(Ordering::SeqCst)
    }
}

impl Default for MockChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatApi for MockChat {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<ChatMessageId, ChatError> {
        self.sends_started.fetch_add(1, Ordering::SeqCst);
        let gate = self.send_gate.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|e| ChatError::api(e.to_string()))?
                .forget();
        }

        let mut state = self.state.lock().await;
        if let Some(error) = state.send_failures.pop_front() {
            return Err(error);
        }
        let message_id = ChatMessageId(state.next_id);
        state.next_id += 1;
        state.messages.insert(
            (chat_id, message_id),
            Shown {
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
        );
        state.calls.push(ChatCall::Send {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChatError> {
        let mut state = self.state.lock().await;
        state.calls.push(ChatCall::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        if let Some(error) = state.edit_failures.pop_front() {
            return Err(error);
        }
        let updated = Shown {
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        };
        match state.messages.get_mut(&(chat_id, message_id)) {
            None => Err(ChatError::NotFound("message to edit not found".into())),
            Some(shown) if *shown == updated => Err(ChatError::NotModified),
            Some(shown) => {
                *shown = updated;
                Ok(())
            }
        }
    }

    async fn edit_message_reply_markup(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChatError> {
        let mut state = self.state.lock().await;
        state.calls.push(ChatCall::EditMarkup {
            chat_id,
            message_id,
        });
        match state.messages.get_mut(&(chat_id, message_id)) {
            None => Err(ChatError::NotFound("message to edit not found".into())),
            Some(shown) if shown.keyboard.as_ref() == keyboard => Err(ChatError::NotModified),
            Some(shown) => {
                shown.keyboard = keyboard.cloned();
                Ok(())
            }
        }
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
    ) -> Result<(), ChatError> {
        let mut state = self.state.lock().await;
        state.calls.push(ChatCall::Delete {
            chat_id,
            message_id,
        });
        match state.messages.remove(&(chat_id, message_id)) {
            Some(_) => Ok(()),
            None => Err(ChatError::NotFound("message to delete not found".into())),
        }
    }

    async fn get_chat_administrators(&self, chat_id: ChatId) -> Result<Vec<ChatMember>, ChatError> {
        let state = self.state.lock().await;
        Ok(state
            .admins
            .get(&chat_id)
            .map(|ids| {
                ids.iter()
                    .map(|&user_id| ChatMember {
                        user_id,
                        privileged: true,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_chat_member(&self, chat_id: ChatId, user_id: i64) -> Result<ChatMember, ChatError> {
        let state = self.state.lock().await;
        let privileged = state
            .admins
            .get(&chat_id)
            .is_some_and(|ids| ids.contains(&user_id));
        Ok(ChatMember {
            user_id,
            privileged,
        })
    }
}
