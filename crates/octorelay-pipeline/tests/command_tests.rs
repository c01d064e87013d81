// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat commands, replies going through the `messages` queue.

mod common;

use octorelay_core::types::{ChatId, TrackedKind};
use octorelay_core::{RelayStore, queues};
use octorelay_pipeline::commands::CommandHandler;
use octorelay_pipeline::render::{Renderer, SettingsFormatter};
use octorelay_queue::events::{ChatCommand, OutgoingMessage, RenderRequest};
use octorelay_queue::{EventHandler, Outcome};
use octorelay_test_utils::{ChatCall, TestHarness};

use common::setup;

fn command(chat_id: i64, user_id: i64, private: bool, text: &str) -> ChatCommand {
    ChatCommand {
        chat_id: ChatId(chat_id),
        user_id,
        private,
        text: text.to_string(),
    }
}

fn replies(h: &TestHarness) -> Vec<String> {
    h.pending_events::<OutgoingMessage>(queues::MESSAGES)
        .into_iter()
        .map(|m| m.text)
        .collect()
}

#[tokio::test]
async fn subscribe_saves_and_explains_the_webhook() {
    let (h, ctx) = setup().await;
    let handler = CommandHandler::new(ctx);

    let outcome = handler
        .handle(command(10, 7, true, "/subscribe Octo/App --secret=hunter2"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Done);

    let sub = h
        .store
        .find_subscription(ChatId(10), "octo/app")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sub.secret, "hunter2");

    let replies = replies(&h);
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("`http://localhost:8080/webhooks/github`"));
    assert!(replies[0].contains("`hunter2`"));
    assert_eq!(
        h.pending_events::<RenderRequest>(queues::WEBHOOK_SETTINGS_SHOW).len(),
        1
    );
}

#[tokio::test]
async fn subscribe_generates_a_secret_when_none_is_given() {
    let (h, ctx) = setup().await;
    CommandHandler::new(ctx)
        .handle(command(10, 7, true, "/subscribe octo/app"))
        .await
        .unwrap();
    let sub = h
        .store
        .find_subscription(ChatId(10), "octo/app")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sub.secret.len(), 32);
}

#[tokio::test]
async fn group_members_cannot_subscribe() {
    let (h, ctx) = setup().await;
    let handler = CommandHandler::new(ctx);

    handler
        .handle(command(-100, 7, false, "/subscribe octo/app"))
        .await
        .unwrap();
    assert!(h.store.subscriptions_for_chat(ChatId(-100)).await.unwrap().is_empty());
    assert!(replies(&h)[0].contains("only chat administrators"));

    h.chat.set_admins(ChatId(-100), &[7]).await;
    handler
        .handle(command(-100, 7, false, "/subscribe octo/app"))
        .await
        .unwrap();
    assert_eq!(h.store.subscriptions_for_chat(ChatId(-100)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn group_members_cannot_open_settings() {
    let (h, ctx) = setup().await;
    let handler = CommandHandler::new(ctx);
    h.subscribe(-100, "octo/app", "s").await.unwrap();

    handler
        .handle(command(-100, 7, false, "/settings octo/app"))
        .await
        .unwrap();
    assert!(replies(&h)[0].contains("only chat administrators"));
    assert!(
        h.pending_events::<RenderRequest>(queues::WEBHOOK_SETTINGS_SHOW)
            .is_empty()
    );

    h.chat.set_admins(ChatId(-100), &[7]).await;
    handler
        .handle(command(-100, 7, false, "/settings octo/app"))
        .await
        .unwrap();
    assert_eq!(
        h.pending_events::<RenderRequest>(queues::WEBHOOK_SETTINGS_SHOW).len(),
        1
    );
}

#[tokio::test]
async fn bad_arguments_are_answered_in_chat() {
    let (h, ctx) = setup().await;
    let handler = CommandHandler::new(ctx);

    handler.handle(command(10, 7, true, "/subscribe")).await.unwrap();
    handler.handle(command(10, 7, true, "/subscribe octo")).await.unwrap();
    handler.handle(command(10, 7, true, "/unsubscribe octo/app")).await.unwrap();
    handler.handle(command(10, 7, true, "/frobnicate")).await.unwrap();

    let replies = replies(&h);
    assert_eq!(replies.len(), 4);
    assert!(replies[0].contains("usage: /subscribe"));
    assert!(replies[1].contains("octo is not a repository"));
    assert!(replies[2].contains("not subscribed to octo/app"));
    assert!(replies[3].contains("unknown command /frobnicate"));
}

#[tokio::test]
async fn list_shows_subscriptions() {
    let (h, ctx) = setup().await;
    let handler = CommandHandler::new(ctx);

    handler.handle(command(10, 7, true, "/list")).await.unwrap();
    h.subscribe(10, "octo/app", "s").await.unwrap();
    h.subscribe(10, "octo/lib", "s").await.unwrap();
    handler.handle(command(10, 7, true, "/list")).await.unwrap();

    let replies = replies(&h);
    assert!(replies[0].contains("no subscriptions yet"));
    assert!(replies[1].contains("`octo/app`"));
    assert!(replies[1].contains("`octo/lib`"));
}

#[tokio::test]
async fn unsubscribe_deletes_the_settings_message() {
    let (h, ctx) = setup().await;
    let sub = h.subscribe(10, "octo/app", "s").await.unwrap();
    let settings = ctx.settings_object(&sub).await.unwrap();
    Renderer::new(ctx.clone(), SettingsFormatter::new(ctx.settings.webhook_url()))
        .render(settings.id)
        .await
        .unwrap();
    let message_id = h
        .store
        .message_identity(settings.id)
        .await
        .unwrap()
        .unwrap()
        .chat_message_id
        .unwrap();

    CommandHandler::new(ctx)
        .handle(command(10, 7, true, "/unsubscribe octo/app"))
        .await
        .unwrap();

    assert!(h.store.subscription(sub.id).await.unwrap().is_none());
    assert!(
        h.store
            .find_tracked(sub.id, TrackedKind::Settings, &sub.id.to_string())
            .await
            .unwrap()
            .is_none()
    );
    assert!(h.chat.calls().await.contains(&ChatCall::Delete {
        chat_id: ChatId(10),
        message_id,
    }));
}

#[tokio::test]
async fn plain_text_is_skipped() {
    let (_h, ctx) = setup().await;
    let outcome = CommandHandler::new(ctx)
        .handle(command(10, 7, true, "hello there"))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Skip(_)));
}
