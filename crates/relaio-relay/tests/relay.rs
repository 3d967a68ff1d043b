// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end relay pipeline tests against mock transport and publisher.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use relaio_cache::MessageCache;
use relaio_core::RelaioError;
use relaio_core::traits::publisher::ADMIN_ROOM;
use relaio_core::types::{ExternalUpdate, MessageKind, Origin, RelayOutcome, ThreadId};
use relaio_limiter::RateLimiter;
use relaio_relay::{BridgeHandle, DeliveryEngine, Relay, spawn_report_notifier};
use relaio_test_utils::{MockPublisher, MockTransport, test_codec, test_store};

const ADMIN_CHAT: &str = "424242";

struct Fixture {
    relay: Relay,
    publisher: Arc<MockPublisher>,
    transport: Arc<MockTransport>,
    cache: Arc<MessageCache>,
    _dir: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    fixture_with_attempts(3).await
}

async fn fixture_with_attempts(max_attempts: u32) -> Fixture {
    let (store, dir) = test_store().await;
    let codec = test_codec();
    let cache = Arc::new(MessageCache::new(100, Duration::from_secs(300)));
    let limiter = Arc::new(RateLimiter::new());
    let publisher = Arc::new(MockPublisher::new());
    let transport = Arc::new(MockTransport::new());

    // Millisecond base delay keeps retry tests fast.
    let engine = Arc::new(DeliveryEngine::new(
        transport.clone(),
        store.clone(),
        Duration::from_millis(1),
        max_attempts,
    ));
    let (report_tx, report_rx) = mpsc::channel(16);
    spawn_report_notifier(report_rx, publisher.clone());

    let relay = Relay::new(
        store,
        codec,
        cache.clone(),
        limiter,
        publisher.clone(),
    )
    .with_bridge(BridgeHandle {
        engine,
        admin_chat_id: ADMIN_CHAT.to_string(),
        report_tx,
    });

    Fixture {
        relay,
        publisher,
        transport,
        cache,
        _dir: dir,
    }
}

/// Poll until `check` passes or the backoff-padded deadline elapses.
async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached within timeout");
}

#[tokio::test]
async fn visitor_message_on_new_session_reaches_admins_and_bridge() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(Some("Ayşe")).await.unwrap();
    let view = fx
        .relay
        .on_visitor_message("1.2.3.4", &thread.id, MessageKind::Text, "Hello", "")
        .await
        .unwrap();

    assert_eq!(view.origin, Origin::Visitor);
    assert_eq!(view.text, "Hello");

    // Persisted encrypted: the raw record must not contain the plaintext.
    let records = fx
        .relay
        .store()
        .messages_for_thread(&thread.id, None)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_ne!(records[0].content, "Hello");
    assert!(!records[0].content.is_empty());

    // Admin broadcast got a plaintext-decrypted copy plus a preview.
    let admin_events = fx.publisher.events_for_room(ADMIN_ROOM).await;
    let msg_event = admin_events
        .iter()
        .find(|e| e.event == "message_from_visitor")
        .expect("message_from_visitor emitted");
    assert_eq!(msg_event.payload["data"]["message"]["text"], "Hello");
    assert!(
        admin_events
            .iter()
            .any(|e| e.event == "new_message_notification")
    );

    // Bridged text carries the embedded thread tag.
    let transport = fx.transport.clone();
    wait_for(|| {
        let transport = transport.clone();
        async move { transport.sent_count().await == 1 }
    })
    .await;
    let sent = fx.transport.sent().await;
    assert_eq!(sent[0].chat_id, ADMIN_CHAT);
    assert!(sent[0].text.contains("Hello"));
    assert!(sent[0].text.contains(&format!("#thread:{}", thread.id)));
}

#[tokio::test]
async fn external_reply_attaches_to_linked_thread() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(None).await.unwrap();
    // A previous outbound send recorded this bridge link.
    fx.relay
        .store()
        .insert_bridge_link(&thread.id, ADMIN_CHAT, 900)
        .await
        .unwrap();

    let update = ExternalUpdate {
        chat_id: ADMIN_CHAT.to_string(),
        message_id: 901,
        reply_to_message_id: Some(900),
        kind: MessageKind::Text,
        text: "replying to you".to_string(),
        file_locator: String::new(),
    };
    let outcome = fx.relay.on_external_update(&update).await.unwrap();

    let RelayOutcome::Delivered(view) = outcome else {
        panic!("expected delivery");
    };
    assert_eq!(view.thread_id, thread.id);
    assert_eq!(view.origin, Origin::Bridge);

    // No second thread was created.
    assert_eq!(fx.relay.store().list_threads().await.unwrap().len(), 1);
}

#[tokio::test]
async fn external_thread_tag_resolves_without_reply_reference() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(None).await.unwrap();
    let update = ExternalUpdate {
        chat_id: ADMIN_CHAT.to_string(),
        message_id: 77,
        reply_to_message_id: None,
        kind: MessageKind::Text,
        text: format!("routed manually #thread:{}", thread.id),
        file_locator: String::new(),
    };

    let outcome = fx.relay.on_external_update(&update).await.unwrap();
    let RelayOutcome::Delivered(view) = outcome else {
        panic!("expected delivery");
    };
    assert_eq!(view.thread_id, thread.id);
    assert_eq!(fx.relay.store().list_threads().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unlinked_external_message_creates_named_thread() {
    let fx = fixture().await;

    let update = ExternalUpdate {
        chat_id: "555".to_string(),
        message_id: 1,
        reply_to_message_id: None,
        kind: MessageKind::Text,
        text: "hi from telegram".to_string(),
        file_locator: String::new(),
    };
    let outcome = fx.relay.on_external_update(&update).await.unwrap();
    let RelayOutcome::Delivered(view) = outcome else {
        panic!("expected delivery");
    };

    let thread = fx
        .relay
        .store()
        .get_thread(&view.thread_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(thread.display_name, "Telegram-555");

    // Delivered to both the admin room and the thread room.
    assert_eq!(
        fx.publisher.count_named("message_from_bridge").await,
        2
    );
}

#[tokio::test]
async fn redelivered_external_update_is_a_complete_noop() {
    let fx = fixture().await;

    let update = ExternalUpdate {
        chat_id: "888".to_string(),
        message_id: 13,
        reply_to_message_id: None,
        kind: MessageKind::Text,
        text: "delivered twice".to_string(),
        file_locator: String::new(),
    };

    let first = fx.relay.on_external_update(&update).await.unwrap();
    assert!(!first.is_duplicate());

    fx.publisher.clear().await;
    let second = fx.relay.on_external_update(&update).await.unwrap();
    assert!(second.is_duplicate());

    // No new message, no new thread, exactly one dedup record, no fan-out.
    assert_eq!(fx.relay.store().count_messages().await.unwrap(), 1);
    assert_eq!(fx.relay.store().list_threads().await.unwrap().len(), 1);
    assert_eq!(fx.relay.store().dedup_count("888", 13).await.unwrap(), 1);
    assert!(fx.publisher.events().await.is_empty());
}

#[tokio::test]
async fn duplicate_of_unresolved_update_creates_no_thread() {
    let fx = fixture().await;

    let update = ExternalUpdate {
        chat_id: "999".to_string(),
        message_id: 5,
        reply_to_message_id: None,
        kind: MessageKind::Text,
        text: "first".to_string(),
        file_locator: String::new(),
    };
    fx.relay.on_external_update(&update).await.unwrap();

    // Replay with different text: still the same external identity.
    let replay = ExternalUpdate {
        text: "redelivered with new body".to_string(),
        ..update
    };
    let outcome = fx.relay.on_external_update(&replay).await.unwrap();
    assert!(outcome.is_duplicate());
    assert_eq!(fx.relay.store().list_threads().await.unwrap().len(), 1);
}

#[tokio::test]
async fn visitor_message_to_unknown_thread_is_rejected() {
    let fx = fixture().await;

    let missing = ThreadId::generate();
    let result = fx
        .relay
        .on_visitor_message("1.2.3.4", &missing, MessageKind::Text, "hello?", "")
        .await;

    assert!(matches!(result, Err(RelaioError::ThreadNotFound(_))));
    assert_eq!(fx.relay.store().count_messages().await.unwrap(), 0);
    assert!(fx.relay.store().list_threads().await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_message_to_unknown_thread_is_rejected() {
    let fx = fixture().await;

    let missing = ThreadId::generate();
    let result = fx
        .relay
        .on_admin_message("admin-1", &missing, MessageKind::Text, "anyone there?", "")
        .await;

    assert!(matches!(result, Err(RelaioError::ThreadNotFound(_))));
    assert_eq!(fx.relay.store().count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn admin_message_reaches_thread_and_echoes_to_other_admins() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(None).await.unwrap();
    fx.publisher.clear().await;

    fx.relay
        .on_admin_message("admin-1", &thread.id, MessageKind::Text, "how can I help?", "")
        .await
        .unwrap();

    let thread_events = fx.publisher.events_for_room(thread.id.as_str()).await;
    assert_eq!(thread_events.len(), 1);
    assert_eq!(thread_events[0].event, "message_from_admin");
    assert_eq!(
        thread_events[0].payload["data"]["message"]["text"],
        "how can I help?"
    );

    let admin_events = fx.publisher.events_for_room(ADMIN_ROOM).await;
    assert_eq!(admin_events.len(), 1);
    assert_eq!(admin_events[0].excluded.as_deref(), Some("admin-1"));

    // Admin messages are never bridged.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fx.transport.sent_count().await, 0);
}

#[tokio::test]
async fn twenty_first_message_in_window_is_rate_limited() {
    let fx = fixture().await;
    let thread = fx.relay.join_visitor(None).await.unwrap();

    for i in 0..20 {
        fx.relay
            .on_visitor_message("9.9.9.9", &thread.id, MessageKind::Text, &format!("m{i}"), "")
            .await
            .unwrap();
    }

    let result = fx
        .relay
        .on_visitor_message("9.9.9.9", &thread.id, MessageKind::Text, "one too many", "")
        .await;
    match result {
        Err(RelaioError::RateLimited { retry_after_secs }) => {
            assert!(retry_after_secs <= 60);
        }
        other => panic!("expected rate limit rejection, got {other:?}"),
    }

    // The rejected message was not persisted.
    assert_eq!(fx.relay.store().count_messages().await.unwrap(), 20);
}

#[tokio::test]
async fn blank_text_message_is_rejected_at_the_boundary() {
    let fx = fixture().await;
    let thread = fx.relay.join_visitor(None).await.unwrap();
    fx.publisher.clear().await;

    let result = fx
        .relay
        .on_visitor_message("1.2.3.4", &thread.id, MessageKind::Text, "   ", "")
        .await;

    assert!(matches!(result, Err(RelaioError::Validation(_))));
    assert_eq!(fx.relay.store().count_messages().await.unwrap(), 0);
    assert!(fx.publisher.events().await.is_empty());
}

#[tokio::test]
async fn media_message_without_locator_is_rejected() {
    let fx = fixture().await;
    let thread = fx.relay.join_visitor(None).await.unwrap();

    let result = fx
        .relay
        .on_admin_message("admin-1", &thread.id, MessageKind::Image, "caption", "")
        .await;

    assert!(matches!(result, Err(RelaioError::Validation(_))));
    assert_eq!(fx.relay.store().count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn image_messages_spend_the_upload_budget() {
    let fx = fixture().await;
    let thread = fx.relay.join_visitor(None).await.unwrap();

    // upload-image allows 5 per window.
    for i in 0..5 {
        fx.relay
            .on_visitor_message(
                "7.7.7.7",
                &thread.id,
                MessageKind::Image,
                "",
                &format!("/uploads/images/{i}.jpg"),
            )
            .await
            .unwrap();
    }
    let sixth = fx
        .relay
        .on_visitor_message(
            "7.7.7.7",
            &thread.id,
            MessageKind::Image,
            "",
            "/uploads/images/5.jpg",
        )
        .await;
    assert!(matches!(sixth, Err(RelaioError::RateLimited { .. })));

    // The text budget for the same actor is untouched.
    fx.relay
        .on_visitor_message("7.7.7.7", &thread.id, MessageKind::Text, "still fine", "")
        .await
        .unwrap();
}

#[tokio::test]
async fn exhausted_delivery_notifies_thread_but_message_survives() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(None).await.unwrap();
    fx.transport.queue_failures(3).await;

    fx.relay
        .on_visitor_message("1.2.3.4", &thread.id, MessageKind::Text, "will not bridge", "")
        .await
        .unwrap();

    let publisher = fx.publisher.clone();
    let room = thread.id.to_string();
    wait_for(|| {
        let publisher = publisher.clone();
        let room = room.clone();
        async move {
            publisher
                .events_for_room(&room)
                .await
                .iter()
                .any(|e| e.event == "bridge_delivery_failed")
        }
    })
    .await;

    // The message is still persisted and readable.
    let page = fx.relay.thread_messages(&thread.id, 50).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].text, "will not bridge");
    assert_eq!(fx.transport.sent_count().await, 0);
}

#[tokio::test]
async fn retry_recovers_after_transient_failures() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(None).await.unwrap();
    fx.transport.queue_failures(2).await;

    fx.relay
        .on_visitor_message("1.2.3.4", &thread.id, MessageKind::Text, "third time lucky", "")
        .await
        .unwrap();

    let transport = fx.transport.clone();
    wait_for(|| {
        let transport = transport.clone();
        async move { transport.sent_count().await == 1 }
    })
    .await;

    // Success recorded a bridge link for future reply resolution.
    let sent_ref_thread = fx
        .relay
        .store()
        .thread_for_bridge_message(1)
        .await
        .unwrap();
    assert_eq!(sent_ref_thread, Some(thread.id));
}

#[tokio::test]
async fn history_read_is_cached_and_invalidated_by_writes() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(None).await.unwrap();
    fx.relay
        .on_visitor_message("1.2.3.4", &thread.id, MessageKind::Text, "first", "")
        .await
        .unwrap();

    let page = fx.relay.thread_messages(&thread.id, 50).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(fx.cache.len(), 1);

    // A write to the thread invalidates every cached page of it.
    fx.relay
        .on_admin_message("admin-1", &thread.id, MessageKind::Text, "second", "")
        .await
        .unwrap();
    assert!(fx.cache.get(&thread.id, 50).is_none());

    let page = fx.relay.thread_messages(&thread.id, 50).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[1].text, "second");
}

#[tokio::test]
async fn media_message_stores_locator_without_encryption() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(None).await.unwrap();
    fx.relay
        .on_visitor_message(
            "1.2.3.4",
            &thread.id,
            MessageKind::Image,
            "holiday photo",
            "/uploads/images/abc.jpg",
        )
        .await
        .unwrap();

    let records = fx
        .relay
        .store()
        .messages_for_thread(&thread.id, None)
        .await
        .unwrap();
    // Captions of media messages are stored as-is.
    assert_eq!(records[0].content, "holiday photo");
    assert_eq!(records[0].file_locator, "/uploads/images/abc.jpg");

    // And media is never bridged.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fx.transport.sent_count().await, 0);
}

#[tokio::test]
async fn list_threads_decrypts_previews() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(Some("Deniz")).await.unwrap();
    fx.relay
        .on_visitor_message("1.2.3.4", &thread.id, MessageKind::Text, "preview me", "")
        .await
        .unwrap();

    let listing = fx.relay.list_threads().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].display_name, "Deniz");
    assert_eq!(listing[0].last_message.as_deref(), Some("preview me"));
}

#[tokio::test]
async fn purge_thread_clears_history_and_is_repair_rate_limited() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(None).await.unwrap();
    fx.relay
        .on_visitor_message("1.2.3.4", &thread.id, MessageKind::Text, "to be purged", "")
        .await
        .unwrap();

    fx.relay.purge_thread("admin-1", &thread.id).await.unwrap();
    assert_eq!(fx.relay.store().count_messages().await.unwrap(), 0);
    assert!(fx.relay.thread_messages(&thread.id, 50).await.unwrap().is_empty());

    // admin-repair budget is 1 per hour.
    let again = fx.relay.purge_thread("admin-1", &thread.id).await;
    assert!(matches!(again, Err(RelaioError::RateLimited { .. })));
}

#[tokio::test]
async fn heartbeat_touches_thread_and_notifies_admins() {
    let fx = fixture().await;

    let thread = fx.relay.join_visitor(None).await.unwrap();
    fx.publisher.clear().await;

    fx.relay.touch_thread(&thread.id).await.unwrap();

    let admin_events = fx.publisher.events_for_room(ADMIN_ROOM).await;
    assert_eq!(admin_events.len(), 1);
    assert_eq!(admin_events[0].event, "visitor_online");

    // A heartbeat for a vanished thread is silently ignored.
    fx.relay.touch_thread(&ThreadId::generate()).await.unwrap();
}
