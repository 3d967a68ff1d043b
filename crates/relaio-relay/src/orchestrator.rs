// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The relay orchestrator: walks each inbound event through
//! `rate gate → resolve → dedup → persist → cache invalidate → fan-out →
//! bridge` and fans the stored message out to the subscribers entitled to
//! see it.
//!
//! Fan-out rules:
//! - visitor message → admin broadcast room + bridging (text only)
//! - admin message → thread room + echo to other admins; never bridged
//! - external message → admin broadcast room + thread room
//!
//! Per-message failures are reported to the affected subscribers and
//! returned to the caller; they never abort the event loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use relaio_cache::MessageCache;
use relaio_core::RelaioError;
use relaio_core::traits::LivePublisher;
use relaio_core::types::{
    ExternalUpdate, FanoutEvent, MessageId, MessageKind, MessageView, Origin, RelayOutcome,
    Thread, ThreadId,
};
use relaio_crypto::MessageCodec;
use relaio_limiter::{OpClass, RateLimiter};
use relaio_storage::{MessageRecord, Store, ThreadSummary};

use crate::delivery::{DeliveryEngine, DeliveryReport, spawn_delivery};
use crate::resolver;

/// Shown to admins in place of a payload that no longer decrypts.
pub const REDACTED_PLACEHOLDER: &str = "[encrypted message unreadable]";

/// Display name for visitors that did not provide one.
pub const DEFAULT_VISITOR_NAME: &str = "Visitor";

/// Default page size for history reads.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Everything the orchestrator needs to bridge messages out.
pub struct BridgeHandle {
    pub engine: Arc<DeliveryEngine>,
    pub admin_chat_id: String,
    pub report_tx: mpsc::Sender<DeliveryReport>,
}

/// The top-level relay service. One instance per process, constructed at
/// startup and shared by handle.
pub struct Relay {
    store: Store,
    codec: Arc<MessageCodec>,
    cache: Arc<MessageCache>,
    limiter: Arc<RateLimiter>,
    publisher: Arc<dyn LivePublisher>,
    bridge: Option<BridgeHandle>,
}

impl Relay {
    pub fn new(
        store: Store,
        codec: Arc<MessageCodec>,
        cache: Arc<MessageCache>,
        limiter: Arc<RateLimiter>,
        publisher: Arc<dyn LivePublisher>,
    ) -> Self {
        Self {
            store,
            codec,
            cache,
            limiter,
            publisher,
            bridge: None,
        }
    }

    /// Enable bridging. Without this the relay runs web-only.
    pub fn with_bridge(mut self, bridge: BridgeHandle) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Create a thread for a joining visitor session.
    pub async fn join_visitor(&self, display_name: Option<&str>) -> Result<Thread, RelaioError> {
        let name = match display_name {
            Some(n) if !n.trim().is_empty() => n.trim(),
            _ => DEFAULT_VISITOR_NAME,
        };
        let thread = self.store.create_thread(name).await?;
        info!(thread_id = %thread.id, "visitor thread created");
        Ok(thread)
    }

    /// Whether a rejoining session's thread still exists.
    pub async fn thread_exists(&self, thread_id: &ThreadId) -> Result<bool, RelaioError> {
        self.store.thread_exists(thread_id).await
    }

    /// Relay a message from a visitor socket.
    ///
    /// Delivered to the admin broadcast room, and bridged to the admin's
    /// Telegram chat (text kind only) with an embedded thread tag.
    pub async fn on_visitor_message(
        &self,
        actor_key: &str,
        thread_id: &ThreadId,
        kind: MessageKind,
        text: &str,
        file_locator: &str,
    ) -> Result<MessageView, RelaioError> {
        validate_payload(kind, text, file_locator)?;

        let class = op_class_for(kind);
        if !self.limiter.allow(actor_key, class) {
            let retry = self.limiter.retry_after(actor_key, class);
            return Err(RelaioError::RateLimited {
                retry_after_secs: retry.as_secs(),
            });
        }

        let thread = self
            .store
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| RelaioError::ThreadNotFound(thread_id.to_string()))?;

        let view = match self
            .persist_message(thread_id, Origin::Visitor, kind, text, file_locator)
            .await
        {
            Ok(view) => view,
            Err(err) => {
                let event = FanoutEvent::MessageError {
                    kind: "db_save_failed".to_string(),
                    message: "Message could not be saved.".to_string(),
                };
                self.publisher.emit_to_thread(thread_id, &event).await;
                return Err(err);
            }
        };

        self.publisher
            .emit_to_admins(
                &FanoutEvent::MessageFromVisitor {
                    message: view.clone(),
                },
                None,
            )
            .await;
        self.publisher
            .emit_to_admins(
                &FanoutEvent::NewMessageNotification {
                    thread_id: thread_id.clone(),
                    display_name: thread.display_name.clone(),
                    message_preview: preview(kind, text),
                    timestamp: self.store.now_local(),
                },
                None,
            )
            .await;

        if let Some(bridge) = &self.bridge
            && kind == MessageKind::Text
        {
            let tag = resolver::format_thread_tag(thread_id);
            let outbound = format!("💬 {}\n\n{}\n\n{}", thread.display_name, text, tag);
            spawn_delivery(
                Arc::clone(&bridge.engine),
                bridge.report_tx.clone(),
                bridge.admin_chat_id.clone(),
                outbound,
                Some(thread_id.clone()),
            );
        }

        info!(thread_id = %thread_id, message_id = %view.id, kind = %kind, "visitor message relayed");
        Ok(view)
    }

    /// Relay a message from an admin socket to a visitor's thread.
    ///
    /// Delivered to the thread room, echoed to the other admins as an
    /// acknowledgement, and never bridged back out.
    pub async fn on_admin_message(
        &self,
        sender_id: &str,
        thread_id: &ThreadId,
        kind: MessageKind,
        text: &str,
        file_locator: &str,
    ) -> Result<MessageView, RelaioError> {
        validate_payload(kind, text, file_locator)?;

        let class = op_class_for(kind);
        if !self.limiter.allow(sender_id, class) {
            let retry = self.limiter.retry_after(sender_id, class);
            return Err(RelaioError::RateLimited {
                retry_after_secs: retry.as_secs(),
            });
        }

        if !self.store.thread_exists(thread_id).await? {
            return Err(RelaioError::ThreadNotFound(thread_id.to_string()));
        }

        let view = match self
            .persist_message(thread_id, Origin::Admin, kind, text, file_locator)
            .await
        {
            Ok(view) => view,
            Err(err) => {
                let event = FanoutEvent::MessageError {
                    kind: "db_save_failed".to_string(),
                    message: "Message could not be saved.".to_string(),
                };
                self.publisher.emit_to_admins(&event, None).await;
                return Err(err);
            }
        };

        let event = FanoutEvent::MessageFromAdmin {
            message: view.clone(),
        };
        self.publisher.emit_to_thread(thread_id, &event).await;
        self.publisher.emit_to_admins(&event, Some(sender_id)).await;

        info!(thread_id = %thread_id, message_id = %view.id, "admin message relayed");
        Ok(view)
    }

    /// Relay an inbound update from the external bot channel.
    ///
    /// Resolution lookups run first (read-only), then the dedup ledger
    /// accepts or absorbs the update, and only then may a thread be
    /// created. A redelivery therefore has no side effects at all.
    pub async fn on_external_update(
        &self,
        update: &ExternalUpdate,
    ) -> Result<RelayOutcome, RelaioError> {
        if !self.limiter.allow(&update.chat_id, OpClass::Message) {
            let retry = self.limiter.retry_after(&update.chat_id, OpClass::Message);
            return Err(RelaioError::RateLimited {
                retry_after_secs: retry.as_secs(),
            });
        }

        let resolved = resolver::resolve_existing(&self.store, update).await?;

        if !self
            .store
            .record_inbound(&update.chat_id, update.message_id)
            .await?
        {
            info!(
                chat_id = %update.chat_id,
                message_id = update.message_id,
                "duplicate external message skipped"
            );
            return Ok(RelayOutcome::Duplicate);
        }

        let thread_id = match resolved {
            Some(id) => id,
            None => {
                let display_name = format!("Telegram-{}", update.chat_id);
                let thread = self.store.create_thread(&display_name).await?;
                info!(thread_id = %thread.id, "new thread created for external message");
                thread.id
            }
        };

        let view = self
            .persist_message(
                &thread_id,
                Origin::Bridge,
                update.kind,
                &update.text,
                &update.file_locator,
            )
            .await?;

        // Link the inbound message so later replies to it resolve here.
        if let Err(e) = self
            .store
            .insert_bridge_link(&thread_id, &update.chat_id, update.message_id)
            .await
        {
            warn!(error = %e, thread_id = %thread_id, "inbound bridge link insert failed");
        }

        let event = FanoutEvent::MessageFromBridge {
            message: view.clone(),
        };
        self.publisher.emit_to_admins(&event, None).await;
        self.publisher.emit_to_thread(&thread_id, &event).await;

        info!(
            thread_id = %thread_id,
            message_id = %view.id,
            kind = %update.kind,
            "external message relayed"
        );
        Ok(RelayOutcome::Delivered(view))
    }

    /// Cached history read for one thread page.
    ///
    /// A message that fails to decrypt is shown redacted rather than
    /// failing the whole page.
    pub async fn thread_messages(
        &self,
        thread_id: &ThreadId,
        page_size: usize,
    ) -> Result<Vec<MessageView>, RelaioError> {
        if let Some(cached) = self.cache.get(thread_id, page_size) {
            return Ok(cached);
        }

        if !self.store.thread_exists(thread_id).await? {
            return Err(RelaioError::ThreadNotFound(thread_id.to_string()));
        }

        let records = self
            .store
            .messages_for_thread(thread_id, Some(page_size as i64))
            .await?;
        let views: Vec<MessageView> = records.into_iter().map(|r| self.to_view(r)).collect();

        self.cache.set(thread_id, page_size, views.clone());
        Ok(views)
    }

    /// Thread listing for the admin panel, with decrypted previews.
    pub async fn list_threads(&self) -> Result<Vec<ThreadSummary>, RelaioError> {
        let mut summaries = self.store.list_threads().await?;
        for summary in &mut summaries {
            if summary.last_message_kind == Some(MessageKind::Text)
                && let Some(content) = summary.last_message.take()
            {
                summary.last_message = Some(if content.is_empty() {
                    content
                } else {
                    match self.codec.decrypt(&content) {
                        Ok(plain) => plain,
                        Err(e) => {
                            warn!(thread_id = %summary.id, error = %e, "preview decrypt failed");
                            REDACTED_PLACEHOLDER.to_string()
                        }
                    }
                });
            }
        }
        Ok(summaries)
    }

    /// Visitor heartbeat: refresh the thread's last-activity timestamp and
    /// surface presence to the admin room.
    pub async fn touch_thread(&self, thread_id: &ThreadId) -> Result<(), RelaioError> {
        if !self.store.thread_exists(thread_id).await? {
            return Ok(());
        }
        self.store.touch_thread(thread_id).await?;
        self.publisher
            .emit_to_admins(
                &FanoutEvent::VisitorOnline {
                    thread_id: thread_id.clone(),
                },
                None,
            )
            .await;
        Ok(())
    }

    /// Explicit admin purge of one thread's messages and links.
    pub async fn purge_thread(
        &self,
        actor_key: &str,
        thread_id: &ThreadId,
    ) -> Result<(), RelaioError> {
        if !self.limiter.allow(actor_key, OpClass::AdminRepair) {
            let retry = self.limiter.retry_after(actor_key, OpClass::AdminRepair);
            return Err(RelaioError::RateLimited {
                retry_after_secs: retry.as_secs(),
            });
        }
        self.store.purge_thread(thread_id).await?;
        self.cache.invalidate_thread(thread_id);
        info!(thread_id = %thread_id, "thread purged");
        Ok(())
    }

    /// Explicit admin purge of everything.
    pub async fn purge_all(&self, actor_key: &str) -> Result<(), RelaioError> {
        if !self.limiter.allow(actor_key, OpClass::AdminRepair) {
            let retry = self.limiter.retry_after(actor_key, OpClass::AdminRepair);
            return Err(RelaioError::RateLimited {
                retry_after_secs: retry.as_secs(),
            });
        }
        self.store.purge_all().await?;
        self.cache.clear();
        info!("all threads purged");
        Ok(())
    }

    /// Encrypt (text kinds) and insert, then invalidate the thread's
    /// cached pages. Returns the decrypted view for fan-out.
    async fn persist_message(
        &self,
        thread_id: &ThreadId,
        origin: Origin,
        kind: MessageKind,
        text: &str,
        file_locator: &str,
    ) -> Result<MessageView, RelaioError> {
        let content = if kind == MessageKind::Text && !text.is_empty() {
            self.codec.encrypt(text)?
        } else {
            text.to_string()
        };

        let record = MessageRecord {
            id: MessageId::generate(),
            thread_id: thread_id.clone(),
            origin,
            kind,
            content,
            file_locator: file_locator.to_string(),
            created_at: self.store.now_local(),
        };
        self.store.insert_message(&record).await?;
        self.cache.invalidate_thread(thread_id);

        Ok(MessageView {
            id: record.id,
            thread_id: record.thread_id,
            origin,
            kind,
            text: text.to_string(),
            file_locator: record.file_locator,
            created_at: record.created_at,
        })
    }

    /// Decrypt a stored record for display, redacting on failure.
    fn to_view(&self, record: MessageRecord) -> MessageView {
        let text = if record.kind == MessageKind::Text && !record.content.is_empty() {
            match self.codec.decrypt(&record.content) {
                Ok(plain) => plain,
                Err(e) => {
                    warn!(message_id = %record.id, error = %e, "message decrypt failed");
                    REDACTED_PLACEHOLDER.to_string()
                }
            }
        } else {
            record.content
        };

        MessageView {
            id: record.id,
            thread_id: record.thread_id,
            origin: record.origin,
            kind: record.kind,
            text,
            file_locator: record.file_locator,
            created_at: record.created_at,
        }
    }
}

/// Boundary validation: a text message needs a body, a media message
/// needs a stored file locator. Rejected before any rate budget is spent.
fn validate_payload(
    kind: MessageKind,
    text: &str,
    file_locator: &str,
) -> Result<(), RelaioError> {
    match kind {
        MessageKind::Text => {
            if text.trim().is_empty() {
                return Err(RelaioError::Validation(
                    "message text must not be empty".to_string(),
                ));
            }
        }
        MessageKind::Image | MessageKind::Audio | MessageKind::File => {
            if file_locator.trim().is_empty() {
                return Err(RelaioError::Validation(format!(
                    "{kind} message requires a file locator"
                )));
            }
        }
    }
    Ok(())
}

/// Rate class for a live-channel message of the given kind.
fn op_class_for(kind: MessageKind) -> OpClass {
    match kind {
        MessageKind::Image => OpClass::UploadImage,
        MessageKind::Audio => OpClass::UploadAudio,
        MessageKind::Text | MessageKind::File => OpClass::Message,
    }
}

/// First 50 characters of a text message, or a fixed label for media.
fn preview(kind: MessageKind, text: &str) -> String {
    if kind != MessageKind::Text || text.is_empty() {
        return "Media message".to_string();
    }
    let mut out: String = text.chars().take(50).collect();
    if text.chars().count() > 50 {
        out.push_str("...");
    }
    out
}
