// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The relay engine: thread resolution, outbound delivery with retry, and
//! the orchestrator that walks every inbound event through the pipeline
//! `rate gate → resolve → dedup → persist → cache invalidate → fan-out →
//! bridge`.
//!
//! All state is held in explicitly owned services constructed once at
//! startup and passed in by handle -- no ambient globals.

pub mod delivery;
pub mod orchestrator;
pub mod resolver;

pub use delivery::{DeliveryEngine, DeliveryReport, spawn_delivery, spawn_report_notifier};
pub use orchestrator::{BridgeHandle, Relay};
pub use resolver::{extract_thread_tag, format_thread_tag};
