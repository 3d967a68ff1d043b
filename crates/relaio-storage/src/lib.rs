// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Relaio message relay.
//!
//! All access flows through tokio-rusqlite's single background thread,
//! which also provides the per-thread persist-order guarantee the relay
//! pipeline relies on. Message payloads arrive here already encrypted;
//! this crate never sees plaintext text content.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use database::Database;
pub use models::{MessageRecord, ThreadSummary};
pub use store::Store;
