// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Relaio message relay.
//!
//! Visitors and admins connect over `/ws` and exchange JSON envelopes;
//! the admin panel additionally uses a small REST surface for thread
//! listing, history, and purge. The room registry implements the
//! [`relaio_core::traits::LivePublisher`] port the orchestrator fans out
//! through.

pub mod auth;
pub mod handlers;
pub mod rooms;
pub mod server;
pub mod ws;

pub use rooms::RoomRegistry;
pub use server::{GatewayState, start_server};
