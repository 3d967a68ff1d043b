// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Relaio message relay.
//!
//! This crate provides the error taxonomy, the domain types shared by every
//! relay component, and the port traits implemented by the live-channel
//! gateway and the Telegram bridge transport.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RelaioError;
pub use types::{
    BridgeMessageRef, ExternalUpdate, FanoutEvent, MessageId, MessageKind, MessageView, Origin,
    RelayOutcome, Thread, ThreadId,
};

pub use traits::{BotTransport, LivePublisher};
