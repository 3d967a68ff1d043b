// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port traits implemented by the concrete channel crates.

pub mod publisher;
pub mod transport;

pub use publisher::LivePublisher;
pub use transport::BotTransport;
