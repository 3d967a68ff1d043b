// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Relaio integration tests.
//!
//! Provides deterministic doubles for the two ports (bot transport and
//! live publisher) plus a tempdir-backed store/codec harness with
//! fast KDF parameters.

pub mod harness;
pub mod mock_publisher;
pub mod mock_transport;

pub use harness::{test_codec, test_store};
pub use mock_publisher::{MockPublisher, RecordedEvent};
pub use mock_transport::{MockTransport, SentMessage};
