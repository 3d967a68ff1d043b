// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window rate limiter keyed by actor identity and operation class.
//!
//! Each `(actor, class)` pair owns a rolling list of attempt timestamps.
//! An attempt is allowed iff the count inside the trailing window is below
//! the class maximum; expired timestamps are pruned on every check. State
//! is in-memory only and resets on restart.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use strum::{Display, EnumString};
use tracing::debug;

/// Operation classes with independent budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum OpClass {
    Message,
    UploadImage,
    UploadAudio,
    AdminRepair,
}

impl OpClass {
    /// Static budget table: (max attempts, window).
    fn budget(self) -> (usize, Duration) {
        match self {
            OpClass::Message => (20, Duration::from_secs(60)),
            OpClass::UploadImage => (5, Duration::from_secs(300)),
            OpClass::UploadAudio => (3, Duration::from_secs(300)),
            OpClass::AdminRepair => (1, Duration::from_secs(3600)),
        }
    }
}

/// In-memory sliding-window limiter.
///
/// Keys mutate independently: each map entry has its own lock, so actors
/// never contend with each other.
#[derive(Default)]
pub struct RateLimiter {
    attempts: DashMap<(String, OpClass), Vec<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and record one attempt for `(actor_key, class)`.
    ///
    /// Returns `true` and appends the current timestamp when the actor is
    /// under budget; returns `false` (recording nothing) otherwise.
    pub fn allow(&self, actor_key: &str, class: OpClass) -> bool {
        self.allow_at(actor_key, class, Instant::now())
    }

    /// How long the rejected actor must wait before one slot frees up.
    pub fn retry_after(&self, actor_key: &str, class: OpClass) -> Duration {
        self.retry_after_at(actor_key, class, Instant::now())
    }

    fn allow_at(&self, actor_key: &str, class: OpClass, now: Instant) -> bool {
        let (max_attempts, window) = class.budget();
        let mut entry = self
            .attempts
            .entry((actor_key.to_string(), class))
            .or_default();

        entry.retain(|t| now.duration_since(*t) < window);

        if entry.len() >= max_attempts {
            debug!(actor = actor_key, class = %class, "rate limit exceeded");
            return false;
        }

        entry.push(now);
        true
    }

    fn retry_after_at(&self, actor_key: &str, class: OpClass, now: Instant) -> Duration {
        let (_, window) = class.budget();
        let Some(entry) = self.attempts.get(&(actor_key.to_string(), class)) else {
            return Duration::ZERO;
        };
        match entry.iter().min() {
            Some(oldest) => window.saturating_sub(now.duration_since(*oldest)),
            None => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_class_maximum() {
        let limiter = RateLimiter::new();
        let now = Instant::now();

        for _ in 0..20 {
            assert!(limiter.allow_at("1.2.3.4", OpClass::Message, now));
        }
        // The 21st attempt inside the same window is rejected.
        assert!(!limiter.allow_at("1.2.3.4", OpClass::Message, now));
    }

    #[test]
    fn capacity_frees_after_window_from_oldest() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for i in 0..20 {
            assert!(limiter.allow_at(
                "visitor",
                OpClass::Message,
                start + Duration::from_secs(i)
            ));
        }
        assert!(!limiter.allow_at("visitor", OpClass::Message, start + Duration::from_secs(59)));

        // 60s after the oldest attempt, exactly one slot is free again.
        let later = start + Duration::from_secs(60);
        assert!(limiter.allow_at("visitor", OpClass::Message, later));
        assert!(!limiter.allow_at("visitor", OpClass::Message, later));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new();
        let now = Instant::now();

        for _ in 0..20 {
            assert!(limiter.allow_at("a", OpClass::Message, now));
        }
        assert!(!limiter.allow_at("a", OpClass::Message, now));
        assert!(limiter.allow_at("b", OpClass::Message, now));
    }

    #[test]
    fn classes_are_independent() {
        let limiter = RateLimiter::new();
        let now = Instant::now();

        assert!(limiter.allow_at("a", OpClass::AdminRepair, now));
        assert!(!limiter.allow_at("a", OpClass::AdminRepair, now));
        // A different class for the same actor still has budget.
        assert!(limiter.allow_at("a", OpClass::Message, now));
    }

    #[test]
    fn upload_budgets_match_table() {
        let limiter = RateLimiter::new();
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.allow_at("ip", OpClass::UploadImage, now));
        }
        assert!(!limiter.allow_at("ip", OpClass::UploadImage, now));

        for _ in 0..3 {
            assert!(limiter.allow_at("ip", OpClass::UploadAudio, now));
        }
        assert!(!limiter.allow_at("ip", OpClass::UploadAudio, now));
    }

    #[test]
    fn retry_after_counts_down_from_oldest() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        assert!(limiter.allow_at("x", OpClass::AdminRepair, start));
        let wait = limiter.retry_after_at("x", OpClass::AdminRepair, start + Duration::from_secs(100));
        assert_eq!(wait, Duration::from_secs(3500));
    }

    #[test]
    fn retry_after_is_zero_for_unknown_actor() {
        let limiter = RateLimiter::new();
        assert_eq!(
            limiter.retry_after("nobody", OpClass::Message),
            Duration::ZERO
        );
    }

    #[test]
    fn op_class_displays_kebab_case() {
        assert_eq!(OpClass::UploadImage.to_string(), "upload-image");
        assert_eq!(OpClass::Message.to_string(), "message");
    }
}
