//! Fixed-interval poll policies and attempt accounting.
//!
//! The first status request goes out one interval after submission.
//! Every non-terminal response consumes one attempt; once
//! `max_attempts` pending responses have been seen the job is declared
//! timed out. There is no backoff and no jitter.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Seconds between image status polls.
pub const IMAGE_POLL_INTERVAL_SECS: u64 = 5;
/// Image jobs give up after this many pending responses (about 5 minutes).
pub const IMAGE_MAX_ATTEMPTS: u32 = 60;

/// Seconds between video status polls.
pub const VIDEO_POLL_INTERVAL_SECS: u64 = 3;
/// Video jobs give up after this many pending responses (about 10 minutes).
pub const VIDEO_MAX_ATTEMPTS: u32 = 200;

/// How often to poll and when to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const IMAGE: PollPolicy = PollPolicy {
        interval: Duration::from_secs(IMAGE_POLL_INTERVAL_SECS),
        max_attempts: IMAGE_MAX_ATTEMPTS,
    };

    pub const VIDEO: PollPolicy = PollPolicy {
        interval: Duration::from_secs(VIDEO_POLL_INTERVAL_SECS),
        max_attempts: VIDEO_MAX_ATTEMPTS,
    };

    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Longest a job can be polled before timing out.
    pub fn deadline(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

// ---------------------------------------------------------------------------
// Attempt accounting
// ---------------------------------------------------------------------------

/// What to do after a pending response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Sleep one interval and poll again.
    Continue,
    /// The attempt ceiling has been reached.
    GiveUp,
}

/// Counts pending responses against a [`PollPolicy`].
#[derive(Debug, Clone)]
pub struct AttemptCounter {
    attempts: u32,
    max_attempts: u32,
}

impl AttemptCounter {
    pub fn new(policy: &PollPolicy) -> Self {
        Self {
            attempts: 0,
            max_attempts: policy.max_attempts,
        }
    }

    /// Record one pending response and decide whether to keep going.
    pub fn record_pending(&mut self) -> PollDecision {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts < self.max_attempts {
            PollDecision::Continue
        } else {
            PollDecision::GiveUp
        }
    }

    /// Pending responses recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

// ---------------------------------------------------------------------------
// Lipsync progress
// ---------------------------------------------------------------------------

/// Progress once the animate job has been accepted.
pub const PROGRESS_VIDEO_QUEUED: u8 = 80;
/// Ceiling while the video job is still pending.
pub const PROGRESS_VIDEO_POLL_CEILING: u8 = 99;
/// Progress reported on completion.
pub const PROGRESS_DONE: u8 = 100;

/// Progress percentage after `attempts` pending video polls.
///
/// Climbs linearly from 80 toward 99 and never reaches 100 before
/// the job actually completes.
pub fn video_poll_progress(attempts: u32, max_attempts: u32) -> u8 {
    if max_attempts == 0 {
        return PROGRESS_VIDEO_POLL_CEILING;
    }
    let span = f64::from(PROGRESS_VIDEO_POLL_CEILING - PROGRESS_VIDEO_QUEUED);
    let raw = f64::from(PROGRESS_VIDEO_QUEUED) + (f64::from(attempts) / f64::from(max_attempts)) * span;
    raw.min(f64::from(PROGRESS_VIDEO_POLL_CEILING)) as u8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
