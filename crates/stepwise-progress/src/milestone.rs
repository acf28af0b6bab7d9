// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message-count milestones.

/// Interval used when none is configured.
pub const DEFAULT_MILESTONE_INTERVAL: u32 = 5;

/// True when `count` is a positive multiple of the default interval.
pub fn at_milestone(count: u32) -> bool {
    MilestoneDetector::default().at_milestone(count)
}

/// Pure predicate over a chat's message count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneDetector {
    interval: u32,
}

impl MilestoneDetector {
    /// A zero interval is treated as 1.
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn at_milestone(&self, count: u32) -> bool {
        count >= self.interval && count % self.interval == 0
    }

    /// Upper bound on generation calls a chat of `count` messages can cause.
    pub fn milestones_up_to(&self, count: u32) -> u32 {
        count / self.interval
    }
}

impl Default for MilestoneDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MILESTONE_INTERVAL)
    }
}
