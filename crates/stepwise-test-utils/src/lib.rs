// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Stepwise integration tests.
//!
//! - [`MockGeneration`] - text generation with queued canned outputs
//! - [`TestHarness`] - temp-file database wired to a full [`ProgressionEngine`]
//!
//! [`ProgressionEngine`]: stepwise_progress::ProgressionEngine

pub mod harness;
pub mod mock_generation;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_generation::MockGeneration;
