// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; nothing is recorded unless the host process
//! installs a recorder.

use metrics::describe_counter;

/// Register all Stepwise metric descriptions.
pub fn register_metrics() {
    describe_counter!("stepwise_notes_generated_total", "Note artifacts written");
    describe_counter!(
        "stepwise_notes_failed_total",
        "Milestones where note synthesis failed"
    );
    describe_counter!(
        "stepwise_rubric_assessments_total",
        "Readiness assessments by basis"
    );
    describe_counter!(
        "stepwise_generation_failures_total",
        "Failed text-generation calls by call site"
    );
    describe_counter!(
        "stepwise_suggestions_shown_total",
        "Next-step suggestions surfaced"
    );
}

pub fn record_note_generated() {
    metrics::counter!("stepwise_notes_generated_total").increment(1);
}

pub fn record_note_failed() {
    metrics::counter!("stepwise_notes_failed_total").increment(1);
}

pub fn record_assessment(basis: &str) {
    metrics::counter!("stepwise_rubric_assessments_total", "basis" => basis.to_string())
        .increment(1);
}

pub fn record_generation_failure(site: &'static str) {
    metrics::counter!("stepwise_generation_failures_total", "site" => site).increment(1);
}

pub fn record_suggestion_shown() {
    metrics::counter!("stepwise_suggestions_shown_total").increment(1);
}
