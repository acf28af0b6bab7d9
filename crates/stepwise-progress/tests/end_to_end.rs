// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the progression engine the way a host would.

use stepwise_core::types::{ModeStep, RubricCriterion, SuggestionEventType};
use stepwise_core::{NoteStore, ProgressionStore, SuggestionLog};
use stepwise_progress::{AssessmentBasis, ReadinessKind};
use stepwise_test_utils::TestHarness;

fn rubric() -> Vec<RubricCriterion> {
    vec![
        RubricCriterion::new("Understanding", 4.0)
            .with_level(1, "Restates the question")
            .with_level(4, "Explains the mechanism unprompted"),
        RubricCriterion::new("Evidence", 3.0),
        RubricCriterion::new("Reflection", 3.0),
    ]
}

/// Understanding 4 (w4), Evidence 3 (w3), Reflection 2 (w3): (16 + 9 + 6) / 10 = 3.1.
const ASSESSMENT_3_1: &str = r#"```json
{
  "criteria": [
    {"name": "Understanding", "score": 4, "rationale": "Explains the light reactions clearly."},
    {"name": "Evidence", "score": 3, "rationale": "Cites the experiment."},
    {"name": "Reflection", "score": 2, "rationale": "Little reflection on gaps."}
  ],
  "suggestions": ["Compare C3 and C4 plants"]
}
```"#;

#[tokio::test]
async fn twelve_messages_scoring_3_1_is_ready_and_shown() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            "- notes at 5".into(),
            "- notes at 10".into(),
            ASSESSMENT_3_1.into(),
        ])
        .build()
        .await
        .unwrap();
    harness.set_rubric("room-1", "explore", &rubric()).await.unwrap();
    let chat = harness.create_chat("chat-1", "room-1", "explore").await.unwrap();

    let written = harness.append_and_process("chat-1", 12).await.unwrap();
    assert_eq!(written, 2);
    let note = harness.store.get_note("chat-1").await.unwrap().unwrap();
    assert_eq!(note.watermark, 10);

    let outcome = harness.engine.after_assistant_turn(&chat, "chat-1-m12").await;
    let recommendation = outcome.recommendation.clone().unwrap();
    assert_eq!(recommendation.kind, ReadinessKind::Ready);
    assert_eq!(recommendation.basis, AssessmentBasis::Rubric);
    assert!((recommendation.overall.unwrap() - 3.1).abs() < 1e-9);
    assert!((recommendation.confidence - 0.7).abs() < 1e-9);
    assert_eq!(recommendation.suggestions, vec!["Compare C3 and C4 plants"]);

    assert!(outcome.show_suggestion);
    let next = outcome.next_step.unwrap();
    assert_eq!(next.key, "practice");
    assert_eq!(next.link, "/rooms/room-1/chats/new?mode=practice");

    let events = harness.store.events_for_chat("chat-1").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, SuggestionEventType::Shown);
    assert_eq!(events[0].message_id.as_deref(), Some("chat-1-m12"));
    assert_eq!(harness.generation.calls(), 3);
}

#[tokio::test]
async fn repeated_processing_does_not_regenerate_notes() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["- first".into()])
        .build()
        .await
        .unwrap();
    harness.create_chat("chat-1", "room-1", "explore").await.unwrap();
    harness.append_messages("chat-1", 5).await.unwrap();

    assert!(harness.engine.on_message_appended("chat-1").await);
    assert!(!harness.engine.on_message_appended("chat-1").await);
    assert_eq!(harness.generation.calls(), 1);
}

#[tokio::test]
async fn new_chat_receives_room_context() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["- chlorophyll absorbs red and blue".into()])
        .build()
        .await
        .unwrap();
    harness.create_chat("chat-1", "room-1", "explore").await.unwrap();
    harness.append_and_process("chat-1", 5).await.unwrap();

    let fresh = harness.create_chat("chat-2", "room-1", "explore").await.unwrap();
    let context = harness.engine.context_for_new_chat(&fresh).await.unwrap();
    assert!(context.contains("chlorophyll absorbs red and blue"));
    assert_eq!(context.matches("### Session").count(), 1);

    let elsewhere = harness.create_chat("chat-3", "room-2", "explore").await.unwrap();
    assert!(harness.engine.context_for_new_chat(&elsewhere).await.is_none());
}

#[tokio::test]
async fn heuristic_turns_follow_backoff_and_reset_on_mode_switch() {
    let harness = TestHarness::new().await.unwrap();
    let chat = harness.create_chat("chat-1", "room-1", "explore").await.unwrap();
    harness.append_messages("chat-1", 12).await.unwrap();

    let mut shown = Vec::new();
    for turn in 1..=7 {
        let outcome = harness
            .engine
            .after_assistant_turn(&chat, &format!("turn-{turn}"))
            .await;
        let recommendation = outcome.recommendation.unwrap();
        assert_eq!(recommendation.basis, AssessmentBasis::Heuristic);
        if outcome.show_suggestion {
            shown.push(turn);
        }
    }
    assert_eq!(shown, vec![1, 3, 7]);
    assert_eq!(harness.generation.calls(), 0);

    let moved = harness.switch_mode(&chat, "practice").await.unwrap();
    let outcome = harness.engine.after_assistant_turn(&moved, "after-switch").await;
    assert!(outcome.show_suggestion);
    assert_eq!(outcome.next_step.unwrap().key, "assess");

    let state = harness
        .store
        .load_active_state("chat-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.mode, "practice");
    assert_eq!((state.cooldown, state.since), (2, 0));
}

#[tokio::test]
async fn final_step_never_suggests() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .set_room_modes(
            "room-1",
            &[ModeStep::new("read", "Read"), ModeStep::new("discuss", "Discuss")],
        )
        .await
        .unwrap();
    let chat = harness.create_chat("chat-1", "room-1", "discuss").await.unwrap();
    harness.append_messages("chat-1", 40).await.unwrap();

    let outcome = harness.engine.after_assistant_turn(&chat, "m40").await;
    assert_eq!(outcome.recommendation.unwrap().kind, ReadinessKind::Ready);
    assert!(!outcome.show_suggestion);
    assert!(outcome.next_step.is_none());
    assert!(harness.store.events_for_chat("chat-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn generation_outage_degrades_quietly() {
    let harness = TestHarness::new().await.unwrap();
    harness.generation.add_failure("503 overloaded").await;
    harness.generation.add_failure("401 unauthorized").await;
    harness.set_rubric("room-1", "explore", &rubric()).await.unwrap();
    let chat = harness.create_chat("chat-1", "room-1", "explore").await.unwrap();

    assert_eq!(harness.append_and_process("chat-1", 5).await.unwrap(), 0);
    assert!(harness.store.get_note("chat-1").await.unwrap().is_none());

    let outcome = harness.engine.after_assistant_turn(&chat, "m5").await;
    assert!(outcome.recommendation.is_none());
    assert!(!outcome.show_suggestion);
}

#[tokio::test]
async fn unparseable_assessment_skips_the_turn() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["I'd rather not grade this.".into()])
        .build()
        .await
        .unwrap();
    harness.set_rubric("room-1", "explore", &rubric()).await.unwrap();
    let chat = harness.create_chat("chat-1", "room-1", "explore").await.unwrap();
    harness.append_messages("chat-1", 12).await.unwrap();

    let outcome = harness.engine.after_assistant_turn(&chat, "m12").await;
    assert!(outcome.recommendation.is_none());
    assert!(harness.store.load_active_state("chat-1").await.unwrap().is_none());
}

#[tokio::test]
async fn partial_assessment_defaults_missing_criteria() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            r#"{"criteria": [{"name": "Understanding", "score": 4, "rationale": "Strong."}]}"#.into(),
        ])
        .build()
        .await
        .unwrap();
    harness.set_rubric("room-1", "explore", &rubric()).await.unwrap();
    let chat = harness.create_chat("chat-1", "room-1", "explore").await.unwrap();
    harness.append_messages("chat-1", 4).await.unwrap();

    let outcome = harness.engine.after_assistant_turn(&chat, "m4").await;
    let recommendation = outcome.recommendation.unwrap();
    // (4*4 + 2*3 + 2*3) / 10 = 2.8
    assert!((recommendation.overall.unwrap() - 2.8).abs() < 1e-9);
    assert_eq!(recommendation.kind, ReadinessKind::Ready);
    let defaulted: Vec<&str> = recommendation
        .criteria
        .iter()
        .filter(|c| c.defaulted)
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(defaulted, vec!["Evidence", "Reflection"]);
}

#[tokio::test]
async fn learner_responses_are_audited() {
    let harness = TestHarness::new().await.unwrap();
    let chat = harness.create_chat("chat-1", "room-1", "explore").await.unwrap();
    harness.append_messages("chat-1", 12).await.unwrap();

    assert!(harness.engine.after_assistant_turn(&chat, "m12").await.show_suggestion);
    assert!(
        harness
            .engine
            .record_response(&chat, SuggestionEventType::Dismissed, Some("m12"))
            .await
    );

    let kinds: Vec<SuggestionEventType> = harness
        .store
        .events_for_chat("chat-1")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(
        kinds,
        vec![SuggestionEventType::Shown, SuggestionEventType::Dismissed]
    );
}
