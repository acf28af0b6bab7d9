// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rubric criteria and readiness thresholds per (room, mode).

use rusqlite::{OptionalExtension, params};
use stepwise_core::StepwiseError;
use stepwise_core::types::{RubricCriterion, RubricLevel};

use crate::database::{Database, map_tr_err};

/// Replace the rubric of a (room, mode) pair. An empty slice removes it.
pub async fn replace_rubric(
    db: &Database,
    room_id: &str,
    mode: &str,
    criteria: &[RubricCriterion],
) -> Result<(), StepwiseError> {
    let room_id = room_id.to_string();
    let mode = mode.to_string();
    let rows = criteria
        .iter()
        .map(|c| {
            serde_json::to_string(&c.levels)
                .map(|levels| (c.name.clone(), c.weight, levels))
                .map_err(StepwiseError::persistence)
        })
        .collect::<Result<Vec<_>, _>>()?;

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM rubric_criteria WHERE room_id = ?1 AND mode = ?2",
                params![room_id, mode],
            )?;
            for (position, (name, weight, levels)) in rows.iter().enumerate() {
                tx.execute(
                    "INSERT INTO rubric_criteria (room_id, mode, position, name, weight, levels)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![room_id, mode, position as i64, name, weight, levels],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Ordered criteria of a (room, mode) pair. Empty when none are configured.
pub async fn criteria_for(
    db: &Database,
    room_id: &str,
    mode: &str,
) -> Result<Vec<RubricCriterion>, StepwiseError> {
    let room_id = room_id.to_string();
    let mode = mode.to_string();
    let raw: Vec<(String, f64, String)> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT name, weight, levels FROM rubric_criteria
                 WHERE room_id = ?1 AND mode = ?2 ORDER BY position ASC",
            )?;
            let rows = stmt.query_map(params![room_id, mode], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    raw.into_iter()
        .map(|(name, weight, levels)| {
            let levels: Vec<RubricLevel> =
                serde_json::from_str(&levels).map_err(StepwiseError::persistence)?;
            Ok(RubricCriterion {
                name,
                weight,
                levels,
            })
        })
        .collect()
}

/// Set (or clear, with `None`) the readiness threshold override.
pub async fn set_threshold(
    db: &Database,
    room_id: &str,
    mode: &str,
    threshold: Option<f64>,
) -> Result<(), StepwiseError> {
    let room_id = room_id.to_string();
    let mode = mode.to_string();
    db.connection()
        .call(move |conn| {
            match threshold {
                Some(value) => conn.execute(
                    "INSERT INTO rubric_thresholds (room_id, mode, threshold) VALUES (?1, ?2, ?3)
                     ON CONFLICT(room_id, mode) DO UPDATE SET threshold = excluded.threshold",
                    params![room_id, mode, value],
                )?,
                None => conn.execute(
                    "DELETE FROM rubric_thresholds WHERE room_id = ?1 AND mode = ?2",
                    params![room_id, mode],
                )?,
            };
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The threshold override of a (room, mode) pair.
pub async fn threshold_for(
    db: &Database,
    room_id: &str,
    mode: &str,
) -> Result<Option<f64>, StepwiseError> {
    let room_id = room_id.to_string();
    let mode = mode.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT threshold FROM rubric_thresholds WHERE room_id = ?1 AND mode = ?2",
                params![room_id, mode],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rubric() -> Vec<RubricCriterion> {
        vec![
            RubricCriterion::new("Understanding", 2.0)
                .with_level(1, "Restates the prompt")
                .with_level(4, "Explains it to others"),
            RubricCriterion::new("Evidence", 1.0),
        ]
    }

    #[tokio::test]
    async fn criteria_round_trip_in_order() {
        let db = Database::open_in_memory().await.unwrap();
        replace_rubric(&db, "r1", "explore", &rubric()).await.unwrap();

        let loaded = criteria_for(&db, "r1", "explore").await.unwrap();
        assert_eq!(loaded, rubric());
        assert!(criteria_for(&db, "r1", "practice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replacing_drops_old_criteria() {
        let db = Database::open_in_memory().await.unwrap();
        replace_rubric(&db, "r1", "explore", &rubric()).await.unwrap();
        replace_rubric(&db, "r1", "explore", &[RubricCriterion::new("Depth", 1.0)])
            .await
            .unwrap();
        let loaded = criteria_for(&db, "r1", "explore").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Depth");
    }

    #[tokio::test]
    async fn threshold_override_set_and_cleared() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(threshold_for(&db, "r1", "explore").await.unwrap(), None);
        set_threshold(&db, "r1", "explore", Some(3.0)).await.unwrap();
        assert_eq!(threshold_for(&db, "r1", "explore").await.unwrap(), Some(3.0));
        set_threshold(&db, "r1", "explore", None).await.unwrap();
        assert_eq!(threshold_for(&db, "r1", "explore").await.unwrap(), None);
    }
}
