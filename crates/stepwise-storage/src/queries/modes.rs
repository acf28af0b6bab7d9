// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-room ordered mode sequences.

use rusqlite::params;
use stepwise_core::StepwiseError;
use stepwise_core::types::ModeStep;

use crate::database::{Database, map_tr_err};

/// Replace a room's sequence. An empty slice reverts the room to the default table.
pub async fn set_room_modes(
    db: &Database,
    room_id: &str,
    steps: &[ModeStep],
) -> Result<(), StepwiseError> {
    let room_id = room_id.to_string();
    let steps = steps.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM room_modes WHERE room_id = ?1", params![room_id])?;
            for (position, step) in steps.iter().enumerate() {
                tx.execute(
                    "INSERT INTO room_modes (room_id, position, key, label) VALUES (?1, ?2, ?3, ?4)",
                    params![room_id, position as i64, step.key, step.label],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// A room's own sequence. Empty when the room uses the default table.
pub async fn room_modes(db: &Database, room_id: &str) -> Result<Vec<ModeStep>, StepwiseError> {
    let room_id = room_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key, label FROM room_modes WHERE room_id = ?1 ORDER BY position ASC",
            )?;
            let rows = stmt.query_map(params![room_id], |row| {
                Ok(ModeStep {
                    key: row.get(0)?,
                    label: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
