//! Store methods for events, participants and assessment facts.

use super::{conclusion_column, placeholders, AssessmentStore};
use crate::{
    assessment::{AspectAssessment, CategoryAssessment, Participant, Position},
    error::ScoringResult,
    source::AssessmentSource,
    types::{AspectId, BatchId, EventId, ParticipantId, PositionId, TemplateId},
};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

const ASPECT_ASSESSMENT_COLUMNS: &str =
    "aa.participant_id, aa.aspect_id, aa.standard_rating, aa.standard_score,
     aa.individual_rating, aa.individual_score, aa.gap_rating, aa.gap_score, aa.conclusion";

fn aspect_assessment_row(row: &Row<'_>) -> rusqlite::Result<AspectAssessment> {
    Ok(AspectAssessment {
        participant_id: row.get(0)?,
        aspect_id: row.get(1)?,
        standard_rating: row.get(2)?,
        standard_score: row.get(3)?,
        individual_rating: row.get(4)?,
        individual_score: row.get(5)?,
        gap_rating: row.get(6)?,
        gap_score: row.get(7)?,
        conclusion: conclusion_column(row, 8)?,
    })
}

fn participant_row(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        participant_id: row.get(0)?,
        event_id: row.get(1)?,
        position_id: row.get(2)?,
        batch_id: row.get(3)?,
        name: row.get(4)?,
        test_number: row.get(5)?,
    })
}

impl AssessmentStore {
    // ── Events and participants ───────────────────────────────────

    pub fn insert_event(&self, code: &str, name: &str) -> ScoringResult<EventId> {
        self.conn.execute(
            "INSERT INTO assessment_event (code, name) VALUES (?1, ?2)",
            params![code, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_position(
        &self,
        event_id: EventId,
        template_id: TemplateId,
        name: &str,
    ) -> ScoringResult<PositionId> {
        self.conn.execute(
            "INSERT INTO position_formation (event_id, template_id, name) VALUES (?1, ?2, ?3)",
            params![event_id, template_id, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_batch(&self, event_id: EventId, name: &str) -> ScoringResult<BatchId> {
        self.conn.execute(
            "INSERT INTO batch (event_id, name) VALUES (?1, ?2)",
            params![event_id, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_participant(
        &self,
        event_id: EventId,
        position_id: PositionId,
        batch_id: Option<BatchId>,
        name: &str,
        test_number: &str,
    ) -> ScoringResult<ParticipantId> {
        self.conn.execute(
            "INSERT INTO participant (event_id, position_id, batch_id, name, test_number)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![event_id, position_id, batch_id, name, test_number],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Assessment facts ──────────────────────────────────────────

    pub fn insert_aspect_assessment(&self, a: &AspectAssessment) -> ScoringResult<()> {
        self.conn.execute(
            "INSERT INTO aspect_assessment (
                participant_id, aspect_id, standard_rating, standard_score,
                individual_rating, individual_score, gap_rating, gap_score, conclusion
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                a.participant_id,
                a.aspect_id,
                a.standard_rating,
                a.standard_score,
                a.individual_rating,
                a.individual_score,
                a.gap_rating,
                a.gap_score,
                a.conclusion.label(),
            ],
        )?;
        Ok(())
    }

    pub fn insert_category_assessment(&self, c: &CategoryAssessment) -> ScoringResult<()> {
        self.conn.execute(
            "INSERT INTO category_assessment (
                participant_id, category_id, standard_rating, standard_score,
                individual_rating, individual_score, gap_rating, gap_score, conclusion
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                c.participant_id,
                c.category_id,
                c.standard_rating,
                c.standard_score,
                c.individual_rating,
                c.individual_score,
                c.gap_rating,
                c.gap_score,
                c.conclusion.label(),
            ],
        )?;
        Ok(())
    }

    /// The category aggregates persisted at import time, in category order.
    pub fn category_assessments_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> ScoringResult<Vec<CategoryAssessment>> {
        let mut stmt = self.conn.prepare(
            "SELECT ca.participant_id, ca.category_id, ca.standard_rating, ca.standard_score,
                    ca.individual_rating, ca.individual_score, ca.gap_rating, ca.gap_score,
                    ca.conclusion
             FROM category_assessment ca
             JOIN category_type ct ON ct.category_id = ca.category_id
             WHERE ca.participant_id = ?1
             ORDER BY ct.sort_order ASC, ct.category_id ASC",
        )?;
        let rows = stmt.query_map(params![participant_id], |row| {
            Ok(CategoryAssessment {
                participant_id: row.get(0)?,
                category_id: row.get(1)?,
                standard_rating: row.get(2)?,
                standard_score: row.get(3)?,
                individual_rating: row.get(4)?,
                individual_score: row.get(5)?,
                gap_rating: row.get(6)?,
                gap_score: row.get(7)?,
                conclusion: conclusion_column(row, 8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn aspect_assessment_count(&self) -> ScoringResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM aspect_assessment",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl AssessmentSource for AssessmentStore {
    fn participant(&self, participant_id: ParticipantId) -> ScoringResult<Option<Participant>> {
        let participant = self
            .conn
            .query_row(
                "SELECT participant_id, event_id, position_id, batch_id, name, test_number
                 FROM participant WHERE participant_id = ?1",
                params![participant_id],
                participant_row,
            )
            .optional()?;
        Ok(participant)
    }

    fn position(&self, position_id: PositionId) -> ScoringResult<Option<Position>> {
        let position = self
            .conn
            .query_row(
                "SELECT position_id, event_id, template_id, name
                 FROM position_formation WHERE position_id = ?1",
                params![position_id],
                |row| {
                    Ok(Position {
                        position_id: row.get(0)?,
                        event_id: row.get(1)?,
                        template_id: row.get(2)?,
                        name: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(position)
    }

    fn participants_in_scope(
        &self,
        event_id: EventId,
        position_id: PositionId,
    ) -> ScoringResult<Vec<Participant>> {
        let mut stmt = self.conn.prepare(
            "SELECT participant_id, event_id, position_id, batch_id, name, test_number
             FROM participant
             WHERE event_id = ?1 AND position_id = ?2
             ORDER BY participant_id ASC",
        )?;
        let rows = stmt.query_map(params![event_id, position_id], participant_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn participant_aspect_assessments(
        &self,
        participant_id: ParticipantId,
        aspect_ids: &[AspectId],
    ) -> ScoringResult<Vec<AspectAssessment>> {
        if aspect_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {ASPECT_ASSESSMENT_COLUMNS}
             FROM aspect_assessment aa
             WHERE aa.participant_id = ? AND aa.aspect_id IN ({})
             ORDER BY aa.aspect_id ASC",
            placeholders(aspect_ids.len())
        );
        let bind: Vec<i64> = std::iter::once(participant_id)
            .chain(aspect_ids.iter().copied())
            .collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind), aspect_assessment_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn scope_aspect_assessments(
        &self,
        event_id: EventId,
        position_id: PositionId,
        aspect_ids: &[AspectId],
    ) -> ScoringResult<Vec<AspectAssessment>> {
        if aspect_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {ASPECT_ASSESSMENT_COLUMNS}
             FROM aspect_assessment aa
             JOIN participant p ON p.participant_id = aa.participant_id
             WHERE p.event_id = ? AND p.position_id = ? AND aa.aspect_id IN ({})
             ORDER BY aa.participant_id ASC, aa.aspect_id ASC",
            placeholders(aspect_ids.len())
        );
        let bind: Vec<i64> = [event_id, position_id]
            .into_iter()
            .chain(aspect_ids.iter().copied())
            .collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind), aspect_assessment_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
