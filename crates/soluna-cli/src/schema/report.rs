use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use soluna_engine::{Player, Position};
use soluna_solver::{
    record::{EvaluationRecord, MoveExplanation},
    set_cover::SetCoverSolution,
};

/// Read-only projection of a record store, one sheet per ply
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Timestamp when the report was generated (ISO 8601 format)
    pub generated_at: DateTime<Utc>,
    pub store: String,
    pub sheets: Vec<PlySheet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlySheet {
    pub ply: usize,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub id: u32,
    pub state: Position,
    /// One line per nonempty pile, e.g. `2A 2A\n2B 1B\n5C`
    pub board: String,
    /// Player who can force a win (`1` / `-1`)
    pub value: Player,
    pub is_determined: bool,
    pub best_move: Option<Position>,
    pub explanation: Option<MoveExplanation>,
}

impl ExportReport {
    pub fn new(store: String, records: Vec<EvaluationRecord>) -> Self {
        let mut sheets = BTreeMap::<usize, Vec<ReportRow>>::new();
        for record in records {
            sheets
                .entry(record.move_num)
                .or_default()
                .push(ReportRow::from(record));
        }
        Self {
            generated_at: Utc::now(),
            store,
            sheets: sheets
                .into_iter()
                .map(|(ply, rows)| PlySheet { ply, rows })
                .collect(),
        }
    }
}

impl From<EvaluationRecord> for ReportRow {
    fn from(record: EvaluationRecord) -> Self {
        Self {
            id: record.id,
            board: record.state.to_string(),
            state: record.state,
            value: record.eval,
            is_determined: record.is_determined,
            best_move: record.best_move,
            explanation: record.move_explanation,
        }
    }
}

/// Result of the set-cover reduction of player 2's first move
#[derive(Debug, Clone, Serialize)]
pub struct SetCoverReport {
    pub generated_at: DateTime<Utc>,
    pub universe_size: usize,
    pub candidate_count: usize,
    /// Positions player 2 has to remember
    pub anchor_count: usize,
    pub solution: SetCoverSolution<Position>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_grouped_by_ply() {
        let start = Position::new([vec![4], vec![4], vec![4], vec![]]).unwrap();
        let child = Position::new([vec![8], vec![4], vec![], vec![]]).unwrap();
        let records = vec![
            EvaluationRecord::new(1, child.clone(), Player::Second),
            EvaluationRecord::new(2, start.clone(), Player::Second),
        ];
        let report = ExportReport::new("test.json".to_owned(), records);

        let plies = report.sheets.iter().map(|s| s.ply).collect::<Vec<_>>();
        assert_eq!(plies, [10, 11]);
        assert_eq!(report.sheets[0].rows[0].state, start);
        assert_eq!(report.sheets[1].rows[0].board, "8A\n4B");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sheets"][0]["rows"][0]["value"], -1);
        assert_eq!(json["sheets"][1]["rows"][0]["state"], "[[8], [4], [], []]");
    }
}
