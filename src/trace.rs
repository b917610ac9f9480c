use crate::error::{AppError, Result};
use crate::grid::{CellKind, Coord};
use serde::{Deserialize, Serialize};

/// Message the solver attaches to the step that settles the end cell
pub const TARGET_REACHED: &str = "Target Reached!";

/// Cell reference carried inside a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRef {
    pub row: usize,
    pub col: usize,
    #[serde(rename = "type", default)]
    pub kind: CellKind,
    #[serde(
        default,
        alias = "totalCost",
        alias = "total_cost",
        skip_serializing_if = "Option::is_none"
    )]
    pub f_cost: Option<f64>,
}

impl NodeRef {
    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

/// Loosely-typed bag of solver state attached to a step. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepVariables {
    pub current: Option<NodeRef>,
    pub neighbors: Option<Vec<NodeRef>>,
    pub open_set_size: Option<usize>,
    pub closed_set_size: Option<usize>,
    pub message: Option<String>,
    /// Settled start-to-end path, only present on the final step of a solved trace
    pub path: Option<Vec<NodeRef>>,
}

/// One replayable unit of solver progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmStep {
    /// 1-based marker into the reference listing
    pub code_line: usize,
    pub explanation: String,
    #[serde(default)]
    pub variables: StepVariables,
}

impl AlgorithmStep {
    pub fn reached_target(&self) -> bool {
        self.variables.message.as_deref() == Some(TARGET_REACHED)
    }
}

/// Ordered trace plus the playback cursor.
///
/// The cursor is the index of the step currently on display. Policy about when
/// it moves lives in the playback controller.
#[derive(Debug, Default)]
pub struct TraceStore {
    steps: Vec<AlgorithmStep>,
    cursor: usize,
    revision: u64,
}

impl TraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole trace and rewind
    pub fn set_trace(&mut self, steps: Vec<AlgorithmStep>) {
        self.steps = steps;
        self.cursor = 0;
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        self.set_trace(Vec::new());
    }

    pub fn step_at(&self, index: usize) -> Result<&AlgorithmStep> {
        self.steps.get(index).ok_or(AppError::IndexOutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, index: usize) -> Result<()> {
        if index >= self.steps.len() {
            return Err(AppError::IndexOutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// Bumped on every `set_trace`; lets observers notice a new trace
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(line: usize) -> AlgorithmStep {
        AlgorithmStep {
            code_line: line,
            explanation: format!("line {line}"),
            variables: StepVariables::default(),
        }
    }

    #[test]
    fn test_set_trace_rewinds_cursor() {
        let mut store = TraceStore::new();
        store.set_trace(vec![step(1), step(2), step(3)]);
        store.set_cursor(2).unwrap();
        assert_eq!(store.cursor(), 2);

        let before = store.revision();
        store.set_trace(vec![step(4)]);
        assert_eq!(store.cursor(), 0);
        assert_eq!(store.len(), 1);
        assert!(store.revision() > before);
    }

    #[test]
    fn test_step_at_bounds() {
        let mut store = TraceStore::new();
        assert!(matches!(
            store.step_at(0),
            Err(AppError::IndexOutOfRange { index: 0, len: 0 })
        ));

        store.set_trace(vec![step(1), step(2)]);
        assert_eq!(store.step_at(1).unwrap().code_line, 2);
        assert!(matches!(
            store.step_at(2),
            Err(AppError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(store.set_cursor(2).is_err());
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = TraceStore::new();
        store.set_trace(vec![step(1)]);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.cursor(), 0);
    }

    #[test]
    fn test_step_parses_backend_payload() {
        let json = r#"{
            "code_line": 4,
            "explanation": "Found 2 valid neighbors.",
            "variables": {
                "current": {"row": 1, "col": 1, "type": "EMPTY"},
                "neighbors": [
                    {"row": 0, "col": 1, "type": "EMPTY"},
                    {"row": 2, "col": 1, "type": "END"}
                ],
                "open_set_size": null,
                "closed_set_size": null,
                "message": null
            },
            "grid_snapshot": null
        }"#;

        let step: AlgorithmStep = serde_json::from_str(json).unwrap();
        assert_eq!(step.code_line, 4);
        let current = step.variables.current.as_ref().unwrap();
        assert_eq!(current.coord(), Coord::new(1, 1));
        assert_eq!(current.f_cost, None);
        let neighbors = step.variables.neighbors.as_ref().unwrap();
        assert_eq!(neighbors[1].kind, CellKind::End);
        assert!(step.variables.path.is_none());
        assert!(!step.reached_target());
    }

    #[test]
    fn test_step_with_missing_variables() {
        let step: AlgorithmStep =
            serde_json::from_str(r#"{"code_line": 8, "explanation": "No path."}"#).unwrap();
        assert_eq!(step.variables, StepVariables::default());
    }

    #[test]
    fn test_final_step_carries_path_and_cost() {
        let json = r#"{
            "code_line": 3,
            "explanation": "Goal Reached!",
            "variables": {
                "current": {"row": 2, "col": 2, "type": "END", "totalCost": 4.0},
                "message": "Target Reached!",
                "path": [{"row": 0, "col": 0}, {"row": 0, "col": 1}]
            }
        }"#;
        let step: AlgorithmStep = serde_json::from_str(json).unwrap();
        assert!(step.reached_target());
        assert_eq!(step.variables.current.unwrap().f_cost, Some(4.0));
        assert_eq!(step.variables.path.unwrap().len(), 2);
    }
}
