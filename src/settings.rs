use serde::{Deserialize, Serialize};

pub const MIN_WEIGHT: f32 = 1.0;
pub const MAX_WEIGHT: f32 = 5.0;

/// Search algorithm requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    AStar,
}

impl Algorithm {
    pub fn name(&self) -> &str {
        match self {
            Algorithm::AStar => "A*",
        }
    }
}

/// Distance estimate the backend uses for h
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    /// |dr| + |dc|
    #[default]
    Manhattan,
    /// Straight-line distance
    Euclidean,
    /// Octile distance
    Diagonal,
}

impl Heuristic {
    pub fn name(&self) -> &str {
        match self {
            Heuristic::Manhattan => "Manhattan",
            Heuristic::Euclidean => "Euclidean",
            Heuristic::Diagonal => "Diagonal",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Heuristic::Manhattan => Heuristic::Euclidean,
            Heuristic::Euclidean => Heuristic::Diagonal,
            Heuristic::Diagonal => Heuristic::Manhattan,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Heuristic::Manhattan => Heuristic::Diagonal,
            Heuristic::Euclidean => Heuristic::Manhattan,
            Heuristic::Diagonal => Heuristic::Euclidean,
        }
    }
}

/// How the backend breaks ties between equal f scores
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreaker {
    #[default]
    None,
    /// Prefer nodes close to the start-end line (cross product nudge)
    Cross,
    Nudged,
}

impl TieBreaker {
    pub fn name(&self) -> &str {
        match self {
            TieBreaker::None => "None",
            TieBreaker::Cross => "Cross Product",
            TieBreaker::Nudged => "Nudged",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            TieBreaker::None => TieBreaker::Cross,
            TieBreaker::Cross => TieBreaker::Nudged,
            TieBreaker::Nudged => TieBreaker::None,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            TieBreaker::None => TieBreaker::Nudged,
            TieBreaker::Cross => TieBreaker::None,
            TieBreaker::Nudged => TieBreaker::Cross,
        }
    }
}

/// Options forwarded verbatim to the solver. Nothing here is interpreted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub algorithm: Algorithm,
    pub heuristic: Heuristic,
    /// Multiplier on h (1.0-5.0, 1.0 = plain A*)
    pub weight: f32,
    pub k: u32,
    pub tie_breaker: TieBreaker,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::AStar,
            heuristic: Heuristic::Manhattan,
            weight: 1.0,
            k: 1,
            tie_breaker: TieBreaker::None,
        }
    }
}

impl SolverConfig {
    pub fn adjust_weight(&mut self, delta: f32) {
        let stepped = ((self.weight + delta) * 10.0).round() / 10.0;
        self.weight = stepped.clamp(MIN_WEIGHT, MAX_WEIGHT);
    }
}
