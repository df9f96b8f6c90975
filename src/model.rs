use serde::{Deserialize, Serialize};

/// Election state of a single area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaState {
    pub id: usize,

    pub color_distribution: Vec<f64>,
    pub voted_ordering: Vec<usize>,

    /// Percentage of member agents that voted in the last election.
    pub voter_turnout: u32,
    pub distance_to_reality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: usize,

    pub assets: f64,
    pub personality: Vec<f64>,

    pub participation_count: u64,
}

/// Snapshot of the world after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub tick: u64,

    pub areas: Vec<AreaState>,
    pub agents: Vec<AgentState>,
}
