use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 200;

/// A stored run of the flight-share cost simulator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationRun {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<String>,
    pub scenario: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
    #[serde(default)]
    pub results: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
