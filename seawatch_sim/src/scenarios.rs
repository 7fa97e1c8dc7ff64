//! Scenario presets.

use crate::config::SimulationConfig;
use seawatch_core::{BehaviorWeights, ClassifierProfile};
use serde::{Deserialize, Serialize};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// Reference traffic mix, standard classifier
    Baseline,

    /// Reference traffic mix, enhanced classifier (RF and type checks)
    Enhanced,

    /// Every vessel carries an anomalous behavior
    HighThreat,

    /// Only normal traffic; any event is a false positive
    Quiet,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::Enhanced,
            ScenarioId::HighThreat,
            ScenarioId::Quiet,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::Enhanced => "enhanced",
            ScenarioId::HighThreat => "high_threat",
            ScenarioId::Quiet => "quiet",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "Reference mix: 40% normal, 15% each anomalous behavior",
            ScenarioId::Enhanced => "Reference mix with RF emission and vessel-type checks",
            ScenarioId::HighThreat => "No normal traffic, anomalous behaviors equally likely",
            ScenarioId::Quiet => "Normal traffic only, expects zero events",
        }
    }

    /// Applies the preset on top of a base configuration.
    pub fn apply(&self, config: &mut SimulationConfig) {
        match self {
            ScenarioId::Baseline => {
                config.profile = ClassifierProfile::Standard;
            }
            ScenarioId::Enhanced => {
                config.profile = ClassifierProfile::Enhanced;
            }
            ScenarioId::HighThreat => {
                config.behavior_weights = BehaviorWeights::all_anomalous();
            }
            ScenarioId::Quiet => {
                config.behavior_weights = BehaviorWeights::all_normal();
                // Research vessels near cables would trip the enhanced type check
                config.profile = ClassifierProfile::Standard;
            }
        }
    }

    /// Whether a finished run must have raised no events at all.
    pub fn expects_silence(&self) -> bool {
        matches!(self, ScenarioId::Quiet)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "reference" => Ok(ScenarioId::Baseline),
            "enhanced" => Ok(ScenarioId::Enhanced),
            "high_threat" | "highthreat" | "hostile" => Ok(ScenarioId::HighThreat),
            "quiet" => Ok(ScenarioId::Quiet),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
