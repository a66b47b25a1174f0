use crate::envs::api::{Action, ActionClass, Availability, Capacity, Health, Speed, State};
use crate::error::{MdpError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Environment configuration. Reward and penalty maps are keyed by label and must be complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    pub rewards: RewardWeights,

    pub action_penalties: BTreeMap<String, f64>,

    #[serde(default)]
    pub probabilities: ProbabilityRanges,

    #[serde(default = "default_initial_state")]
    pub initial_state: State,

    #[serde(default = "default_terminal_state")]
    pub terminal_state: State,
}

/// Per-factor reward terms; a state's reward is the sum of its four terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    pub availability: BTreeMap<String, f64>,
    pub speed: BTreeMap<String, f64>,
    pub health: BTreeMap<String, f64>,
    pub capacity: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbRange {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbabilityRanges {
    pub cpu_scaling: ProbRange,
    pub maintenance: ProbRange,
    pub restart: ProbRange,
    pub memory: ProbRange,
    pub default: ProbRange,
    pub secondary: ProbRange,
}

fn default_initial_state() -> State {
    State::new(
        Availability::Offline,
        Speed::Slow,
        Health::Error,
        Capacity::Medium,
    )
}

fn default_terminal_state() -> State {
    State::new(
        Availability::Available,
        Speed::Fast,
        Health::Healthy,
        Capacity::High,
    )
}

fn weights(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            availability: weights(&[("Available", 5.), ("Offline", -40.)]),
            speed: weights(&[("Fast", 7.), ("Medium", -2.), ("Slow", -5.)]),
            health: weights(&[("Healthy", 5.), ("Error", -10.), ("Overloaded", -8.)]),
            capacity: weights(&[("Low", -5.), ("Medium", -1.), ("High", 2.)]),
        }
    }
}

impl Default for ProbabilityRanges {
    fn default() -> Self {
        Self {
            cpu_scaling: ProbRange::new(0.7, 0.9),
            maintenance: ProbRange::new(0.6, 0.7),
            restart: ProbRange::new(0.8, 0.95),
            memory: ProbRange::new(0.65, 0.85),
            default: ProbRange::new(0.7, 0.85),
            secondary: ProbRange::new(0.05, 0.2),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            rewards: RewardWeights::default(),
            action_penalties: weights(&[
                ("Increase_CPU", -120.),
                ("Increase_CPU_Slightly", -20.),
                ("Decrease_CPU", 3.),
                ("Decrease_CPU_Slightly", 2.),
                ("Corrective_Maintenance", -7.),
                ("Preventive_Maintenance", -3.),
                ("Restart_Components", -4.),
                ("Update_Version", -6.),
                ("Rollback_Version", -16.),
                ("Add_Memory", -95.),
                ("Remove_Memory", -2.),
            ]),
            probabilities: ProbabilityRanges::default(),
            initial_state: default_initial_state(),
            terminal_state: default_terminal_state(),
        }
    }
}

impl ProbRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    fn check(&self, name: &str) -> Result<()> {
        if 0. <= self.low && self.low <= self.high && self.high <= 1. {
            Ok(())
        } else {
            Err(MdpError::InvalidRange {
                name: name.to_string(),
                low: self.low,
                high: self.high,
            })
        }
    }
}

impl ProbabilityRanges {
    /// Range of the primary outcome's probability for an action.
    pub fn primary(&self, action: Action) -> ProbRange {
        match action.class() {
            ActionClass::CpuScaling => self.cpu_scaling,
            ActionClass::Maintenance => self.maintenance,
            ActionClass::Restart => self.restart,
            ActionClass::Memory => self.memory,
            ActionClass::Other => self.default,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.cpu_scaling.check("cpu_scaling")?;
        self.maintenance.check("maintenance")?;
        self.restart.check("restart")?;
        self.memory.check("memory")?;
        self.default.check("default")?;
        self.secondary.check("secondary")
    }
}

impl EnvConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config = serde_json::from_str::<EnvConfig>(json)?;
        config.probabilities.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}
