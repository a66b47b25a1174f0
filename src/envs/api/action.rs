use crate::common::defs::Discrete;
use crate::error::MdpError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "Increase_CPU")]
    IncreaseCpu,
    #[serde(rename = "Increase_CPU_Slightly")]
    IncreaseCpuSlightly,
    #[serde(rename = "Decrease_CPU")]
    DecreaseCpu,
    #[serde(rename = "Decrease_CPU_Slightly")]
    DecreaseCpuSlightly,
    #[serde(rename = "Corrective_Maintenance")]
    CorrectiveMaintenance,
    #[serde(rename = "Preventive_Maintenance")]
    PreventiveMaintenance,
    #[serde(rename = "Restart_Components")]
    RestartComponents,
    #[serde(rename = "Update_Version")]
    UpdateVersion,
    #[serde(rename = "Rollback_Version")]
    RollbackVersion,
    #[serde(rename = "Add_Memory")]
    AddMemory,
    #[serde(rename = "Remove_Memory")]
    RemoveMemory,
}

/// Selects the range the primary outcome probability is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    CpuScaling,
    Maintenance,
    Restart,
    Memory,
    Other,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Action::IncreaseCpu,
        Action::IncreaseCpuSlightly,
        Action::DecreaseCpu,
        Action::DecreaseCpuSlightly,
        Action::CorrectiveMaintenance,
        Action::PreventiveMaintenance,
        Action::RestartComponents,
        Action::UpdateVersion,
        Action::RollbackVersion,
        Action::AddMemory,
        Action::RemoveMemory,
    ];

    pub const COUNT: usize = 11;

    pub fn label(&self) -> &'static str {
        match self {
            Action::IncreaseCpu => "Increase_CPU",
            Action::IncreaseCpuSlightly => "Increase_CPU_Slightly",
            Action::DecreaseCpu => "Decrease_CPU",
            Action::DecreaseCpuSlightly => "Decrease_CPU_Slightly",
            Action::CorrectiveMaintenance => "Corrective_Maintenance",
            Action::PreventiveMaintenance => "Preventive_Maintenance",
            Action::RestartComponents => "Restart_Components",
            Action::UpdateVersion => "Update_Version",
            Action::RollbackVersion => "Rollback_Version",
            Action::AddMemory => "Add_Memory",
            Action::RemoveMemory => "Remove_Memory",
        }
    }

    pub fn index(&self) -> Discrete {
        *self as Discrete
    }

    pub fn from_index(a: Discrete) -> Option<Action> {
        Self::ALL.get(a).copied()
    }

    pub fn class(&self) -> ActionClass {
        match self {
            Action::IncreaseCpu | Action::DecreaseCpu => ActionClass::CpuScaling,
            Action::CorrectiveMaintenance | Action::PreventiveMaintenance => {
                ActionClass::Maintenance
            }
            Action::RestartComponents => ActionClass::Restart,
            Action::AddMemory | Action::RemoveMemory => ActionClass::Memory,
            _ => ActionClass::Other,
        }
    }

    /// Actions that reset speed, capacity and health together.
    pub fn is_maintenance(&self) -> bool {
        matches!(
            self,
            Action::CorrectiveMaintenance
                | Action::PreventiveMaintenance
                | Action::RestartComponents
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Action {
    type Err = MdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|a| a.label() == s)
            .copied()
            .ok_or_else(|| MdpError::UnknownAction(s.to_string()))
    }
}
