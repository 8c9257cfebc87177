//! Static game configuration: resources, building types, qualifications and
//! scripted events.
//!
//! The configuration is immutable once loaded. Anything the game unlocks at
//! runtime (buildings, qualifications) is copied into [`crate::state::GameState`]
//! first and mutated there.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::components::{Comparator, ResourceDelta};
use crate::error::ConfigError;

/// Built-in station definition shipped with the crate.
pub const BUILTIN_STATION_CONFIG: &str = include_str!("../../../data/station.json");

/// Name of the resource that is derived from the head count.
pub const POPULATION: &str = "population";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u64,
    #[serde(default = "default_starting_people")]
    pub starting_people: u32,
    #[serde(default)]
    pub spawn: SpawnConfig,
    #[serde(default)]
    pub person_template: PersonTemplate,
    pub resources: Vec<ResourceConfig>,
    pub buildings: Vec<BuildingType>,
    #[serde(default)]
    pub qualifications: Vec<Qualification>,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

fn default_ticks_per_day() -> u64 {
    40
}

fn default_starting_people() -> u32 {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 10,
        }
    }
}

/// Where and how often new residents arrive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnConfig {
    pub building_type: String,
    pub chance_per_building: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            building_type: "dock".to_string(),
            chance_per_building: 0.02,
        }
    }
}

/// Upkeep every new person starts with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonTemplate {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub income_per_tick: Vec<ResourceDelta>,
    #[serde(default)]
    pub needs_per_tick: Vec<ResourceDelta>,
}

impl Default for PersonTemplate {
    fn default() -> Self {
        Self {
            tags: vec!["citizen".to_string()],
            income_per_tick: vec![ResourceDelta::new("money", 0.5)],
            needs_per_tick: vec![
                ResourceDelta::new("oxygen", 0.2),
                ResourceDelta::new("energy", 0.1),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    pub name: String,
    #[serde(default)]
    pub has_max: bool,
    #[serde(default)]
    pub initial_current: f64,
    #[serde(default)]
    pub initial_max: Option<f64>,
    #[serde(default = "default_true")]
    pub enabled_by_default: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSize {
    pub width: u32,
    pub height: u32,
}

impl Default for BuildingSize {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

/// A buildable module type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size: BuildingSize,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub cost: Vec<ResourceDelta>,
    /// Output per tick. Added once as base, again per qualified worker.
    #[serde(default)]
    pub per_tick: Vec<ResourceDelta>,
    /// Added to the resource maximum while the module stands
    #[serde(default)]
    pub max_bonus: Vec<ResourceDelta>,
    #[serde(default)]
    pub required_qualifications: Vec<String>,
    #[serde(default)]
    pub bonus_qualifications: Vec<String>,
    /// Zero means unlimited
    #[serde(default)]
    pub worker_max: u32,
    #[serde(default = "default_true")]
    pub active_by_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Qualification {
    pub code: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub costs: Vec<ResourceDelta>,
    pub learning_duration: u32,
}

/// A scripted event: fires when every condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_true")]
    pub once: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub options: Vec<EventOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    Resource {
        resource: String,
        comparator: Comparator,
        value: f64,
    },
    /// Every threshold that is present must be reached
    Time {
        #[serde(rename = "ticksGte", default)]
        ticks_gte: Option<u64>,
        #[serde(rename = "daysGte", default)]
        days_gte: Option<u64>,
    },
    QuestFlag {
        flag: String,
        comparator: Comparator,
        value: i64,
    },
    QuestTimer {
        timer: String,
        comparator: Comparator,
        value: i64,
    },
}

/// Mutation of a quest flag or timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum QuestChange {
    Set {
        id: String,
        #[serde(default)]
        value: i64,
    },
    Add {
        id: String,
        #[serde(default)]
        value: i64,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub effects: Vec<ResourceDelta>,
    #[serde(default)]
    pub enable_buildings: Vec<String>,
    #[serde(default)]
    pub enable_qualifications: Vec<String>,
    #[serde(default)]
    pub quest_flag_changes: Vec<QuestChange>,
    #[serde(default)]
    pub quest_timer_changes: Vec<QuestChange>,
}

/// What kind of problem a [`ConfigIssue`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    UnknownResource,
    UnknownBuilding,
    UnknownQualification,
    Duplicate,
    ZeroSize,
    MissingPopulation,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueKind::UnknownResource => "unknown resource",
            IssueKind::UnknownBuilding => "unknown building",
            IssueKind::UnknownQualification => "unknown qualification",
            IssueKind::Duplicate => "duplicate id",
            IssueKind::ZeroSize => "zero size",
            IssueKind::MissingPopulation => "missing population resource",
        };
        f.write_str(label)
    }
}

/// One validation finding: kind, where it was found, offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub kind: IssueKind,
    pub location: String,
    pub value: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' in {}", self.kind, self.value, self.location)
    }
}

impl GameConfig {
    /// The station definition embedded in the crate.
    pub fn builtin() -> Result<Arc<Self>, ConfigError> {
        Self::from_json_str(BUILTIN_STATION_CONFIG).map(Arc::new)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn building(&self, id: &str) -> Option<&BuildingType> {
        self.buildings.iter().find(|b| b.id == id)
    }

    pub fn qualification(&self, code: &str) -> Option<&Qualification> {
        self.qualifications.iter().find(|q| q.code == code)
    }

    pub fn event(&self, id: &str) -> Option<&EventConfig> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Check every cross reference, collecting all issues.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            for issue in &issues {
                log::warn!("config: {}", issue);
            }
            Err(ConfigError::Invalid(issues))
        }
    }

    /// All validation findings, empty when the config is sound.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut checker = Checker {
            resources: self.resources.iter().map(|r| r.name.as_str()).collect(),
            buildings: self.buildings.iter().map(|b| b.id.as_str()).collect(),
            qualifications: self
                .qualifications
                .iter()
                .map(|q| q.code.as_str())
                .collect(),
            issues: Vec::new(),
        };

        if self.grid.width == 0 || self.grid.height == 0 {
            checker.push(
                IssueKind::ZeroSize,
                "grid",
                format!("{}x{}", self.grid.width, self.grid.height),
            );
        }
        if !checker.resources.contains(POPULATION) {
            checker.push(IssueKind::MissingPopulation, "resources", POPULATION);
        }

        checker.duplicates("resources", self.resources.iter().map(|r| r.name.as_str()));
        checker.duplicates("buildings", self.buildings.iter().map(|b| b.id.as_str()));
        checker.duplicates(
            "qualifications",
            self.qualifications.iter().map(|q| q.code.as_str()),
        );
        checker.duplicates("events", self.events.iter().map(|e| e.id.as_str()));

        checker.deltas("personTemplate.incomePerTick", &self.person_template.income_per_tick);
        checker.deltas("personTemplate.needsPerTick", &self.person_template.needs_per_tick);
        checker.building_ref("spawn.buildingType", &self.spawn.building_type);

        for building in &self.buildings {
            let at = |field: &str| format!("building '{}' {}", building.id, field);
            if building.size.width == 0 || building.size.height == 0 {
                checker.push(
                    IssueKind::ZeroSize,
                    at("size"),
                    format!("{}x{}", building.size.width, building.size.height),
                );
            }
            checker.deltas(&at("cost"), &building.cost);
            checker.deltas(&at("perTick"), &building.per_tick);
            checker.deltas(&at("maxBonus"), &building.max_bonus);
            for code in &building.required_qualifications {
                checker.qualification_ref(&at("requiredQualifications"), code);
            }
            for code in &building.bonus_qualifications {
                checker.qualification_ref(&at("bonusQualifications"), code);
            }
        }

        for qualification in &self.qualifications {
            checker.deltas(
                &format!("qualification '{}' costs", qualification.code),
                &qualification.costs,
            );
        }

        for event in &self.events {
            for condition in &event.conditions {
                if let Condition::Resource { resource, .. } = condition {
                    checker.resource_ref(&format!("event '{}' conditions", event.id), resource);
                }
            }
            for option in &event.options {
                let at = |field: &str| format!("event '{}' option '{}' {}", event.id, option.id, field);
                checker.deltas(&at("effects"), &option.effects);
                for id in &option.enable_buildings {
                    checker.building_ref(&at("enableBuildings"), id);
                }
                for code in &option.enable_qualifications {
                    checker.qualification_ref(&at("enableQualifications"), code);
                }
            }
        }

        checker.issues
    }
}

struct Checker<'a> {
    resources: HashSet<&'a str>,
    buildings: HashSet<&'a str>,
    qualifications: HashSet<&'a str>,
    issues: Vec<ConfigIssue>,
}

impl<'a> Checker<'a> {
    fn push(&mut self, kind: IssueKind, location: impl Into<String>, value: impl Into<String>) {
        self.issues.push(ConfigIssue {
            kind,
            location: location.into(),
            value: value.into(),
        });
    }

    fn resource_ref(&mut self, location: &str, name: &str) {
        if !self.resources.contains(name) {
            self.push(IssueKind::UnknownResource, location, name);
        }
    }

    fn building_ref(&mut self, location: &str, id: &str) {
        if !self.buildings.contains(id) {
            self.push(IssueKind::UnknownBuilding, location, id);
        }
    }

    fn qualification_ref(&mut self, location: &str, code: &str) {
        if !self.qualifications.contains(code) {
            self.push(IssueKind::UnknownQualification, location, code);
        }
    }

    fn deltas(&mut self, location: &str, deltas: &[ResourceDelta]) {
        for delta in deltas {
            self.resource_ref(location, &delta.resource);
        }
    }

    fn duplicates<'b>(&mut self, location: &str, ids: impl Iterator<Item = &'b str>) {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                self.push(IssueKind::Duplicate, location, id);
            }
        }
    }
}
