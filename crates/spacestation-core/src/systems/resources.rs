//! Resource ledger - named stocks with optional caps and clamped updates

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::components::{Module, ResourceDelta, Sign};
use crate::config::{BuildingType, ResourceConfig, POPULATION};

/// One tracked resource.
///
/// `current` stays within `[0, max]`, or `>= 0` when there is no cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState {
    pub name: String,
    pub enabled: bool,
    pub current: f64,
    pub max: Option<f64>,
    /// Net change applied by the last tick
    pub delta_per_tick: f64,
}

impl ResourceState {
    pub fn from_config(config: &ResourceConfig) -> Self {
        let max = if config.has_max {
            Some(config.initial_max.unwrap_or(0.0))
        } else {
            None
        };
        Self {
            name: config.name.clone(),
            enabled: config.enabled_by_default,
            current: clamp_to_bounds(config.initial_current, max),
            max,
            delta_per_tick: 0.0,
        }
    }

    /// Add `amount` and pull the result back into bounds.
    pub fn apply(&mut self, amount: f64) {
        self.current = clamp_to_bounds(self.current + amount, self.max);
    }

    /// Fill ratio in `[0, 1]`; zero when uncapped or capped at zero.
    pub fn level(&self) -> f64 {
        match self.max {
            Some(max) if max > 0.0 => self.current / max,
            _ => 0.0,
        }
    }
}

fn clamp_to_bounds(value: f64, max: Option<f64>) -> f64 {
    let capped = match max {
        Some(max) => value.min(max),
        None => value,
    };
    capped.max(0.0)
}

/// All resources, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLedger {
    resources: IndexMap<String, ResourceState>,
}

impl ResourceLedger {
    pub fn from_config(configs: &[ResourceConfig]) -> Self {
        let resources = configs
            .iter()
            .map(|c| (c.name.clone(), ResourceState::from_config(c)))
            .collect();
        Self { resources }
    }

    pub fn from_states(states: impl IntoIterator<Item = ResourceState>) -> Self {
        Self {
            resources: states.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ResourceState> {
        self.resources.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ResourceState> {
        self.resources.get_mut(name)
    }

    /// Current amount, zero for unknown resources.
    pub fn current(&self, name: &str) -> f64 {
        self.get(name).map(|r| r.current).unwrap_or(0.0)
    }

    /// Fill ratio for presentation, zero for unknown resources.
    pub fn level(&self, name: &str) -> f64 {
        self.get(name).map(ResourceState::level).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceState> {
        self.resources.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ResourceState> {
        self.resources.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Apply each delta with the given sign, clamped.
    ///
    /// Unknown names and the derived population resource are skipped.
    pub fn apply_deltas(&mut self, deltas: &[ResourceDelta], sign: Sign) {
        for delta in deltas {
            if delta.resource == POPULATION {
                continue;
            }
            if let Some(resource) = self.resources.get_mut(&delta.resource) {
                resource.apply(sign.factor() * delta.amount);
            }
        }
    }

    /// Every cost entry names a known resource holding at least that amount.
    pub fn can_afford(&self, cost: &[ResourceDelta]) -> bool {
        cost.iter().all(|c| {
            self.resources
                .get(&c.resource)
                .map(|r| r.current >= c.amount)
                .unwrap_or(false)
        })
    }

    /// Commit an aggregated tick delta to every resource except population,
    /// recording each net change in `delta_per_tick`.
    pub fn apply_delta_map(&mut self, deltas: &DeltaMap) {
        for resource in self.resources.values_mut() {
            if resource.name == POPULATION {
                continue;
            }
            let amount = deltas.get(&resource.name);
            resource.apply(amount);
            resource.delta_per_tick = amount;
        }
    }
}

/// Per-resource sums accumulated over one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaMap(IndexMap<String, f64>);

impl DeltaMap {
    /// Start at zero for every resource in the ledger.
    pub fn zeroed(ledger: &ResourceLedger) -> Self {
        Self(ledger.names().map(|n| (n.to_string(), 0.0)).collect())
    }

    pub fn add(&mut self, deltas: &[ResourceDelta], sign: Sign) {
        for delta in deltas {
            *self.0.entry(delta.resource.clone()).or_insert(0.0) += sign.factor() * delta.amount;
        }
    }

    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }
}

/// Recompute caps: `initial max + sum of max bonuses of installed modules`.
pub fn recalc_maximums(
    ledger: &mut ResourceLedger,
    configs: &[ResourceConfig],
    modules: &[Module],
    building_types: &IndexMap<String, BuildingType>,
) {
    for config in configs.iter().filter(|c| c.has_max) {
        let bonus: f64 = modules
            .iter()
            .filter_map(|m| building_types.get(&m.type_id))
            .flat_map(|b| b.max_bonus.iter())
            .filter(|d| d.resource == config.name)
            .map(|d| d.amount)
            .sum();

        // Caps only grow while modules are never removed, so no re-clamp here.
        // Population may sit above its cap until housing catches up.
        if let Some(resource) = ledger.get_mut(&config.name) {
            resource.max = Some(config.initial_max.unwrap_or(0.0) + bonus);
        }
    }
}
