//! Events system - scripted events gated by resource, time and quest state
//!
//! Flow is `idle -> popup active -> option chosen -> idle`. At most one popup
//! exists at a time and nothing new triggers while it is open.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::Sign;
use crate::config::{Condition, EventConfig, EventOption, QuestChange};
use crate::state::GameState;

/// An event definition together with its trigger progress
#[derive(Debug, Clone, PartialEq)]
pub struct GameEventState {
    pub config: EventConfig,
    pub has_triggered: bool,
}

impl GameEventState {
    pub fn new(config: EventConfig) -> Self {
        Self {
            config,
            has_triggered: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// `once` events stop being candidates after their first trigger.
    pub fn is_exhausted(&self) -> bool {
        self.config.once && self.has_triggered
    }
}

/// The event currently waiting for a player decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEventPopup {
    pub id: String,
    pub title: String,
    pub message: String,
    pub options: Vec<EventOption>,
}

impl ActiveEventPopup {
    pub fn from_config(config: &EventConfig) -> Self {
        Self {
            id: config.id.clone(),
            title: config.title.clone(),
            message: config.message.clone(),
            options: config.options.clone(),
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&EventOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

pub fn evaluate_condition(state: &GameState, condition: &Condition) -> bool {
    match condition {
        Condition::Resource {
            resource,
            comparator,
            value,
        } => state
            .resources
            .get(resource)
            .map(|r| comparator.compare(r.current, *value))
            .unwrap_or(false),
        Condition::Time {
            ticks_gte,
            days_gte,
        } => {
            ticks_gte.map_or(true, |t| state.ticks >= t) && days_gte.map_or(true, |d| state.days >= d)
        }
        Condition::QuestFlag {
            flag,
            comparator,
            value,
        } => {
            let current = state.quest_flags.get(flag).copied().unwrap_or(0);
            comparator.compare(current as f64, *value as f64)
        }
        Condition::QuestTimer {
            timer,
            comparator,
            value,
        } => {
            let current = state.quest_timers.get(timer).copied().unwrap_or(0);
            comparator.compare(current as f64, *value as f64)
        }
    }
}

pub fn are_all_conditions_met(state: &GameState, config: &EventConfig) -> bool {
    config
        .conditions
        .iter()
        .all(|c| evaluate_condition(state, c))
}

/// Open the first eligible event in catalog order, unless one is already open.
///
/// Returns the id of the event that became active.
pub fn check_events(state: &mut GameState) -> Option<String> {
    if state.active_event.is_some() {
        return None;
    }

    let popup = state
        .events
        .iter()
        .filter(|e| !e.is_exhausted())
        .find(|e| are_all_conditions_met(state, &e.config))
        .map(|e| ActiveEventPopup::from_config(&e.config))?;

    let id = popup.id.clone();
    log::info!("event triggered: {} ({})", popup.title, id);
    state.active_event = Some(popup);
    Some(id)
}

/// Apply a chosen option of the open popup and close it.
///
/// Does nothing when no popup is open.
pub fn apply_event_option_and_close(state: &mut GameState, option: &EventOption) {
    let Some(popup) = state.active_event.take() else {
        return;
    };

    state.resources.apply_deltas(&option.effects, Sign::Plus);
    apply_quest_changes(&mut state.quest_flags, &option.quest_flag_changes);
    apply_quest_changes(&mut state.quest_timers, &option.quest_timer_changes);

    for id in &option.enable_buildings {
        let unlocked = match state.building_types.get_mut(id) {
            Some(building) if !building.enabled => {
                building.enabled = true;
                Some(building.name.clone())
            }
            _ => None,
        };
        if let Some(name) = unlocked {
            state.notify(format!("New module unlocked: {}", name));
        }
    }

    for code in &option.enable_qualifications {
        let unlocked = match state.qualifications.get_mut(code) {
            Some(qualification) if !qualification.enabled => {
                qualification.enabled = true;
                Some(qualification.title.clone())
            }
            _ => None,
        };
        if let Some(title) = unlocked {
            state.notify(format!("New qualification available: {}", title));
        }
    }

    if let Some(event) = state.events.iter_mut().find(|e| e.config.id == popup.id) {
        event.has_triggered = true;
    }

    state.notify(format!("Event completed: {} - {}", popup.title, option.text));
}

/// Apply a sequence of quest flag or timer changes to a sparse store.
pub fn apply_quest_changes(store: &mut BTreeMap<String, i64>, changes: &[QuestChange]) {
    for change in changes {
        match change {
            QuestChange::Set { id, value } => {
                store.insert(id.clone(), *value);
            }
            QuestChange::Add { id, value } => {
                let entry = store.entry(id.clone()).or_insert(0);
                *entry = entry.saturating_add(*value);
            }
            QuestChange::Delete { id } => {
                store.remove(id);
            }
        }
    }
}

/// Count every positive quest timer down by one, stopping at zero.
pub fn tick_quest_timers(state: &mut GameState) {
    for value in state.quest_timers.values_mut() {
        if *value > 0 {
            *value -= 1;
        }
    }
}
