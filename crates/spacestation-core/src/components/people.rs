//! People-related components: Person, Name, Upkeep, Assignment, Training, etc.
//!
//! Every resident is a `hecs` entity carrying the full set of components
//! below. `Training` is the only optional one: it is inserted when a course
//! starts and removed when the qualification is granted.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use super::common::ResourceDelta;

/// Marker component identifying an entity as a person
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Person;

/// Stable `p_NNN` identifier, referenced by module worker lists
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub given: String,
    pub family: String,
}

impl Name {
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            given: given.into(),
            family: family.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.given, self.family)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.given, self.family)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(pub Vec<String>);

/// What a person contributes and consumes every tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upkeep {
    pub income_per_tick: Vec<ResourceDelta>,
    pub needs_per_tick: Vec<ResourceDelta>,
}

/// The module this person works in, if any.
///
/// Must agree with the module's worker list at all times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub work: Option<String>,
}

/// Remaining ticks this person cannot be assigned or counted as a worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub unavailable_for: u32,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        self.unavailable_for == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifications(pub Vec<String>);

impl Qualifications {
    pub fn has(&self, code: &str) -> bool {
        self.0.iter().any(|q| q == code)
    }

    /// True when every code in `required` is held (vacuously true for none).
    pub fn has_all(&self, required: &[String]) -> bool {
        required.iter().all(|code| self.has(code))
    }

    pub fn has_any(&self, codes: &[String]) -> bool {
        codes.iter().any(|code| self.has(code))
    }

    /// Idempotent add.
    pub fn grant(&mut self, code: &str) {
        if !self.has(code) {
            self.0.push(code.to_string());
        }
    }
}

/// An in-progress course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub qualification_code: String,
    pub remaining_ticks: u32,
}

/// Flat, serializable view of one person.
///
/// This is what the presentation layer reads and what save files store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub id: String,
    pub name: Name,
    pub tags: Vec<String>,
    pub income_per_tick: Vec<ResourceDelta>,
    pub needs_per_tick: Vec<ResourceDelta>,
    pub work: Option<String>,
    pub unavailable_for: u32,
    pub qualifications: Vec<String>,
    pub training: Option<Training>,
}

/// Spawn a person entity from its record.
pub fn spawn_person(world: &mut World, record: PersonRecord) -> Entity {
    let entity = world.spawn((
        Person,
        PersonId(record.id),
        record.name,
        Tags(record.tags),
        Upkeep {
            income_per_tick: record.income_per_tick,
            needs_per_tick: record.needs_per_tick,
        },
        Assignment { work: record.work },
        Availability {
            unavailable_for: record.unavailable_for,
        },
        Qualifications(record.qualifications),
    ));

    if let Some(training) = record.training {
        let _ = world.insert_one(entity, training);
    }

    entity
}

/// Find the entity carrying the given person id.
pub fn find_person(world: &World, id: &str) -> Option<Entity> {
    for (entity, person_id) in world.query::<&PersonId>().iter() {
        if person_id.0 == id {
            return Some(entity);
        }
    }
    None
}

/// Count living people.
pub fn person_count(world: &World) -> usize {
    world.query::<&Person>().iter().count()
}

/// Display name of a person, falling back to the id.
pub fn person_name(world: &World, entity: Entity) -> String {
    match world.get::<&Name>(entity) {
        Ok(name) => name.full_name(),
        Err(_) => world
            .get::<&PersonId>(entity)
            .map(|id| id.0.clone())
            .unwrap_or_default(),
    }
}

/// Read one person back into a flat record.
pub fn person_record(world: &World, entity: Entity) -> Option<PersonRecord> {
    let entity_ref = world.entity(entity).ok()?;

    let id = entity_ref.get::<&PersonId>()?;
    let name = entity_ref.get::<&Name>()?;
    let tags = entity_ref.get::<&Tags>()?;
    let upkeep = entity_ref.get::<&Upkeep>()?;
    let assignment = entity_ref.get::<&Assignment>()?;
    let availability = entity_ref.get::<&Availability>()?;
    let qualifications = entity_ref.get::<&Qualifications>()?;
    let training = entity_ref.get::<&Training>().map(|t| (*t).clone());

    Some(PersonRecord {
        id: id.0.clone(),
        name: (*name).clone(),
        tags: tags.0.clone(),
        income_per_tick: upkeep.income_per_tick.clone(),
        needs_per_tick: upkeep.needs_per_tick.clone(),
        work: assignment.work.clone(),
        unavailable_for: availability.unavailable_for,
        qualifications: qualifications.0.clone(),
        training,
    })
}

/// Entities of all people, ordered by their numeric id suffix.
pub fn person_entities(world: &World) -> Vec<Entity> {
    let mut entities: Vec<(u32, String, Entity)> = world
        .query::<(&Person, &PersonId)>()
        .iter()
        .map(|(entity, (_, id))| (id_number(&id.0), id.0.clone(), entity))
        .collect();
    entities.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    entities.into_iter().map(|(_, _, entity)| entity).collect()
}

/// All people as flat records, ordered by id.
pub fn person_records(world: &World) -> Vec<PersonRecord> {
    person_entities(world)
        .into_iter()
        .filter_map(|entity| person_record(world, entity))
        .collect()
}

fn id_number(id: &str) -> u32 {
    id.rsplit('_')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX)
}
