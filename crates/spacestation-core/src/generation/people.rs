//! Resident generation

use hecs::{Entity, World};
use rand::seq::SliceRandom;
use rand::Rng;

use super::names::generate_name;
use crate::components::*;
use crate::config::PersonTemplate;

/// Build a new resident from the template with a random name and one
/// starting qualification drawn from `qualification_pool`.
pub fn create_random_person(
    id: String,
    template: &PersonTemplate,
    qualification_pool: &[String],
    rng: &mut impl Rng,
) -> PersonRecord {
    let name = generate_name(rng);
    let qualifications = qualification_pool
        .choose(rng)
        .map(|code| vec![code.clone()])
        .unwrap_or_default();

    PersonRecord {
        id,
        name,
        tags: template.tags.clone(),
        income_per_tick: template.income_per_tick.clone(),
        needs_per_tick: template.needs_per_tick.clone(),
        work: None,
        unavailable_for: 0,
        qualifications,
        training: None,
    }
}

/// Spawn `count` residents, allocating their ids from `ids`.
pub fn generate_people(
    world: &mut World,
    ids: &mut IdSequence,
    count: u32,
    template: &PersonTemplate,
    qualification_pool: &[String],
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let mut entities = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let record = create_random_person(ids.allocate(), template, qualification_pool, rng);
        entities.push(spawn_person(world, record));
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_people_allocates_sequential_ids() {
        let mut world = World::new();
        let mut ids = IdSequence::new("p_");
        let mut rng = StdRng::seed_from_u64(42);
        let pool = vec!["tech_basic".to_string(), "engineer".to_string()];

        let entities = generate_people(
            &mut world,
            &mut ids,
            3,
            &PersonTemplate::default(),
            &pool,
            &mut rng,
        );
        assert_eq!(entities.len(), 3);

        let records = person_records(&world);
        let ids: Vec<&str> = records.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p_001", "p_002", "p_003"]);
        for person in &records {
            assert_eq!(person.qualifications.len(), 1);
            assert!(pool.contains(&person.qualifications[0]));
            assert_eq!(person.tags, vec!["citizen".to_string()]);
            assert!(person.work.is_none());
        }
    }

    #[test]
    fn test_empty_pool_gives_no_qualification() {
        let mut rng = StdRng::seed_from_u64(1);
        let person = create_random_person("p_001".into(), &PersonTemplate::default(), &[], &mut rng);
        assert!(person.qualifications.is_empty());
    }
}
