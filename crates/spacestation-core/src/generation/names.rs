//! Name generation utilities

use crate::components::Name;
use rand::Rng;

/// Generate a random name
pub fn generate_name(rng: &mut impl Rng) -> Name {
    let given = GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())];
    let family = FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())];

    Name::new(given, family)
}

static GIVEN_NAMES: &[&str] = &[
    "Jax", "Mara", "Dex", "Nova", "Rin", "Zoe", "Kade", "Vex", "Ilya", "Suri", "Tamsin", "Oren",
    "Lio", "Petra", "Anouk", "Joon", "Keiko", "Bram", "Selin", "Tavi",
];

static FAMILY_NAMES: &[&str] = &[
    "Vega", "Ishikawa", "Black", "Kwon", "Nyx", "Ortiz", "Kade", "Flux", "Okafor", "Lindqvist",
    "Moreau", "Haddad", "Castellanos", "Novak", "Adeyemi", "Sato",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_name_uses_lists() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let name = generate_name(&mut rng);
            assert!(GIVEN_NAMES.contains(&name.given.as_str()));
            assert!(FAMILY_NAMES.contains(&name.family.as_str()));
        }
    }
}
