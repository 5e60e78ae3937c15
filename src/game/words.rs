//! Word Catalog
//!
//! Static per-language category tables the engine draws secret words from.
//! Unknown languages fall back to English so a bad client hint can never
//! fail a game start.

use crate::game::rng::RandomSource;

/// Fallback language used when a request names an unknown one.
pub const DEFAULT_LANGUAGE: &str = "en";

type CategoryTable = &'static [(&'static str, &'static [&'static str])];

static EN: CategoryTable = &[
    (
        "Animals",
        &[
            "Cat", "Dog", "Elephant", "Penguin", "Dolphin", "Eagle", "Rabbit", "Tiger",
            "Octopus", "Kangaroo", "Owl", "Horse",
        ],
    ),
    (
        "Food",
        &[
            "Pizza", "Sushi", "Pancake", "Burger", "Taco", "Lasagna", "Croissant", "Salad",
            "Dumpling", "Waffle", "Curry", "Sandwich",
        ],
    ),
    (
        "Places",
        &[
            "Beach", "Library", "Airport", "Hospital", "Cinema", "Museum", "Stadium", "Castle",
            "Desert", "Harbor", "School", "Bakery",
        ],
    ),
    (
        "Professions",
        &[
            "Teacher", "Pilot", "Chef", "Firefighter", "Dentist", "Plumber", "Architect",
            "Journalist", "Farmer", "Magician", "Surgeon", "Barista",
        ],
    ),
    (
        "Objects",
        &[
            "Umbrella", "Backpack", "Telescope", "Ladder", "Candle", "Mirror", "Scissors",
            "Compass", "Pillow", "Kettle", "Hammer", "Violin",
        ],
    ),
    (
        "Sports",
        &[
            "Football", "Tennis", "Swimming", "Boxing", "Golf", "Volleyball", "Skiing",
            "Archery", "Cycling", "Karate", "Rowing", "Surfing",
        ],
    ),
];

static ES: CategoryTable = &[
    (
        "Animales",
        &[
            "Gato", "Perro", "Elefante", "Pinguino", "Delfin", "Aguila", "Conejo", "Tigre",
            "Pulpo", "Canguro", "Buho", "Caballo",
        ],
    ),
    (
        "Comida",
        &[
            "Pizza", "Sushi", "Tortilla", "Hamburguesa", "Taco", "Paella", "Empanada",
            "Ensalada", "Churro", "Gazpacho", "Flan", "Bocadillo",
        ],
    ),
    (
        "Lugares",
        &[
            "Playa", "Biblioteca", "Aeropuerto", "Hospital", "Cine", "Museo", "Estadio",
            "Castillo", "Desierto", "Puerto", "Escuela", "Panaderia",
        ],
    ),
    (
        "Profesiones",
        &[
            "Maestro", "Piloto", "Cocinero", "Bombero", "Dentista", "Fontanero", "Arquitecto",
            "Periodista", "Granjero", "Mago", "Cirujano", "Camarero",
        ],
    ),
    (
        "Objetos",
        &[
            "Paraguas", "Mochila", "Telescopio", "Escalera", "Vela", "Espejo", "Tijeras",
            "Brujula", "Almohada", "Tetera", "Martillo", "Violin",
        ],
    ),
    (
        "Deportes",
        &[
            "Futbol", "Tenis", "Natacion", "Boxeo", "Golf", "Voleibol", "Esqui", "Tiro",
            "Ciclismo", "Karate", "Remo", "Surf",
        ],
    ),
];

fn table_for(language: &str) -> CategoryTable {
    match language {
        "es" => ES,
        _ => EN,
    }
}

/// Category names available in a language.
pub fn category_names(language: &str) -> Vec<&'static str> {
    table_for(language).iter().map(|(name, _)| *name).collect()
}

/// Word list for a category, if the category exists in the language.
pub fn words_for(language: &str, category: &str) -> Option<&'static [&'static str]> {
    table_for(language)
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(category))
        .map(|(_, words)| *words)
}

/// Pick a category: the configured one when it resolves, otherwise a
/// uniform random draw from the language's table.
pub fn resolve_category(
    language: &str,
    configured: Option<&str>,
    rng: &mut dyn RandomSource,
) -> &'static str {
    let table = table_for(language);
    if let Some(wanted) = configured {
        if let Some((name, _)) = table.iter().find(|(name, _)| name.eq_ignore_ascii_case(wanted)) {
            return name;
        }
    }
    let idx = (rng.next_unit() * table.len() as f64) as usize;
    table[idx.min(table.len() - 1)].0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rng::ScriptedRandom;

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        assert_eq!(category_names("xx"), category_names("en"));
    }

    #[test]
    fn test_words_for_is_case_insensitive() {
        assert!(words_for("en", "animals").is_some());
        assert!(words_for("en", "ANIMALS").is_some());
        assert!(words_for("en", "NoSuchCategory").is_none());
    }

    #[test]
    fn test_every_category_has_at_least_two_words() {
        for lang in ["en", "es"] {
            for name in category_names(lang) {
                let words = words_for(lang, name).unwrap();
                assert!(words.len() >= 2, "{lang}/{name} too small");
            }
        }
    }

    #[test]
    fn test_resolve_category_prefers_configured() {
        let mut rng = ScriptedRandom::constant(0.99);
        assert_eq!(resolve_category("en", Some("food"), &mut rng), "Food");
    }

    #[test]
    fn test_resolve_category_random_when_unset() {
        let mut rng = ScriptedRandom::constant(0.0);
        let first = table_for("en")[0].0;
        assert_eq!(resolve_category("en", None, &mut rng), first);
    }

    #[test]
    fn test_resolve_category_random_when_unknown() {
        let mut rng = ScriptedRandom::constant(0.999);
        let last = table_for("en").last().unwrap().0;
        assert_eq!(resolve_category("en", Some("Ghosts"), &mut rng), last);
    }
}
