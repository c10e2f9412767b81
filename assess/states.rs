//! # State Encoding
//!
//! The fixed table mapping the 36 recognized state names to the integer codes
//! the classifier was trained on. Codes follow alphabetical order of the
//! lowercase names and are defined here, never derived from data.

/// Number of recognized states.
pub const STATE_COUNT: usize = 36;

/// Lowercase state name and its trained integer code, sorted by name.
pub const STATE_ENCODING: [(&str, u8); STATE_COUNT] = [
    ("abia", 0),
    ("adamawa", 1),
    ("akwa ibom", 2),
    ("anambra", 3),
    ("bauchi", 4),
    ("bayelsa", 5),
    ("benue", 6),
    ("borno", 7),
    ("cross river", 8),
    ("delta", 9),
    ("ebonyi", 10),
    ("edo", 11),
    ("ekiti", 12),
    ("enugu", 13),
    ("gombe", 14),
    ("imo", 15),
    ("jigawa", 16),
    ("kaduna", 17),
    ("kano", 18),
    ("katsina", 19),
    ("kebbi", 20),
    ("kogi", 21),
    ("kwara", 22),
    ("lagos", 23),
    ("nasarawa", 24),
    ("niger", 25),
    ("ogun", 26),
    ("ondo", 27),
    ("osun", 28),
    ("oyo", 29),
    ("plateau", 30),
    ("rivers", 31),
    ("sokoto", 32),
    ("taraba", 33),
    ("yobe", 34),
    ("zamfara", 35),
];

/// Canonical lookup key for a state name: trimmed and lowercased.
pub fn normalize_state_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Returns the trained code for `name`, matching case-insensitively.
pub fn encode_state(name: &str) -> Option<u8> {
    let key = normalize_state_name(name);
    STATE_ENCODING
        .binary_search_by(|(candidate, _)| (*candidate).cmp(key.as_str()))
        .ok()
        .map(|index| STATE_ENCODING[index].1)
}

/// The recognized lowercase state names in code order.
pub fn known_states() -> impl Iterator<Item = &'static str> {
    STATE_ENCODING.iter().map(|(name, _)| *name)
}

/// Title-cased form of a lowercase state name for display ("akwa ibom" -> "Akwa Ibom").
pub fn display_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn encoding_is_a_bijection_onto_zero_through_35() {
        let codes: HashSet<u8> = STATE_ENCODING.iter().map(|(_, code)| *code).collect();
        assert_eq!(codes.len(), STATE_COUNT);
        assert!(codes.iter().all(|&code| (code as usize) < STATE_COUNT));

        let names: HashSet<&str> = known_states().collect();
        assert_eq!(names.len(), STATE_COUNT);
    }

    #[test]
    fn table_is_sorted_so_binary_search_holds() {
        for window in STATE_ENCODING.windows(2) {
            assert!(window[0].0 < window[1].0, "{:?} out of order", window);
        }
    }

    #[test]
    fn every_known_state_encodes_to_its_table_code() {
        for (name, code) in STATE_ENCODING {
            assert_eq!(encode_state(name), Some(code));
        }
    }

    #[test]
    fn lookup_ignores_case_and_surrounding_whitespace() {
        assert_eq!(encode_state("Lagos"), Some(23));
        assert_eq!(encode_state("  AKWA IBOM "), Some(2));
        assert_eq!(encode_state("Cross River"), Some(8));
    }

    #[test]
    fn unknown_names_do_not_encode() {
        assert_eq!(encode_state("atlantis"), None);
        assert_eq!(encode_state(""), None);
        assert_eq!(encode_state("fct"), None);
    }

    #[test]
    fn display_name_title_cases_each_word() {
        assert_eq!(display_name("akwa ibom"), "Akwa Ibom");
        assert_eq!(display_name("lagos"), "Lagos");
    }
}
