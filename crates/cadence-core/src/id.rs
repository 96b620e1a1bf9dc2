//! Opaque identifier generation.
//!
//! IDs look like `t-lx3k9q2a7f1c`: a short kind prefix, the creation time in
//! base-36 milliseconds, and four random base-36 characters. They sort
//! roughly by creation time but callers must treat them as opaque.

use chrono::Utc;
use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 4;

/// Prefix for task IDs.
pub const TASK_PREFIX: &str = "t";
/// Prefix for subtask IDs.
pub const SUBTASK_PREFIX: &str = "s";
/// Prefix for goal IDs.
pub const GOAL_PREFIX: &str = "g";
/// Prefix for milestone IDs.
pub const MILESTONE_PREFIX: &str = "m";

/// Generate a new identifier with the given kind prefix.
#[must_use]
pub fn new_id(prefix: &str) -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    new_id_with(prefix, millis, &mut rand::thread_rng())
}

/// Deterministic variant of [`new_id`] for a fixed timestamp and RNG.
pub fn new_id_with<R: Rng + ?Sized>(prefix: &str, millis: u64, rng: &mut R) -> String {
    let mut id = String::with_capacity(prefix.len() + 1 + 9 + RANDOM_SUFFIX_LEN);
    id.push_str(prefix);
    id.push('-');
    id.push_str(&to_base36(millis));
    for _ in 0..RANDOM_SUFFIX_LEN {
        let idx = rng.gen_range(0..ALPHABET.len());
        id.push(char::from(ALPHABET[idx]));
    }
    id
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let idx = usize::try_from(value % 36).unwrap_or(0);
        digits.push(ALPHABET[idx]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn ids_carry_prefix_and_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = new_id_with(TASK_PREFIX, 36, &mut rng);
        assert!(id.starts_with("t-10"));
        assert_eq!(id.len(), "t-10".len() + RANDOM_SUFFIX_LEN);
        assert!(id.chars().skip(2).all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_ids_are_unique() {
        let ids: HashSet<String> = (0..500).map(|_| new_id(GOAL_PREFIX)).collect();
        assert_eq!(ids.len(), 500);
    }
}
