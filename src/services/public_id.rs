//! Human-readable public identifiers: `{PREFIX}-{YEAR}-{NNNN}`

use chrono::{Datelike, Utc};
use rand::Rng;

pub const QUOTE_PREFIX: &str = "Q";
pub const CONTRACT_PREFIX: &str = "CTR";
pub const TICKET_PREFIX: &str = "TKT";

/// Attempts made when a generated id collides with an existing one
pub const MAX_ID_ATTEMPTS: usize = 5;

pub fn generate_public_id(prefix: &str) -> String {
    let token: u16 = rand::thread_rng().gen_range(1000..10000);
    format_public_id(prefix, Utc::now().year(), token)
}

fn format_public_id(prefix: &str, year: i32, token: u16) -> String {
    format!("{}-{}-{}", prefix, year, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_pattern(id: &str, prefix: &str) -> bool {
        let parts: Vec<&str> = id.split('-').collect();
        parts.len() == 3
            && parts[0] == prefix
            && parts[1].len() == 4
            && parts[1].chars().all(|c| c.is_ascii_digit())
            && parts[2].len() == 4
            && parts[2].chars().all(|c| c.is_ascii_digit())
    }

    #[test]
    fn test_generated_ids_match_pattern() {
        for _ in 0..200 {
            let id = generate_public_id(QUOTE_PREFIX);
            assert!(matches_pattern(&id, "Q"), "unexpected id {}", id);
        }
        assert!(matches_pattern(&generate_public_id(CONTRACT_PREFIX), "CTR"));
    }

    #[test]
    fn test_generated_id_uses_current_year() {
        let id = generate_public_id(TICKET_PREFIX);
        assert!(id.starts_with(&format!("TKT-{}-", Utc::now().year())));
    }

    #[test]
    fn test_format() {
        assert_eq!(format_public_id("Q", 2026, 4821), "Q-2026-4821");
    }
}
