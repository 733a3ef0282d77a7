//! Mint address extraction.
//!
//! Posts mention token mints as bare base58 strings. A candidate is a
//! maximal run of base58 characters (digits 1-9, uppercase letters minus
//! I and O, lowercase minus l) between 32 and 44 characters long — the
//! length range of a Solana public key.

use regex::Regex;
use std::sync::OnceLock;

/// Anything that cannot appear in a base58 mint address.
fn separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| {
        Regex::new(r"[^1-9A-HJ-NP-Za-km-z]+").expect("separator pattern is valid")
    })
}

/// Extract every candidate mint address from `text`, in order of
/// appearance.
///
/// The same address appearing at two positions yields two entries;
/// deduplication is the caller's business. A run longer than 44
/// characters is not an address and yields nothing.
pub fn extract_addresses(text: &str) -> Vec<String> {
    separators()
        .split(text)
        .filter(|run| (32..=44).contains(&run.len()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINT: &str = "FUAfBo2jgks6gB4Z4LfZkqSZgzNucisEHqnNebaRxM1P";

    #[test]
    fn test_extracts_address_from_text() {
        let text = format!("Check out this mint: {}", MINT);
        assert_eq!(extract_addresses(&text), vec![MINT.to_string()]);
    }

    #[test]
    fn test_no_address_returns_empty() {
        assert!(extract_addresses("just a random post with no mint").is_empty());
        assert!(extract_addresses("").is_empty());
    }

    #[test]
    fn test_is_idempotent() {
        let text = format!("mint {} and again {}", MINT, MINT);
        let first = extract_addresses(&text);
        let second = extract_addresses(&text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicates_are_preserved_in_order() {
        let other = "So11111111111111111111111111111111111111112";
        let text = format!("{} then {} then {}", MINT, other, MINT);
        assert_eq!(
            extract_addresses(&text),
            vec![MINT.to_string(), other.to_string(), MINT.to_string()]
        );
    }

    #[test]
    fn test_length_bounds() {
        let base = "A".repeat(31);
        assert!(extract_addresses(&base).is_empty());

        let at_min = "A".repeat(32);
        assert_eq!(extract_addresses(&at_min), vec![at_min.clone()]);

        let at_max = "A".repeat(44);
        assert_eq!(extract_addresses(&at_max), vec![at_max.clone()]);

        // An over-long run is one run, not an address plus change.
        let over = "A".repeat(45);
        assert!(extract_addresses(&over).is_empty());
    }

    #[test]
    fn test_excluded_characters_split_runs() {
        // 0, O, I and l are not base58; each breaks a run into halves
        // that are too short to qualify.
        for bad in ['0', 'O', 'I', 'l'] {
            let text = format!("{}{}{}", "A".repeat(20), bad, "A".repeat(20));
            assert!(
                extract_addresses(&text).is_empty(),
                "run containing {:?} should not qualify",
                bad
            );
        }
    }

    #[test]
    fn test_adjacent_punctuation_is_stripped() {
        let text = format!("buy now: {}!", MINT);
        assert_eq!(extract_addresses(&text), vec![MINT.to_string()]);
    }
}
