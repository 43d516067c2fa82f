//! Unique-code generation.
//!
//! Codes are short random identifiers meant to be read back by humans:
//! the alphabet drops the look-alike glyphs `0`/`O` and `1`/`l`, and a
//! digit is forced after any two consecutive letters, which also keeps
//! accidental words from forming.

use rand::Rng;

use crate::error::{PgBindError, Result};
use crate::params::ParamBag;
use crate::querier::Querier;

/// Full alphabet for unforced positions: `0-9A-Za-z` minus `0 O 1 l`.
const ALPHABET: &[u8] = b"23456789ABCDEFGHIJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Digits drawn when the spacing rule forces one.
const DIGITS: &[u8] = b"23456789";

/// Generate a random code of the given length.
///
/// Every character comes from the reduced alphabet, and no three
/// consecutive characters are non-digits.
pub fn random_code(length: usize) -> String {
    let mut rng = rand::rng();
    let mut out = String::with_capacity(length);
    let mut letter_run = 0usize;
    for _ in 0..length {
        let pool = if letter_run >= 2 { DIGITS } else { ALPHABET };
        let ch = pool[rng.random_range(0..pool.len())] as char;
        if ch.is_ascii_digit() {
            letter_run = 0;
        } else {
            letter_run += 1;
        }
        out.push(ch);
    }
    out
}

/// True when `code` obeys the spacing rule: no three consecutive
/// non-digit characters.
pub fn has_digit_spacing(code: &str) -> bool {
    let mut letter_run = 0usize;
    for ch in code.chars() {
        if ch.is_ascii_digit() {
            letter_run = 0;
        } else {
            letter_run += 1;
            if letter_run > 2 {
                return false;
            }
        }
    }
    true
}

/// Default ceiling on generate-and-check attempts.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Generates codes that are unique within a table column.
///
/// Each candidate is checked with a COUNT query through the raw
/// single-value path; the first unused candidate wins. Collisions are
/// astronomically unlikely at reasonable lengths, but the attempt ceiling
/// keeps a saturated code space (say, length 1 against a full table) from
/// looping forever.
pub struct CodeGenerator {
    querier: Querier,
    max_attempts: usize,
}

impl CodeGenerator {
    pub fn new(querier: Querier) -> Self {
        Self {
            querier,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the attempt ceiling.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Generate a code of `length` that has no match in `table.column`.
    pub async fn unique_code(&self, table: &str, column: &str, length: usize) -> Result<String> {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = :code");
        let description = format!("unique code lookup in {table}.{column}");

        for _ in 0..self.max_attempts {
            let candidate = random_code(length);
            let bag = ParamBag::new().bind("code", candidate.as_str());
            let taken: i64 = self.querier.field(&description, &sql, &bag, 0).await?;
            if taken == 0 {
                return Ok(candidate);
            }
            log::debug!("code collision in {table}.{column}, regenerating");
        }

        Err(PgBindError::CodeSpaceExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_code_length() {
        for length in [0, 1, 6, 32] {
            assert_eq!(random_code(length).len(), length);
        }
    }

    #[test]
    fn test_random_code_alphabet() {
        let code = random_code(512);
        for ch in code.chars() {
            assert!(ch.is_ascii_alphanumeric(), "unexpected char {ch:?}");
            assert!(!"0O1l".contains(ch), "ambiguous glyph {ch:?}");
        }
    }

    #[test]
    fn test_random_code_digit_spacing_round_trip() {
        for _ in 0..200 {
            let code = random_code(12);
            assert!(has_digit_spacing(&code), "spacing violated in {code:?}");
        }
    }

    #[test]
    fn test_validator_rejects_three_letters() {
        assert!(!has_digit_spacing("abc"));
        assert!(has_digit_spacing("ab2c"));
        assert!(has_digit_spacing("2345"));
        assert!(has_digit_spacing(""));
    }
}
