//! Text utilities applied around every provider call.
//!
//! - [`protect_math`] swaps LaTeX regions for `[[MATH_n]]` placeholders before a
//!   prompt leaves the process and restores them in the response.
//! - [`clean_dollars`] spells out literal dollar signs in generated text.
//! - [`estimate_tokens`] is the coarse token estimate used for provider limits.

mod dollars;
mod math;

pub use dollars::clean_dollars;
pub use math::{ProtectedText, protect_math};

/// Estimates the token count of `text` as one token per four characters,
/// rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn estimate_counts_characters_not_bytes() {
        assert_eq!(estimate_tokens("ééééé"), 2);
    }
}
