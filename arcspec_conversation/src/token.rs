//! Approximate token counting.
//!
//! This is a cheap, backend-agnostic proxy for subword tokenization used only for
//! history budgeting. CJK ideographs count roughly 1.5 characters per token, everything
//! else roughly 4. The estimate never decreases as text grows and is at least 1.

const CJK_CHARS_PER_TOKEN: f64 = 1.5;
const OTHER_CHARS_PER_TOKEN: f64 = 4.0;

const fn is_cjk_ideograph(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}')
}

/// Estimate how many tokens `text` occupies.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "character counts are far below f64 precision and the estimate is non-negative"
)]
pub fn estimate_tokens(text: &str) -> usize {
    let (cjk, other) = text.chars().fold((0_usize, 0_usize), |(cjk, other), c| {
        if is_cjk_ideograph(c) {
            (cjk + 1, other)
        } else {
            (cjk, other + 1)
        }
    });

    let estimate = (cjk as f64 / CJK_CHARS_PER_TOKEN + other as f64 / OTHER_CHARS_PER_TOKEN).floor();
    (estimate as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_four_chars_per_token() {
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens(&"a".repeat(10)), 2);
        assert_eq!(estimate_tokens(&"a".repeat(400)), 100);
    }

    #[test]
    fn cjk_is_one_and_a_half_chars_per_token() {
        assert_eq!(estimate_tokens("你好世"), 2);
        assert_eq!(estimate_tokens("你好世界你好"), 4);
        // 3 ideographs (2.0) + 4 ascii (1.0)
        assert_eq!(estimate_tokens("你好世abcd"), 3);
    }

    #[test]
    fn floor_of_one() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("你"), 1);
    }

    #[test]
    fn counts_code_points_not_bytes() {
        // Hiragana is outside the ideograph block and multi-byte in UTF-8.
        assert_eq!(estimate_tokens("こんにちは世界"), 2);
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn monotone_under_appends() {
        let pieces = ["a", "你", " ", "é", "界", "xyz", "\u{9fff}", "\u{4e00}"];
        let mut text = String::new();
        let mut last = estimate_tokens(&text);
        for round in 0..200 {
            text.push_str(pieces[round % pieces.len()]);
            let next = estimate_tokens(&text);
            assert!(next >= last, "estimate dropped at {text:?}");
            last = next;
        }
    }
}
