//! Token estimation utilities.
//!
//! One token per whitespace-separated word. This is the single counting
//! method used everywhere: document metadata, truncation, and the
//! assembled context's `total_tokens`. It undercounts relative to BPE
//! tokenizers, but it is exact under truncation: cutting a body to `n`
//! words yields a prefix of exactly `n` tokens.

/// Estimate the token count for a string.
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Return the longest prefix of `text` holding at most `max_tokens` tokens,
/// together with the number of tokens it holds.
///
/// The cut always lands at the end of a word, so the prefix never ends
/// mid-token and never carries trailing whitespace. Whitespace and line
/// breaks inside the prefix are preserved.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> (&str, usize) {
    if max_tokens == 0 {
        return ("", 0);
    }

    let mut count = 0;
    let mut end = 0;
    let mut in_word = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                in_word = false;
                end = idx;
                if count == max_tokens {
                    return (&text[..end], count);
                }
            }
        } else if !in_word {
            in_word = true;
            count += 1;
        }
    }

    if in_word {
        end = text.len();
    }
    (&text[..end], count)
}
