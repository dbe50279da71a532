use std::{borrow::Cow, sync::LazyLock};

use another_tiktoken_rs::{cl100k_base, CoreBPE};

static BPE: LazyLock<Option<CoreBPE>> = LazyLock::new(|| {
    cl100k_base()
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to load tokenizer, estimating tokens"))
        .ok()
});

/// Approximation used when the tokenizer is unavailable
const FALLBACK_CHARS_PER_TOKEN: usize = 4;

/// Cuts `text` down to at most `max_tokens` tokens
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> Cow<'_, str> {
    if let Some(bpe) = BPE.as_ref() {
        let tokens = bpe.encode_with_special_tokens(text);
        if tokens.len() <= max_tokens {
            return Cow::Borrowed(text);
        }
        if let Ok(truncated) = bpe.decode(tokens[..max_tokens].to_vec()) {
            return Cow::Owned(truncated);
        }
    }

    let max_chars = max_tokens.saturating_mul(FALLBACK_CHARS_PER_TOKEN);
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(text[..cut].to_string()),
        None => Cow::Borrowed(text),
    }
}
