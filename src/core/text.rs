#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputStats {
    pub chars: usize,
    pub tokens: usize,
}

impl std::fmt::Display for OutputStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} chars • {} tokens", self.chars, self.tokens)
    }
}

#[must_use]
pub fn output_stats(text: &str) -> OutputStats {
    OutputStats {
        chars: text.chars().count(),
        tokens: count_tokens(text),
    }
}

#[cfg(feature = "tokens")]
#[must_use]
pub fn count_tokens(text: &str) -> usize {
    use std::sync::OnceLock;
    use tiktoken_rs::{CoreBPE, o200k_base};
    static BPE: OnceLock<Option<CoreBPE>> = OnceLock::new();
    match BPE.get_or_init(|| o200k_base().ok()) {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => count_words(text),
    }
}

#[cfg(not(feature = "tokens"))]
#[must_use]
pub fn count_tokens(text: &str) -> usize {
    count_words(text)
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
