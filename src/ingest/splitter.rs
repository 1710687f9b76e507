//! Sentence-aware text splitter.
//!
//! Splits text at Unicode sentence boundaries and greedily packs sentences
//! into chunks of at most `chunk_size` approximate tokens. Consecutive
//! chunks share up to `chunk_overlap` tokens of trailing sentences.
//! Sentences longer than a chunk are broken at word boundaries.

use unicode_segmentation::UnicodeSegmentation;

/// Default chunk size in approximate tokens.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
/// Default overlap in approximate tokens.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Approximates the token count of `text` (~4 characters per token).
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Sentence splitter with token-approximated chunk sizes.
#[derive(Debug, Clone, Copy)]
pub struct SentenceSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl SentenceSplitter {
    /// Creates a splitter. Overlap is clamped below the chunk size.
    #[must_use]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size / 2),
        }
    }

    /// Splits `text` into trimmed, non-empty chunks.
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let splits = self.atomic_splits(text);

        let mut chunks = Vec::new();
        let mut current: Vec<(&str, usize)> = Vec::new();
        let mut current_tokens = 0;

        for &(split, tokens) in &splits {
            if current_tokens + tokens > self.chunk_size && !current.is_empty() {
                push_chunk(&mut chunks, &current);

                // Carry trailing sentences forward as overlap
                let mut carry_tokens = 0;
                let mut keep_from = current.len();
                for (i, &(_, t)) in current.iter().enumerate().rev() {
                    if carry_tokens + t > self.chunk_overlap {
                        break;
                    }
                    carry_tokens += t;
                    keep_from = i;
                }
                current.drain(..keep_from);
                current_tokens = carry_tokens;

                while !current.is_empty() && current_tokens + tokens > self.chunk_size {
                    let (_, t) = current.remove(0);
                    current_tokens -= t;
                }
            }
            current.push((split, tokens));
            current_tokens += tokens;
        }

        if !current.is_empty() {
            push_chunk(&mut chunks, &current);
        }

        chunks
    }

    /// Sentence splits, with oversized sentences broken at word bounds.
    fn atomic_splits<'a>(&self, text: &'a str) -> Vec<(&'a str, usize)> {
        let mut splits = Vec::new();
        for sentence in text.split_sentence_bounds() {
            let tokens = estimate_tokens(sentence);
            if tokens <= self.chunk_size {
                splits.push((sentence, tokens));
                continue;
            }

            let mut start = 0;
            let mut acc = 0;
            for (offset, word) in sentence.split_word_bound_indices() {
                let t = estimate_tokens(word);
                if acc + t > self.chunk_size && offset > start {
                    splits.push((&sentence[start..offset], acc));
                    start = offset;
                    acc = 0;
                }
                acc += t;
            }
            if start < sentence.len() {
                splits.push((&sentence[start..], acc));
            }
        }
        splits
    }
}

fn push_chunk(chunks: &mut Vec<String>, parts: &[(&str, usize)]) {
    let text: String = parts.iter().map(|(s, _)| *s).collect();
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
