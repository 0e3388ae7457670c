use crate::corpus::{Corpus, Difficulty};
use crate::error::ConfigurationError;
use rand::Rng;
use std::collections::VecDeque;

/// Number of passages concatenated into one practice text
pub const PASSAGES_PER_TEXT: usize = 5;

/// Source of passage indices. Implementations must return a value in `0..len`.
pub trait IndexSource {
    fn next_index(&mut self, len: usize) -> usize;
}

/// Uniform choice backed by the thread-local rng
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIndex;

impl IndexSource for RandomIndex {
    fn next_index(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Replays a fixed sequence of indices, wrapping each into range.
/// Yields 0 once the sequence is exhausted.
#[derive(Debug, Default, Clone)]
pub struct SequenceIndex {
    indices: VecDeque<usize>,
}

impl SequenceIndex {
    pub fn new<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        Self {
            indices: indices.into_iter().collect(),
        }
    }
}

impl IndexSource for SequenceIndex {
    fn next_index(&mut self, len: usize) -> usize {
        self.indices.pop_front().map_or(0, |i| i % len)
    }
}

/// Builds practice text by sampling passages from a corpus tier
pub struct TextGenerator {
    corpus: Corpus,
    source: Box<dyn IndexSource>,
    passages_per_text: usize,
}

impl TextGenerator {
    pub fn new(corpus: Corpus, source: Box<dyn IndexSource>) -> Self {
        Self {
            corpus,
            source,
            passages_per_text: PASSAGES_PER_TEXT,
        }
    }

    pub fn with_random(corpus: Corpus) -> Self {
        Self::new(corpus, Box::new(RandomIndex))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Draw passages independently with replacement and join them with single spaces
    pub fn generate(&mut self, difficulty: Difficulty) -> Result<String, ConfigurationError> {
        let passages = self.corpus.passages(difficulty)?;

        let chosen: Vec<&str> = (0..self.passages_per_text.max(1))
            .map(|_| {
                let idx = self.source.next_index(passages.len());
                passages[idx.min(passages.len() - 1)].as_str()
            })
            .collect();

        Ok(chosen.join(" "))
    }
}

impl std::fmt::Debug for TextGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextGenerator")
            .field("corpus", &self.corpus.to_string())
            .field("passages_per_text", &self.passages_per_text)
            .finish()
    }
}
