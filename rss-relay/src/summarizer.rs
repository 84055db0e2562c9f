use crate::text::{is_informative, split_sentences, tokenize_words};
use crate::types::{SummarizeError, Summarizer};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Frequency-ranked extractive summary.
///
/// Text with more than `sentence_threshold` sentences is reduced to its
/// `top_n` highest scoring sentences, kept in their original order. A
/// sentence scores the sum, over its distinct informative words, of how often
/// each word occurs in the whole text. Equal scores favour the earlier
/// sentence.
#[derive(Debug, Clone, Copy)]
pub struct ExtractiveSummarizer {
    sentence_threshold: usize,
    top_n: usize,
}

impl ExtractiveSummarizer {
    pub fn new(sentence_threshold: usize, top_n: usize) -> Self {
        Self {
            sentence_threshold,
            top_n: top_n.max(1),
        }
    }

    fn word_frequencies(text: &str) -> HashMap<String, usize> {
        let mut frequencies = HashMap::new();
        for word in tokenize_words(text).into_iter().filter(|w| is_informative(w)) {
            *frequencies.entry(word).or_insert(0) += 1;
        }
        frequencies
    }

    fn score(sentence: &str, frequencies: &HashMap<String, usize>) -> usize {
        tokenize_words(sentence)
            .into_iter()
            .collect::<HashSet<_>>()
            .iter()
            .filter_map(|word| frequencies.get(word))
            .sum()
    }
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new(3, 3)
    }
}

impl Summarizer for ExtractiveSummarizer {
    fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let sentences = split_sentences(text);
        if sentences.len() <= self.sentence_threshold {
            return Ok(text.to_string());
        }

        let frequencies = Self::word_frequencies(text);

        let mut ranked: Vec<(usize, usize)> = sentences
            .iter()
            .enumerate()
            .map(|(index, sentence)| (index, Self::score(sentence, &frequencies)))
            .collect();

        // Highest score first, earlier sentence on ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut selected: Vec<usize> = ranked.iter().take(self.top_n).map(|(index, _)| *index).collect();
        selected.sort_unstable();

        debug!(
            "Summarized {} sentences down to {} ({:?})",
            sentences.len(),
            selected.len(),
            selected
        );

        Ok(selected
            .into_iter()
            .map(|index| sentences[index])
            .collect::<Vec<_>>()
            .join(" "))
    }
}
