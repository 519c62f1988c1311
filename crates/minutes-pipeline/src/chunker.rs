//! Greedy bin-packing of sentences into budget-bounded chunks.
//!
//! The budget is an exclusive upper bound: a sentence joins the open chunk
//! only while `chunk_tokens + sentence_tokens < budget`. A sentence that
//! alone meets or exceeds the budget becomes a chunk of its own; sentences
//! are never split.

use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use minutes_tokens::TokenEstimator;

use crate::error::Result;

/// Contiguous run of sentences joined with single spaces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// 0-based position; indices are gapless and ascending.
    pub index: usize,
    pub text: String,
    /// Sum of the per-sentence estimates of the sentences in this chunk.
    pub token_count: usize,
    /// Which input sentences this chunk holds.
    pub sentence_range: Range<usize>,
}

struct Accumulator {
    text: String,
    tokens: usize,
    start: usize,
    len: usize,
}

impl Accumulator {
    fn starting_at(start: usize) -> Self {
        Self {
            text: String::new(),
            tokens: 0,
            start,
            len: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, sentence: &str, tokens: usize) {
        if self.len > 0 {
            self.text.push(' ');
        }
        self.text.push_str(sentence);
        self.tokens += tokens;
        self.len += 1;
    }

    fn seal(self, index: usize) -> Chunk {
        Chunk {
            index,
            text: self.text,
            token_count: self.tokens,
            sentence_range: self.start..self.start + self.len,
        }
    }
}

/// Pack `sentences` into ordered chunks under `budget` tokens of `model_id`.
///
/// One estimator call per sentence, single pass, no backtracking. The same
/// input always produces the same boundaries.
pub fn build_chunks(
    sentences: &[String],
    budget: usize,
    model_id: &str,
    estimator: &dyn TokenEstimator,
) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    let mut acc = Accumulator::starting_at(0);

    for (i, sentence) in sentences.iter().enumerate() {
        let tokens = estimator.estimate(model_id, sentence)?;

        if acc.tokens + tokens < budget {
            acc.push(sentence, tokens);
            continue;
        }

        if !acc.is_empty() {
            let sealed = std::mem::replace(&mut acc, Accumulator::starting_at(i));
            chunks.push(sealed.seal(chunks.len()));
        }
        acc.push(sentence, tokens);
    }

    if !acc.is_empty() {
        chunks.push(acc.seal(chunks.len()));
    }

    debug!(
        sentences = sentences.len(),
        chunks = chunks.len(),
        budget,
        "built chunks"
    );
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minutes_tokens::TokenError;
    use proptest::prelude::*;

    /// Three tokens per whitespace-separated word; knows one model.
    struct WordEstimator;

    impl TokenEstimator for WordEstimator {
        fn estimate(&self, model_id: &str, text: &str) -> minutes_tokens::Result<usize> {
            if model_id != "test-model" {
                return Err(TokenError::UnknownModel(model_id.to_string()));
            }
            Ok(text.split_whitespace().count() * 3)
        }
    }

    fn sentences(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn build(items: &[String], budget: usize) -> Vec<Chunk> {
        build_chunks(items, budget, "test-model", &WordEstimator).unwrap()
    }

    #[test]
    fn three_small_sentences_fit_one_chunk() {
        let chunks = build(&sentences(&["A.", "B.", "C."]), 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A. B. C.");
        assert_eq!(chunks[0].token_count, 9);
        assert_eq!(chunks[0].sentence_range, 0..3);
    }

    #[test]
    fn tight_budget_gives_one_sentence_per_chunk() {
        let chunks = build(&sentences(&["A.", "B.", "C."]), 6);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A.", "B.", "C."]);
        assert!(chunks.iter().all(|c| c.token_count == 3));
        assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn oversized_sentence_is_its_own_chunk() {
        let long = vec!["w"; 50].join(" ");
        let chunks = build(&[long.clone()], 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, long);
        assert_eq!(chunks[0].token_count, 150);
    }

    #[test]
    fn oversized_sentence_between_small_ones() {
        let long = vec!["w"; 5].join(" ");
        let chunks = build(&sentences(&["a.", &long, "b.", "c."]), 10);
        let ranges: Vec<_> = chunks.iter().map(|c| c.sentence_range.clone()).collect();
        assert_eq!(ranges, vec![0..1, 1..2, 2..4]);
        assert_eq!(chunks[1].token_count, 15);
        assert_eq!(chunks[2].text, "b. c.");
    }

    #[test]
    fn exact_budget_is_excluded() {
        // 3 + 3 = 6 is not < 6, so the second sentence starts a new chunk.
        let chunks = build(&sentences(&["a.", "b."]), 6);
        assert_eq!(chunks.len(), 2);
        let chunks = build(&sentences(&["a.", "b."]), 7);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn last_chunk_sealed_unconditionally() {
        let chunks = build(&sentences(&["one two three.", "four."]), 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "four.");
        assert_eq!(chunks[1].token_count, 3);
    }

    #[test]
    fn no_sentences_no_chunks() {
        assert!(build(&[], 10).is_empty());
    }

    #[test]
    fn unknown_model_fails() {
        let err = build_chunks(&sentences(&["a."]), 10, "llama-9", &WordEstimator).unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    fn sentence_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop::collection::vec("[a-z]{1,6}", 1..8).prop_map(|words| words.join(" ") + "."),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn chunks_respect_budget(input in sentence_strategy(), budget in 1usize..60) {
            for chunk in build(&input, budget) {
                let single = chunk.sentence_range.len() == 1;
                prop_assert!(chunk.token_count < budget || single,
                    "chunk {} has {} tokens over budget {}", chunk.index, chunk.token_count, budget);
                if single && chunk.token_count >= budget {
                    let sentence = &input[chunk.sentence_range.start];
                    prop_assert_eq!(WordEstimator.estimate("test-model", sentence).unwrap(), chunk.token_count);
                }
            }
        }

        #[test]
        fn chunks_reproduce_sentence_order(input in sentence_strategy(), budget in 1usize..60) {
            let chunks = build(&input, budget);
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
            }
            let covered: Vec<usize> = chunks.iter().flat_map(|c| c.sentence_range.clone()).collect();
            prop_assert_eq!(covered, (0..input.len()).collect::<Vec<_>>());
            let rejoined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
            prop_assert_eq!(rejoined, input.join(" "));
        }

        #[test]
        fn boundaries_are_deterministic(input in sentence_strategy(), budget in 1usize..60) {
            prop_assert_eq!(build(&input, budget), build(&input, budget));
        }

        #[test]
        fn total_under_budget_is_one_chunk(input in sentence_strategy().prop_filter("non-empty", |v| !v.is_empty())) {
            let total: usize = input.iter().map(|s| WordEstimator.estimate("test-model", s).unwrap()).sum();
            prop_assert_eq!(build(&input, total + 1).len(), 1);
        }

        #[test]
        fn total_at_budget_splits(input in sentence_strategy().prop_filter("two or more", |v| v.len() >= 2)) {
            let total: usize = input.iter().map(|s| WordEstimator.estimate("test-model", s).unwrap()).sum();
            let largest = input.iter().map(|s| WordEstimator.estimate("test-model", s).unwrap()).max().unwrap_or(0);
            let budget = total;
            prop_assume!(largest < budget);
            prop_assert!(build(&input, budget).len() >= 2);
        }
    }
}
