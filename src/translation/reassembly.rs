/*!
 * Reassembly of dispatched translation results.
 *
 * Dispatch completes batches in arbitrary order; this module sorts them back
 * by batch index, fragments the translated blocks into display sentences and
 * builds the source/translation review stream. Quotations that the sentence
 * regex splits apart are re-fused by a small two-state machine instead of
 * being patched back in afterwards.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::{ReviewMode, SentenceFragmenterMode, TranslationConfig};

use super::dispatch::DispatchResult;

/// Runs of text ending in sentence-terminal punctuation followed by
/// whitespace or end of input
static SENTENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(.*?(?:"|'|-|~|!|\?|%|\(|\)|\.\.\.|\.|---|\[|\]))(?:\s|$)"#).unwrap()
});

/// Banner between a prompt block and its translation in interleaved review
const REVIEW_BANNER: &str = "-------------------------\n";

/// Separator after each paired line group
const PAIR_SEPARATOR: &str = "--------------------------------------------------\n";

/// State of the quotation re-fusion machine
enum QuoteState {
    /// Not inside a quotation
    Idle,
    /// Accumulating fragments of an unterminated quotation
    Buffering(String),
}

/// Final in-memory output of one run
#[derive(Debug, Default)]
pub struct ReassembledOutput {
    /// Ordered translated text segments
    pub translated: Vec<String>,
    /// Review-pair segments for bilingual checking
    pub review_pairs: Vec<String>,
}

/// Restores batch order and produces the final text streams
#[derive(Debug, Clone)]
pub struct Reassembler {
    /// Sentence fragmentation mode
    fragmenter: SentenceFragmenterMode,
    /// Review pairing mode
    review: ReviewMode,
}

impl Reassembler {
    /// Create a new reassembler
    pub fn new(fragmenter: SentenceFragmenterMode, review: ReviewMode) -> Self {
        Self { fragmenter, review }
    }

    /// Create a reassembler from the run settings
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(config.sentence_fragmenter, config.review_mode)
    }

    /// Consume all dispatch results and produce ordered output.
    ///
    /// Results may arrive in any completion order; they are sorted by their
    /// original batch index first, so the output is identical for every
    /// permutation of the input.
    pub fn reassemble(&self, mut results: Vec<DispatchResult>) -> ReassembledOutput {
        results.sort_by_key(|result| result.index);

        let mut output = ReassembledOutput::default();

        for result in &results {
            match self.review {
                ReviewMode::Interleaved => {
                    output
                        .review_pairs
                        .push(format!("\n{}{}\n\n", REVIEW_BANNER, result.prompt.content));
                    output.review_pairs.push(format!("{}\n", result.translated));
                }
                ReviewMode::Paired => {
                    output.review_pairs.push(result.prompt.content.clone());
                    output.review_pairs.push(result.translated.clone());
                }
                ReviewMode::Off => {}
            }

            self.fragment_block(&result.translated, &mut output.translated);
        }

        if self.review == ReviewMode::Paired {
            output.review_pairs = Self::pair_lines(&output.review_pairs);
        }

        output
    }

    /// Split one translated block into display sentences
    fn fragment_block(&self, block: &str, out: &mut Vec<String>) {
        match self.fragmenter {
            SentenceFragmenterMode::Regex => {
                let mut state = QuoteState::Idle;

                for caps in SENTENCE_PATTERN.captures_iter(block) {
                    let sentence = match caps.get(1) {
                        Some(m) => m.as_str(),
                        None => continue,
                    };

                    state = match state {
                        QuoteState::Idle => {
                            if sentence.starts_with('"') && !sentence.ends_with('"') {
                                QuoteState::Buffering(sentence.to_string())
                            } else {
                                out.push(format!("{}\n", sentence));
                                QuoteState::Idle
                            }
                        }
                        QuoteState::Buffering(mut buffer) => {
                            buffer.push(' ');
                            buffer.push_str(sentence);

                            if !sentence.starts_with('"') && sentence.ends_with('"') {
                                out.push(format!("{}\n", buffer));
                                QuoteState::Idle
                            } else {
                                QuoteState::Buffering(buffer)
                            }
                        }
                    };
                }

                // An unterminated quotation at end of input is flushed, not dropped
                if let QuoteState::Buffering(buffer) = state {
                    out.push(format!("{}\n", buffer));
                }
            }
            SentenceFragmenterMode::Segmenter | SentenceFragmenterMode::Preformatted => {
                out.push(format!("{}\n\n", block));
            }
        }
    }

    /// Pair stored prompt/translation blocks line-by-line.
    ///
    /// Entries alternate source, translation. When the non-blank line counts
    /// of a pair match, the lines are interleaved one-to-one with separators;
    /// otherwise both raw blocks are emitted side by side so nothing is lost.
    fn pair_lines(stored: &[String]) -> Vec<String> {
        fn non_blank(text: &str) -> Vec<&str> {
            text.split('\n').filter(|line| !line.trim().is_empty()).collect()
        }

        let mut paired = Vec::new();
        let mut i = 1;

        while i < stored.len() {
            let source_lines = non_blank(&stored[i - 1]);
            let translated_lines = non_blank(&stored[i]);

            paired.push(REVIEW_BANNER.to_string());

            if source_lines.len() == translated_lines.len() {
                for (source, translated) in source_lines.iter().zip(translated_lines.iter()) {
                    paired.push(format!("{}\n\n", source));
                    paired.push(format!("{}\n\n", translated));
                    paired.push(PAIR_SEPARATOR.to_string());
                }
            } else {
                paired.push(format!("{}\n\n", stored[i - 1]));
                paired.push(format!("{}\n\n", stored[i]));
                paired.push(PAIR_SEPARATOR.to_string());
            }

            i += 2;
        }

        paired
    }
}
