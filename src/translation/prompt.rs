/*!
 * Prompt building for batch translation.
 *
 * Scans the preprocessed source lines in order and accumulates them into
 * bounded-size prompts. Lines are classified before being added: scene-break
 * and part markers are kept verbatim, punctuation-only and ASCII-noise lines
 * are dropped without consuming batch capacity, and everything else is
 * appended with a trailing newline.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::jp_text;

/// Lines consisting only of non-word characters (punctuation, symbols, whitespace)
static NON_WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\W_\s-]+$").unwrap());

/// Lines consisting only of ASCII letters, digits and light punctuation;
/// these are leftovers of the preprocessing stage, not translatable text
static ASCII_NOISE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\s.,'?!]+$").unwrap());

/// Classification of a single source line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Scene-break / point-of-view marker, kept verbatim
    PovMarker,
    /// Part or chapter marker, kept verbatim
    PartMarker,
    /// Punctuation-only line, dropped
    Punctuation,
    /// ASCII letters/digits noise, dropped
    AsciiNoise,
    /// Ordinary translatable text
    Text,
}

impl LineClass {
    /// Whether lines of this class are kept in the prompt
    pub fn is_kept(self) -> bool {
        matches!(self, Self::PovMarker | Self::PartMarker | Self::Text)
    }
}

/// Classify one source line.
///
/// Order matters: marker checks run before the punctuation and noise checks
/// so that marker lines are never dropped.
pub fn classify_line(line: &str) -> LineClass {
    if jp_text::is_pov_marker(line) {
        LineClass::PovMarker
    } else if jp_text::is_part_marker(line) {
        LineClass::PartMarker
    } else if NON_WORD_PATTERN.is_match(line) || jp_text::is_punctuation(line) {
        LineClass::Punctuation
    } else if ASCII_NOISE_PATTERN.is_match(line) {
        LineClass::AsciiNoise
    } else {
        LineClass::Text
    }
}

/// Builds bounded-size prompts from an ordered sequence of source lines
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    /// Maximum number of kept lines per prompt
    max_lines_per_batch: usize,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(max_lines_per_batch: usize) -> Self {
        Self { max_lines_per_batch }
    }

    /// Build the next prompt starting at `index`.
    ///
    /// Returns the prompt text and the index of the first line not yet
    /// consumed. Every scanned line advances the index exactly once, dropped
    /// lines included, so repeated calls cover the input without revisiting
    /// or skipping lines. When the remaining span holds no kept lines the
    /// returned prompt is empty and the index still advances to the end.
    pub fn next_prompt(&self, lines: &[String], mut index: usize) -> (String, usize) {
        let mut prompt = String::new();
        let mut kept = 0;

        while index < lines.len() && kept < self.max_lines_per_batch {
            let line = &lines[index];

            let class = classify_line(line);
            if class.is_kept() {
                prompt.push_str(line);
                prompt.push('\n');
                kept += 1;
            } else {
                debug!("Dropping line {} as {:?}: {}", index, class, line);
            }

            index += 1;
        }

        (prompt, index)
    }

    /// Build all prompts for the given lines, skipping spans that yield an
    /// empty prompt
    pub fn prompts(&self, lines: &[String]) -> Vec<String> {
        let mut prompts = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            let (prompt, next_index) = self.next_prompt(lines, index);
            if !prompt.is_empty() {
                prompts.push(prompt);
            }
            index = next_index;
        }

        prompts
    }
}
