/*!
 * Bidirectional context around the current window.
 *
 * Backward context comes from pairs that are already translated, forward
 * context from raw lines after the window. Both are bounded by character
 * budgets rather than line counts.
 */

use crate::translation::checkpoint::TranslatedPair;
use crate::translation::chunk::{char_len, extract_chunk};

/// Context shown to the model next to the window, never retranslated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowContext<'a> {
    /// Source side of the preceding pairs, in document order
    pub prev_source: Vec<&'a str>,
    /// Target side of the preceding pairs, aligned with `prev_source`
    pub prev_target: Vec<&'a str>,
    /// Untranslated lines following the window
    pub next_source: &'a [String],
}

/// Builds backward and forward context with fixed character budgets
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    context_before: usize,
    context_after: usize,
}

impl ContextAssembler {
    pub fn new(context_before: usize, context_after: usize) -> Self {
        Self {
            context_before,
            context_after,
        }
    }

    /// Assemble the context for `window`, which starts at `current_idx`.
    pub fn assemble<'a>(
        &self,
        lines: &'a [String],
        translated: &'a [TranslatedPair],
        current_idx: usize,
        window: &[String],
    ) -> WindowContext<'a> {
        let (prev_source, prev_target) = self.backward(translated);
        let (_, next_source) = extract_chunk(lines, self.context_after, current_idx + window.len());

        WindowContext {
            prev_source,
            prev_target,
            next_source,
        }
    }

    /// Walk pairs from the most recent one back, measuring their source side.
    ///
    /// The most recent pair is always taken; older ones only while the
    /// running total stays within the budget.
    fn backward<'a>(&self, translated: &'a [TranslatedPair]) -> (Vec<&'a str>, Vec<&'a str>) {
        let mut taken: Vec<&TranslatedPair> = Vec::new();
        let mut used = 0;

        for pair in translated.iter().rev() {
            let length = char_len(&pair.source);
            if !taken.is_empty() && (used >= self.context_before || used + length > self.context_before) {
                break;
            }
            taken.push(pair);
            used += length;
        }

        taken
            .into_iter()
            .rev()
            .map(|pair| (pair.source.as_str(), pair.target.as_str()))
            .unzip()
    }
}
