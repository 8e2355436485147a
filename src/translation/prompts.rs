/*!
 * Prompt construction for window translation.
 *
 * The prompt is a single instruction string with sections in a fixed order:
 * requirements, relevant glossary entries, preceding context, the window
 * itself, following context, and the reply format. Optional sections are
 * left out entirely when they have nothing to show.
 */

use crate::translation::context::WindowContext;
use crate::translation::glossary::Term;
use crate::translation::response::{FENCE, TERMS_MARKER, TRANSLATION_MARKER};

/// Builder for the instruction sent to the model for one window
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder<'a> {
    source_language: &'a str,
    target_language: &'a str,
    glossary: Vec<&'a Term>,
    prev_source: Vec<&'a str>,
    prev_target: Vec<&'a str>,
    window: &'a [String],
    next_source: &'a [String],
}

impl<'a> TranslationPromptBuilder<'a> {
    /// Create a new prompt builder.
    pub fn new(source_language: &'a str, target_language: &'a str) -> Self {
        Self {
            source_language,
            target_language,
            glossary: Vec::new(),
            prev_source: Vec::new(),
            prev_target: Vec::new(),
            window: &[],
            next_source: &[],
        }
    }

    /// Set the glossary entries relevant to the window.
    pub fn with_glossary(mut self, terms: Vec<&'a Term>) -> Self {
        self.glossary = terms;
        self
    }

    /// Set preceding and following context.
    pub fn with_context(mut self, context: &WindowContext<'a>) -> Self {
        self.prev_source = context.prev_source.clone();
        self.prev_target = context.prev_target.clone();
        self.next_source = context.next_source;
        self
    }

    /// Set the lines to translate.
    pub fn with_window(mut self, window: &'a [String]) -> Self {
        self.window = window;
        self
    }

    /// Render the prompt.
    pub fn build(&self) -> String {
        let mut parts: Vec<String> = vec![self.header()];

        if !self.glossary.is_empty() {
            parts.push("\n## 术语表".to_string());
            for term in &self.glossary {
                if term.note.is_empty() {
                    parts.push(format!("{} -> {}", term.source, term.target));
                } else {
                    parts.push(format!("{} -> {}（{}）", term.source, term.target, term.note));
                }
            }
        }

        if !self.prev_source.is_empty() && !self.prev_target.is_empty() {
            parts.push(format!("\n## 前文（仅供参考，不用翻译）\n{}", FENCE));
            for (source, target) in self.prev_source.iter().zip(&self.prev_target) {
                parts.push(source.to_string());
                parts.push(target.to_string());
            }
            parts.push(FENCE.to_string());
        }

        parts.push(format!("\n## 待翻译内容\n{}", FENCE));
        parts.extend(self.window.iter().cloned());
        parts.push(FENCE.to_string());

        if !self.next_source.is_empty() {
            parts.push(format!("\n## 后文（仅供参考，不用翻译）\n{}", FENCE));
            parts.extend(self.next_source.iter().cloned());
            parts.push(FENCE.to_string());
        }

        parts.push(format!(
            "\n按以下格式输出（{terms}如果没有可以留空）：\n\
             {fence}\n\
             {translation}\n\
             line1\n\
             line2\n\
             ...\n\
             {terms}\n\
             原文1 - 译文1\n\
             原文2 - 译文2\n\
             ...\n\
             {fence}",
            terms = TERMS_MARKER,
            translation = TRANSLATION_MARKER,
            fence = FENCE,
        ));

        parts.join("\n")
    }

    fn header(&self) -> String {
        let punctuation = if is_chinese(self.target_language) {
            format!("使用{}标点：，。！？：；“”……——（）【】等等", self.target_language)
        } else {
            format!("使用{}的标点符号", self.target_language)
        };

        format!(
            "将以下内容从{}翻译成{}，并遵守以下要求：\n\
             {}\n\
             翻译时，译文尽量和原文行数相等。\n\
             如果遇到需要翻译时保持一致且不在术语表中的新术语，比如人名地名专名等，则将其一并输出。\n",
            self.source_language, self.target_language, punctuation
        )
    }
}

fn is_chinese(language: &str) -> bool {
    language.contains('中') || language.contains('汉') || language.contains("Chinese")
}
