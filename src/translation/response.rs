/*!
 * Parsing of the model's structured reply.
 *
 * The reply is scanned for two markers. The translation block runs from
 * `【译文】` to whichever comes first of `【新术语】`, a closing fence, or the
 * end of the text. The term block runs from `【新术语】` to the next fence or
 * the end of the text. Nothing here fails: missing markers yield empty
 * results and unusable term lines are skipped one by one.
 */

use crate::translation::glossary::Term;

/// Marker opening the translated lines
pub const TRANSLATION_MARKER: &str = "【译文】";

/// Marker opening the new-terms list
pub const TERMS_MARKER: &str = "【新术语】";

/// Code fence wrapping the reply
pub const FENCE: &str = "```";

const TERM_SEPARATOR: char = '-';
const NOTE_OPEN: char = '（';
const NOTE_CLOSE: char = '）';

/// What a reply yielded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    /// Translated lines, trimmed, blank lines dropped
    pub lines: Vec<String>,
    /// Terms the model reported as new
    pub terms: Vec<Term>,
}

impl ParsedResponse {
    /// Parse a complete reply.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: parse_translation(text),
            terms: parse_terms(text),
        }
    }
}

/// Text following the first occurrence of `marker`
fn after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.find(marker).map(|idx| &text[idx + marker.len()..])
}

/// Prefix of `text` up to the earliest of `terminators`, or all of it
fn until_first<'a>(text: &'a str, terminators: &[&str]) -> &'a str {
    let end = terminators
        .iter()
        .filter_map(|t| text.find(t))
        .min()
        .unwrap_or(text.len());
    &text[..end]
}

fn parse_translation(text: &str) -> Vec<String> {
    let Some(rest) = after_marker(text, TRANSLATION_MARKER) else {
        return Vec::new();
    };

    until_first(rest, &[TERMS_MARKER, FENCE])
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_terms(text: &str) -> Vec<Term> {
    let Some(rest) = after_marker(text, TERMS_MARKER) else {
        return Vec::new();
    };

    until_first(rest, &[FENCE]).lines().filter_map(parse_term_line).collect()
}

/// Parse `source - target（note）`.
///
/// Splits on the first `-`; the note is whatever follows the first `（`,
/// minus one trailing `）` when present.
fn parse_term_line(line: &str) -> Option<Term> {
    let (source, rest) = line.trim().split_once(TERM_SEPARATOR)?;
    let source = source.trim();
    if source.is_empty() {
        return None;
    }

    let rest = rest.trim();
    let (target, note) = match rest.split_once(NOTE_OPEN) {
        Some((target, note)) => {
            let note = note.trim();
            let note = note.strip_suffix(NOTE_CLOSE).unwrap_or(note);
            (target.trim(), note.trim())
        }
        None => (rest, ""),
    };

    Some(Term::new(source, target, note))
}
