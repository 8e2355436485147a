/*!
 * Window extraction over the source lines.
 *
 * A window is the longest run of consecutive lines, starting at a given
 * index, whose summed character count stays within a budget. The first line
 * is always taken so that an oversized line still makes progress.
 */

/// Character length used for every budget in the engine
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Take a window of lines starting at `start_idx`.
///
/// Returns the index just past the window and the window itself. The window
/// is empty only when `start_idx` is already at or beyond the end of input.
pub fn extract_chunk(lines: &[String], max_length: usize, start_idx: usize) -> (usize, &[String]) {
    if start_idx >= lines.len() {
        return (start_idx.max(lines.len()), &[]);
    }

    let mut current_length = 0;
    let mut end = start_idx;

    while end < lines.len() {
        let line_length = char_len(&lines[end]);
        if end > start_idx && current_length + line_length > max_length {
            break;
        }
        current_length += line_length;
        end += 1;
    }

    (end, &lines[start_idx..end])
}
