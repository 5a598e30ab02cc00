/// Take at most `max_chars` characters from the start of `content`.
///
/// Counts `char`s rather than bytes so multi-byte text is never split.
pub fn content_snippet(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Render marker labels as `'A' or 'B'` for status lines.
pub fn quote_markers<S: AsRef<str>>(markers: &[S]) -> String {
    markers
        .iter()
        .map(|m| format!("'{}'", m.as_ref()))
        .collect::<Vec<_>>()
        .join(" or ")
}
