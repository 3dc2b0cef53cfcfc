//! Line-based splitting of memory files into bounded segments.

/// Split `content` into segments of at most `max_size` characters.
///
/// Lines are accumulated until adding the next one would push the segment
/// past `max_size`, at which point the segment is closed. Newlines are not
/// counted towards the budget, and a single line longer than the budget
/// becomes a segment of its own. Blank lines before the first non-blank line
/// are dropped; blank lines after it are kept.
///
/// Always returns at least one segment, which is empty for blank input.
///
/// # Examples
///
/// ```
/// use memvec::chunking::chunk_content;
///
/// let chunks = chunk_content("\n\nfirst\nsecond", 500);
/// assert_eq!(chunks, vec!["first\nsecond".to_string()]);
/// ```
pub fn chunk_content(content: &str, max_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0;

    for line in content.split('\n') {
        if current.is_empty() && line.trim().is_empty() {
            continue;
        }
        let line_len = line.chars().count();
        if current_size + line_len > max_size && !current.is_empty() {
            chunks.push(current.join("\n"));
            current.clear();
            current_size = 0;
        }
        current.push(line);
        current_size += line_len;
    }

    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}
