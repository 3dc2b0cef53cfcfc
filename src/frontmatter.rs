//! Tag extraction from a leading `---` front matter block.

const DELIMITER: &str = "---";
const TAGS_KEY: &str = "tags:";

/// Extract the comma-separated `tags:` list from the file's front matter.
///
/// Only a block that opens at the very start of the text and is closed by a
/// second `---` counts as front matter. Square brackets around the list are
/// trimmed and empty entries are dropped. Malformed metadata never fails; it
/// yields whatever could be read, usually nothing.
///
/// # Examples
///
/// ```
/// use memvec::frontmatter::extract_tags;
///
/// let tags = extract_tags("---\ntitle: Notes\ntags: [rust, memory]\n---\nbody");
/// assert_eq!(tags, vec!["rust", "memory"]);
/// ```
pub fn extract_tags(content: &str) -> Vec<String> {
    if !content.starts_with(DELIMITER) {
        return Vec::new();
    }
    let mut parts = content.splitn(3, DELIMITER);
    let (Some(_), Some(frontmatter), Some(_)) = (parts.next(), parts.next(), parts.next()) else {
        return Vec::new();
    };

    frontmatter
        .lines()
        .find_map(|line| line.strip_prefix(TAGS_KEY))
        .map(|tag_str| {
            tag_str
                .trim()
                .split(',')
                .map(|t| t.trim().trim_matches(|c: char| c == '[' || c == ']').trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
