//! `Link` response header parsing.

/// Extracts the `rel="next"` target from a `Link` header value.
///
/// Entries look like `<https://api.example.com/x?page=2>; rel="next"` and are
/// separated by commas. Entries without both a target and a `rel` are ignored.
pub fn next_link(header: &str) -> Option<String> {
    header
        .split(',')
        .filter_map(parse_entry)
        .find(|(_, rel)| rel.split_whitespace().any(|r| r == "next"))
        .map(|(url, _)| url.to_string())
}

fn parse_entry(entry: &str) -> Option<(&str, &str)> {
    let entry = entry.trim();
    let start = entry.find('<')?;
    let end = start + entry[start..].find('>')?;
    let url = &entry[start + 1..end];

    let rel = entry[end + 1..]
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("rel="))?
        .trim_matches('"');

    if url.is_empty() || rel.is_empty() {
        return None;
    }
    Some((url, rel))
}
