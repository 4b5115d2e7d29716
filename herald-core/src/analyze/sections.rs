// Best-effort extraction of named sections from unstructured model output.

use std::collections::HashMap;

/// Characters that may precede a marker on its heading line (`### `, `**`, `1. `).
fn is_heading_prefix(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_digit() || matches!(c, '#' | '*' | '_' | '-' | '>' | '"' | '.')
}

/// Characters that may follow a marker on its heading line (`**`, `:`).
fn is_heading_suffix(c: char) -> bool {
    c.is_whitespace() || matches!(c, '*' | '_' | ':' | '"' | '#')
}

/// Split `text` into sections keyed by marker.
///
/// A section's body runs from just after its marker's first occurrence to the
/// nearest following occurrence of any *later* marker, or to the end of the
/// text. Heading decoration around a marker on its own line is dropped.
/// Markers that never occur have no entry in the result.
pub fn extract_sections(text: &str, markers: &[&str]) -> HashMap<String, String> {
    let mut sections = HashMap::new();

    for (i, marker) in markers.iter().enumerate() {
        let Some(pos) = text.find(marker) else {
            continue;
        };
        let body_start = body_start(text, pos + marker.len());

        let body_end = markers[i + 1..]
            .iter()
            .filter_map(|next| {
                text[body_start..]
                    .find(next)
                    .map(|offset| heading_start(text, body_start + offset).max(body_start))
            })
            .min()
            .unwrap_or(text.len());

        sections.insert(
            (*marker).to_string(),
            text[body_start..body_end].trim().to_string(),
        );
    }

    sections
}

/// Where the body begins after a marker ending at `marker_end`: skip decoration
/// on the rest of the heading line, and the line break if nothing else is on it.
fn body_start(text: &str, marker_end: usize) -> usize {
    let rest = &text[marker_end..];
    let line_len = rest.find('\n').unwrap_or(rest.len());
    let line = &rest[..line_len];

    if line.chars().all(is_heading_suffix) {
        // Heading stands alone; body starts on the next line.
        return (marker_end + line_len + 1).min(text.len());
    }

    let skipped: usize = line
        .chars()
        .take_while(|c| is_heading_suffix(*c))
        .map(char::len_utf8)
        .sum();
    marker_end + skipped
}

/// Start of the heading that contains the marker at `pos`: the line start when
/// only decoration precedes the marker on that line, else `pos` itself.
fn heading_start(text: &str, pos: usize) -> usize {
    let line_start = text[..pos].rfind('\n').map_or(0, |n| n + 1);
    if text[line_start..pos].chars().all(is_heading_prefix) {
        line_start
    } else {
        pos
    }
}
