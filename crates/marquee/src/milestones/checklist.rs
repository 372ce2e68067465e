//! The checklist format: one item per line, `- [ ] text` pending, `- [x] text` done.
//! Nothing else (nesting, numbering, other bullets) counts as an item.

pub const PENDING: &str = "- [ ] ";
pub const DONE: &str = "- [x] ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub text: String,
    pub done: bool,
}

pub fn parse(document: &str) -> Vec<ChecklistItem> {
    document.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<ChecklistItem> {
    if let Some(text) = line.strip_prefix(PENDING) {
        Some(ChecklistItem {
            text: text.to_string(),
            done: false,
        })
    } else {
        line.strip_prefix(DONE).map(|text| ChecklistItem {
            text: text.to_string(),
            done: true,
        })
    }
}

/// The first pending item, top to bottom
pub fn next_pending(document: &str) -> Option<String> {
    parse(document)
        .into_iter()
        .find(|item| !item.done)
        .map(|item| item.text)
}

/// Tick the first pending line whose text is exactly `text`.
///
/// Only the three bytes `[ ]` of that line change; a document with no such
/// line comes back unchanged.
pub fn mark_complete(document: &str, text: &str) -> String {
    let mut offset = 0;
    for line in document.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let content = content.strip_suffix('\r').unwrap_or(content);

        if content.strip_prefix(PENDING) == Some(text) {
            let mut updated = String::with_capacity(document.len());
            updated.push_str(&document[..offset]);
            updated.push_str(DONE);
            updated.push_str(&document[offset + PENDING.len()..]);
            return updated;
        }
        offset += line.len();
    }
    document.to_string()
}
