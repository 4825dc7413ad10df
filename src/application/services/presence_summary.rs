use crate::domain::entities::PresenceEntry;
use std::collections::HashMap;

/// Host-supplied field-name-to-label table. Unknown keys fall back to a
/// title-cased rendering of the raw key.
#[derive(Debug, Clone, Default)]
pub struct FieldLabels {
    labels: HashMap<String, String>,
}

impl FieldLabels {
    pub fn new(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            labels: pairs
                .iter()
                .map(|(key, label)| (key.to_string(), label.to_string()))
                .collect(),
        }
    }

    pub fn label(&self, field: &str) -> String {
        self.labels
            .get(field)
            .cloned()
            .unwrap_or_else(|| title_case_key(field))
    }
}

/// Indicator text for an entity's presence set. `None` means the caller
/// hides the indicator. Field detail only appears for a single editor; the
/// aggregate case is a bare count.
pub fn summarize(entries: &[PresenceEntry], labels: &FieldLabels) -> Option<String> {
    match entries {
        [] => None,
        [entry] => Some(editor_line(entry, labels)),
        many => Some(format!("{} people are editing", many.len())),
    }
}

/// Expanded per-editor view: one line per editor, in entry order.
pub fn editor_lines(entries: &[PresenceEntry], labels: &FieldLabels) -> Vec<String> {
    entries
        .iter()
        .map(|entry| editor_line(entry, labels))
        .collect()
}

fn editor_line(entry: &PresenceEntry, labels: &FieldLabels) -> String {
    if entry.fields.is_empty() {
        return format!("{} is editing", entry.user_name);
    }
    let joined = entry
        .fields
        .iter()
        .map(|field| labels.label(field))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} is editing {}", entry.user_name, joined)
}

/// "dueDate" -> "Due Date", "shot_number" -> "Shot Number".
fn title_case_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
