//! Renders a concept entry as sectioned, human-readable text.
//!
//! Fixed section order: title, level, definition, explanation, example, key points,
//! interview tip. Present sections are separated by one blank line; nothing trails the
//! last one.

use crate::knowledge::{display_name, title_case, value_text, ConceptEntry};

pub const TITLE_LABEL: &str = "📘 Concept:";
pub const LEVEL_LABEL: &str = "🎯 Level:";
pub const DEFINITION_LABEL: &str = "📖 Definition:";
pub const EXPLANATION_LABEL: &str = "🧠 Explanation:";
pub const EXAMPLE_LABEL: &str = "💡 Example:";
pub const KEY_POINTS_LABEL: &str = "🔑 Key Points:";
pub const INTERVIEW_TIP_LABEL: &str = "🎤 Interview Tip:";

const SECTION_SEPARATOR: &str = "\n\n";

pub fn format_concept(name: &str, entry: &ConceptEntry) -> String {
    let mut sections = vec![format!("{} {}", TITLE_LABEL, title_case(&display_name(name)))];

    match entry {
        ConceptEntry::Structured(record) => {
            if let Some(level) = record.level() {
                sections.push(format!("{} {}", LEVEL_LABEL, title_case(&level)));
            }
            if let Some(definition) = record.definition() {
                sections.push(block(DEFINITION_LABEL, &definition));
            }
            if let Some(explanation) = record.explanation() {
                sections.push(block(EXPLANATION_LABEL, &explanation));
            }
            if let Some(example) = record.example() {
                sections.push(block(EXAMPLE_LABEL, &example));
            }
            if let Some(points) = record.key_points() {
                sections.push(block(KEY_POINTS_LABEL, &points.join(", ")));
            }
            if let Some(tip) = record.interview_tip() {
                sections.push(block(INTERVIEW_TIP_LABEL, &tip));
            }
        }
        ConceptEntry::Freeform(value) => {
            let text = value_text(value);
            if !text.is_empty() {
                sections.push(text);
            }
        }
    }

    sections.join(SECTION_SEPARATOR)
}

fn block(label: &str, body: &str) -> String {
    format!("{}\n{}", label, body)
}
