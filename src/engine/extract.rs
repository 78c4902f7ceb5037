//! Qualifications extraction from free-form description text
//!
//! Postings use inconsistent headers, so extraction is a fallback chain:
//! minimum/preferred sections first, then a generic "Qualifications:"
//! header, then "Requirement(s):". Every pattern is case-insensitive, spans
//! line breaks and only considers the first occurrence of its header.

use regex::Regex;
use std::sync::OnceLock;

const MINIMUM_LABEL: &str = "Minimum Qualifications:";
const PREFERRED_LABEL: &str = "Preferred Qualifications:";

/// Sections found in a description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualificationSections {
    /// Minimum and preferred sections, either of which may be empty
    Split { minimum: String, preferred: String },

    /// A single untitled section
    Generic(String),
}

impl QualificationSections {
    /// Renders the sections as the text stored in a record
    pub fn render(&self) -> String {
        match self {
            Self::Split { minimum, preferred } => {
                let mut parts = Vec::with_capacity(2);
                if !minimum.is_empty() {
                    parts.push(format!("{}\n{}", MINIMUM_LABEL, minimum));
                }
                if !preferred.is_empty() {
                    parts.push(format!("{}\n{}", PREFERRED_LABEL, preferred));
                }
                parts.join("\n\n").trim().to_string()
            }
            Self::Generic(text) => text.trim().to_string(),
        }
    }
}

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("qualification pattern is valid"))
}

fn minimum_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    pattern(
        &CELL,
        r"(?is)Minimum Qualifications:\s*(.*?)\s*(?:Preferred Qualifications:|\z)",
    )
}

fn preferred_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    pattern(&CELL, r"(?is)Preferred Qualifications:\s*(.*)")
}

fn generic_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    pattern(&CELL, r"(?is)Qualifications:\s*(.*)")
}

fn requirements_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    pattern(&CELL, r"(?is)Requirements?:\s*(.*)")
}

/// Trimmed first capture group of the first match
///
/// `Some("")` means the header is present with nothing after it.
fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Locates the qualification sections of `description`
///
/// A minimum or preferred header claims the description even when both of
/// its sections are empty. Returns `None` when no header is present.
pub fn find_sections(description: &str) -> Option<QualificationSections> {
    let minimum = capture(minimum_pattern(), description);
    let preferred = capture(preferred_pattern(), description);
    if minimum.is_some() || preferred.is_some() {
        return Some(QualificationSections::Split {
            minimum: minimum.unwrap_or_default(),
            preferred: preferred.unwrap_or_default(),
        });
    }

    capture(generic_pattern(), description)
        .or_else(|| capture(requirements_pattern(), description))
        .map(QualificationSections::Generic)
}

/// Extracts the qualifications text from a job description
///
/// Returns an empty string when the description has no recognizable
/// qualifications header.
///
/// ```
/// use scroll_harvest::engine::extract_qualifications;
///
/// let text = "About us...\nRequirements:\n- SQL\n- Python\n";
/// assert_eq!(extract_qualifications(text), "- SQL\n- Python");
/// ```
pub fn extract_qualifications(description: &str) -> String {
    find_sections(description)
        .map(|sections| sections.render())
        .unwrap_or_default()
}
