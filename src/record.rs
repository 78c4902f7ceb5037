//! Job records emitted to the sink

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata fields resolved for one listing, keyed by field name
///
/// A field maps to `None` when the query ran but found nothing for it.
pub type Metadata = BTreeMap<String, Option<String>>;

/// One extracted listing
///
/// The description and qualifications are always present (possibly empty);
/// the metadata fields are optional. All values are text: the sink only
/// accepts string scalars.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct JobRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_posted: Option<String>,

    pub job_description: String,

    pub qualifications: String,
}

impl JobRecord {
    /// Assembles a record from resolved metadata and the extracted texts
    ///
    /// Metadata fields outside the record's known keys are ignored.
    pub fn from_metadata(
        metadata: &Metadata,
        job_description: String,
        qualifications: String,
    ) -> Self {
        let field = |name: &str| {
            metadata
                .get(name)
                .cloned()
                .flatten()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            org_name: field("org_name"),
            job_title: field("job_title"),
            salary: field("salary"),
            location: field("location"),
            date_posted: field("date_posted"),
            job_description,
            qualifications,
        }
    }

    /// The record as a flat field map, with absent optionals omitted
    pub fn fields(&self) -> BTreeMap<&'static str, &str> {
        let mut fields = BTreeMap::new();
        for (name, value) in [
            ("org_name", &self.org_name),
            ("job_title", &self.job_title),
            ("salary", &self.salary),
            ("location", &self.location),
            ("date_posted", &self.date_posted),
        ] {
            if let Some(value) = value {
                fields.insert(name, value.as_str());
            }
        }
        fields.insert("job_description", self.job_description.as_str());
        fields.insert("qualifications", self.qualifications.as_str());
        fields
    }

    /// Short label for log lines
    pub fn label(&self) -> String {
        match (&self.job_title, &self.org_name) {
            (Some(title), Some(org)) => format!("{} @ {}", title, org),
            (Some(title), None) => title.clone(),
            (None, Some(org)) => format!("<untitled> @ {}", org),
            (None, None) => "<untitled>".to_string(),
        }
    }
}

/// Coerces a JSON scalar into the textual form the sink accepts
///
/// Numbers and booleans become their display form, `null` becomes `None`,
/// and nested values are kept as compact JSON.
pub fn coerce_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
