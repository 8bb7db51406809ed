//! Descriptive records: the human-readable side of a credential.
//!
//! These documents live outside the registry and are fetched from whatever
//! the credential's reference points at, so every field is validated here
//! before anything downstream sees it.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

/// Human-readable attributes of a credential.
///
/// Field names follow the published JSON schema (camelCase). The older
/// certificate layout (`studentName`, `course`, `university`, `pdfPath`) is
/// still read; when a document carries both spellings the current one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DescriptiveDocument")]
pub struct DescriptiveRecord {
    pub name: String,
    pub description: String,
    pub holder_display_name: String,
    pub program: String,
    pub grade: String,
    pub issue_date: NaiveDate,
    pub issuing_authority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_reference: Option<String>,
}

/// Wire form of a descriptive record, with both field layouts kept apart.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescriptiveDocument {
    name: Option<String>,
    description: Option<String>,
    holder_display_name: Option<String>,
    student_name: Option<String>,
    program: Option<String>,
    course: Option<String>,
    grade: Option<String>,
    #[serde(default, deserialize_with = "deserialize_issue_date")]
    issue_date: Option<NaiveDate>,
    issuing_authority: Option<String>,
    university: Option<String>,
    attachment_reference: Option<String>,
    pdf_path: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    value.ok_or_else(|| format!("missing field `{}`", field))
}

impl TryFrom<DescriptiveDocument> for DescriptiveRecord {
    type Error = String;

    fn try_from(doc: DescriptiveDocument) -> Result<Self, Self::Error> {
        let present = |s: &String| !s.trim().is_empty();
        let attachment_reference = doc
            .attachment_reference
            .filter(present)
            .or(doc.pdf_path.filter(present));
        Ok(Self {
            name: required(doc.name, "name")?,
            description: required(doc.description, "description")?,
            holder_display_name: required(
                doc.holder_display_name.or(doc.student_name),
                "holderDisplayName",
            )?,
            program: required(doc.program.or(doc.course), "program")?,
            grade: required(doc.grade, "grade")?,
            issue_date: doc
                .issue_date
                .ok_or_else(|| "missing field `issueDate`".to_string())?,
            issuing_authority: required(
                doc.issuing_authority.or(doc.university),
                "issuingAuthority",
            )?,
            attachment_reference,
        })
    }
}

impl DescriptiveRecord {
    /// Parse and validate an untrusted JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::SchemaError(e.to_string()))
    }

    /// Build the standard "Certificate of Completion" record.
    pub fn completion_certificate(
        holder_display_name: &str,
        program: &str,
        grade: &str,
        issue_date: NaiveDate,
        issuing_authority: &str,
    ) -> Self {
        Self {
            name: "Certificate of Completion".into(),
            description: format!(
                "Awarded to {} for completing {}",
                holder_display_name, program
            ),
            holder_display_name: holder_display_name.into(),
            program: program.into(),
            grade: grade.into(),
            issue_date,
            issuing_authority: issuing_authority.into(),
            attachment_reference: None,
        }
    }

    /// Attach a document reference (e.g. a PDF).
    pub fn with_attachment(mut self, reference: impl Into<String>) -> Self {
        self.attachment_reference = Some(reference.into());
        self
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp, keeping only the date.
fn deserialize_issue_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("issueDate is not ISO-8601: {}", raw)))
}
