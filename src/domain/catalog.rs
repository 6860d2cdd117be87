//! Catalog value types shared by the store, the normalizer and the scope filter

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The two catalog record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Bib,
    Holding,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Bib => "bib",
            RecordType::Holding => "holding",
        }
    }

    /// Parse the stored representation. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bib" => Some(RecordType::Bib),
            "holding" => Some(RecordType::Holding),
            _ => None,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Control,
    Data,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Control => "control",
            FieldKind::Data => "data",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "control" => Some(FieldKind::Control),
            "data" => Some(FieldKind::Data),
            _ => None,
        }
    }
}

/// Kind of source file discovered in an institution's drop directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Marc,
    Csv,
    Text,
    Excel,
    Xml,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Marc => "marc",
            FileType::Csv => "csv",
            FileType::Text => "text",
            FileType::Excel => "excel",
            FileType::Xml => "xml",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "marc" => Some(FileType::Marc),
            "csv" => Some(FileType::Csv),
            "text" => Some(FileType::Text),
            "excel" => Some(FileType::Excel),
            "xml" => Some(FileType::Xml),
            _ => None,
        }
    }

    /// Detect the file type from the extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mrc" | "marc" | "dat" => Some(FileType::Marc),
            "csv" => Some(FileType::Csv),
            "txt" => Some(FileType::Text),
            "xls" | "xlsx" => Some(FileType::Excel),
            "xml" | "marcxml" => Some(FileType::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source file registered in the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFile {
    pub id: i32,
    pub institution_code: String,
    pub filename: String,
    /// Seconds since the Unix epoch
    pub modification_timestamp: i64,
    pub file_type: FileType,
    /// Set once every record of the file has been ingested
    pub completed: bool,
}

/// Lightweight view of a stored record row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRef {
    pub id: i32,
    pub file_id: i32,
    pub institution_code: String,
    /// `None` when the stored type string is not one we know.
    pub record_type: Option<RecordType>,
    pub control_identifier: String,
    pub modification_timestamp: f64,
    pub processed: bool,
    pub exported: bool,
}

/// A stored field row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredField {
    pub id: i32,
    pub tag: String,
    pub value: String,
    pub kind: FieldKind,
}

/// A stored subfield row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSubfield {
    pub id: i32,
    pub code: String,
    pub value: String,
}

// Decoded input handed over by a format decoder

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlEntry {
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubfieldEntry {
    pub code: char,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataEntry {
    pub tag: String,
    pub subfields: Vec<SubfieldEntry>,
}

/// A catalog record as produced by a decoder: ordered control entries and
/// ordered data entries with their subfields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedRecord {
    pub control_fields: Vec<ControlEntry>,
    pub data_fields: Vec<DataEntry>,
}

impl DecodedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(mut self, tag: &str, value: &str) -> Self {
        self.control_fields.push(ControlEntry {
            tag: tag.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn with_data(mut self, tag: &str, subfields: &[(char, &str)]) -> Self {
        self.data_fields.push(DataEntry {
            tag: tag.to_string(),
            subfields: subfields
                .iter()
                .map(|(code, value)| SubfieldEntry {
                    code: *code,
                    value: value.to_string(),
                })
                .collect(),
        });
        self
    }

    pub fn control_value(&self, tag: &str) -> Option<&str> {
        self.control_fields
            .iter()
            .find(|c| c.tag == tag)
            .map(|c| c.value.as_str())
    }
}
