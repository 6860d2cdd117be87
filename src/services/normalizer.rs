//! Field Normalizer - decoded record to storable fields
//!
//! Control tags with record-level meaning are dispatched through a
//! [`TagRegistry`] instead of a chain of conditionals, so new tags can be
//! handled by registering a function.

use std::collections::HashMap;

use crate::domain::{DecodedRecord, FieldKind, RecordType};

/// Record-level facts gathered from control fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordHeader {
    pub record_type: Option<RecordType>,
    pub control_identifier: String,
    pub modification_timestamp: f64,
    pub institution_present: bool,
}

pub type ControlTagHandler = fn(&mut RecordHeader, &str);

/// Control tag → handler lookup table.
#[derive(Clone)]
pub struct TagRegistry {
    handlers: HashMap<String, ControlTagHandler>,
}

impl TagRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register (or replace) the handler for a control tag
    pub fn register(&mut self, tag: &str, handler: ControlTagHandler) -> &mut Self {
        self.handlers.insert(tag.to_string(), handler);
        self
    }

    pub fn get(&self, tag: &str) -> Option<ControlTagHandler> {
        self.handlers.get(tag).copied()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("001", |header, value| {
                header.control_identifier = value.trim().to_string();
            })
            .register("003", |header, _| header.institution_present = true)
            .register("004", |header, _| header.record_type = Some(RecordType::Holding))
            .register("005", |header, value| {
                header.modification_timestamp = parse_timestamp(value);
            });
        registry
    }
}

/// `005` value as a number; anything unparsable counts as `0`.
pub fn parse_timestamp(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(ts) if ts.is_finite() => ts,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedField {
    pub tag: String,
    pub value: String,
    pub kind: FieldKind,
    /// `(code, value)` pairs; empty for control fields
    pub subfields: Vec<(String, String)>,
}

/// A record ready for the version resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub record_type: RecordType,
    /// Empty when the source record had no `001`
    pub control_identifier: String,
    pub modification_timestamp: f64,
    pub fields: Vec<NormalizedField>,
}

impl NormalizedRecord {
    /// Flat `(tag, value)` control entries
    pub fn control_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Control)
            .map(|f| (f.tag.as_str(), f.value.as_str()))
    }

    /// Flat `(tag, code, value)` data entries
    pub fn data_entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Data)
            .flat_map(|f| {
                f.subfields
                    .iter()
                    .map(move |(code, value)| (f.tag.as_str(), code.as_str(), value.as_str()))
            })
    }
}

#[derive(Clone, Default)]
pub struct FieldNormalizer {
    registry: TagRegistry,
}

impl FieldNormalizer {
    pub fn new(registry: TagRegistry) -> Self {
        Self { registry }
    }

    pub fn registry_mut(&mut self) -> &mut TagRegistry {
        &mut self.registry
    }

    pub fn normalize(&self, record: &DecodedRecord, institution_code: &str) -> NormalizedRecord {
        let mut header = RecordHeader::default();
        let mut fields = Vec::with_capacity(record.control_fields.len() + record.data_fields.len() + 1);

        for entry in &record.control_fields {
            if let Some(handler) = self.registry.get(&entry.tag) {
                handler(&mut header, &entry.value);
            }
            fields.push(NormalizedField {
                tag: entry.tag.clone(),
                value: entry.value.clone(),
                kind: FieldKind::Control,
                subfields: Vec::new(),
            });
        }

        if !header.institution_present {
            // Keep control fields in tag order around the synthesized 003
            let position = fields
                .iter()
                .position(|f| f.tag.as_str() > "003")
                .unwrap_or(fields.len());
            fields.insert(
                position,
                NormalizedField {
                    tag: "003".to_string(),
                    value: institution_code.to_string(),
                    kind: FieldKind::Control,
                    subfields: Vec::new(),
                },
            );
        }

        for entry in &record.data_fields {
            let subfields: Vec<(String, String)> = entry
                .subfields
                .iter()
                .map(|s| (s.code.to_string(), s.value.clone()))
                .collect();
            let value = subfields
                .iter()
                .map(|(_, v)| v.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            fields.push(NormalizedField {
                tag: entry.tag.clone(),
                value,
                kind: FieldKind::Data,
                subfields,
            });
        }

        NormalizedRecord {
            record_type: header.record_type.unwrap_or(RecordType::Bib),
            control_identifier: header.control_identifier,
            modification_timestamp: header.modification_timestamp,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DecodedRecord {
        DecodedRecord::new()
            .with_control("001", " A123 ")
            .with_control("005", "20230101120000.0")
            .with_control("008", "790618s1968    xxu           000 0 eng d")
            .with_data("245", &[('a', "A title /"), ('c', "Someone.")])
    }

    #[test]
    fn test_bib_header_and_synthesized_003() {
        let record = FieldNormalizer::default().normalize(&sample(), "XYZ");

        assert_eq!(record.record_type, RecordType::Bib);
        assert_eq!(record.control_identifier, "A123");
        assert_eq!(record.modification_timestamp, 20230101120000.0);

        let controls: Vec<(&str, &str)> = record.control_entries().collect();
        assert_eq!(controls[0].0, "001");
        assert_eq!(controls[1], ("003", "XYZ"));
        assert_eq!(controls[2].0, "005");
    }

    #[test]
    fn test_existing_003_is_kept() {
        let decoded = sample().with_control("003", "ABC");
        let record = FieldNormalizer::default().normalize(&decoded, "XYZ");

        let institutions: Vec<&str> = record
            .control_entries()
            .filter(|(tag, _)| *tag == "003")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(institutions, vec!["ABC"]);
    }

    #[test]
    fn test_004_makes_a_holding() {
        let decoded = sample().with_control("004", "B77");
        let record = FieldNormalizer::default().normalize(&decoded, "XYZ");
        assert_eq!(record.record_type, RecordType::Holding);
    }

    #[test]
    fn test_missing_001_and_bad_005() {
        let decoded = DecodedRecord::new().with_control("005", "not-a-date");
        let record = FieldNormalizer::default().normalize(&decoded, "XYZ");
        assert_eq!(record.control_identifier, "");
        assert_eq!(record.modification_timestamp, 0.0);
        assert_eq!(parse_timestamp("NaN"), 0.0);
        assert_eq!(parse_timestamp("inf"), 0.0);
    }

    #[test]
    fn test_data_entries_are_flattened() {
        let record = FieldNormalizer::default().normalize(&sample(), "XYZ");
        let entries: Vec<(&str, &str, &str)> = record.data_entries().collect();
        assert_eq!(
            entries,
            vec![("245", "a", "A title /"), ("245", "c", "Someone.")]
        );

        let title = record.fields.iter().find(|f| f.tag == "245").expect("245");
        assert_eq!(title.value, "A title / Someone.");
    }

    #[test]
    fn test_registered_handler_overrides_default() {
        let mut normalizer = FieldNormalizer::default();
        normalizer
            .registry_mut()
            .register("001", |header, value| {
                header.control_identifier = value.trim().to_ascii_uppercase();
            });

        let decoded = DecodedRecord::new().with_control("001", "ocm42");
        assert_eq!(normalizer.normalize(&decoded, "XYZ").control_identifier, "OCM42");
    }
}
