//! MARCXML decoder
//!
//! Reads `<record>` elements (MARC 21 slim schema, any namespace prefix) into
//! [`DecodedRecord`]s. Text is kept verbatim: fixed-length control fields are
//! position-sensitive, so whitespace is never trimmed inside a value.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::RecordDecoder;
use crate::domain::{ControlEntry, DataEntry, DecodedRecord, DomainError, SubfieldEntry};

#[derive(Debug, Default, Clone, Copy)]
pub struct MarcXmlDecoder;

impl RecordDecoder for MarcXmlDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<DecodedRecord>, DomainError> {
        parse_marcxml(bytes)
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

pub fn parse_marcxml(bytes: &[u8]) -> Result<Vec<DecodedRecord>, DomainError> {
    let mut reader = Reader::from_reader(bytes);

    let mut records = Vec::new();
    let mut current: Option<DecodedRecord> = None;
    let mut control_tag: Option<String> = None;
    let mut data_field: Option<DataEntry> = None;
    let mut subfield_code: Option<char> = None;
    let mut text = String::new();

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"record" => current = Some(DecodedRecord::new()),
                b"controlfield" => {
                    control_tag = attribute(&e, b"tag");
                    text.clear();
                }
                b"datafield" => {
                    data_field = attribute(&e, b"tag").map(|tag| DataEntry {
                        tag,
                        subfields: Vec::new(),
                    });
                }
                b"subfield" => {
                    subfield_code = attribute(&e, b"code").and_then(|c| c.chars().next());
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"controlfield" => {
                    if let (Some(record), Some(tag)) = (current.as_mut(), attribute(&e, b"tag")) {
                        record.control_fields.push(ControlEntry {
                            tag,
                            value: String::new(),
                        });
                    }
                }
                b"subfield" => {
                    if let (Some(field), Some(code)) = (
                        data_field.as_mut(),
                        attribute(&e, b"code").and_then(|c| c.chars().next()),
                    ) {
                        field.subfields.push(SubfieldEntry {
                            code,
                            value: String::new(),
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if control_tag.is_some() || subfield_code.is_some() {
                    let value = e
                        .unescape()
                        .map_err(|e| DomainError::Decode(format!("XML text: {}", e)))?;
                    text.push_str(&value);
                }
            }
            Ok(Event::CData(e)) => {
                if control_tag.is_some() || subfield_code.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"controlfield" => {
                    if let (Some(record), Some(tag)) = (current.as_mut(), control_tag.take()) {
                        record.control_fields.push(ControlEntry {
                            tag,
                            value: std::mem::take(&mut text),
                        });
                    }
                }
                b"subfield" => {
                    if let (Some(field), Some(code)) = (data_field.as_mut(), subfield_code.take()) {
                        field.subfields.push(SubfieldEntry {
                            code,
                            value: std::mem::take(&mut text),
                        });
                    }
                }
                b"datafield" => {
                    if let (Some(record), Some(field)) = (current.as_mut(), data_field.take()) {
                        record.data_fields.push(field);
                    }
                }
                b"record" => {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DomainError::Decode(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => (),
        }
        buf.clear();
    }

    Ok(records)
}
