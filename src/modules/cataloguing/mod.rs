// Cataloguing Module
// Decodes source files into catalog records and reads fixed-length fields

pub mod fixed_field;
pub mod marcxml;

use crate::domain::{DecodedRecord, DomainError, FileType};

pub use marcxml::MarcXmlDecoder;

/// Turns the bytes of one source file into decoded records.
pub trait RecordDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<DecodedRecord>, DomainError>;
}

/// The decoder this crate ships for a file type, if any.
///
/// ISO 2709 and spreadsheet sources need an external decoder.
pub fn decoder_for(file_type: FileType) -> Option<Box<dyn RecordDecoder>> {
    match file_type {
        FileType::Xml => Some(Box::new(MarcXmlDecoder)),
        _ => None,
    }
}
