pub mod field;
pub mod record;
pub mod source_file;
pub mod subfield;
