use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{RecordRef, RecordType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub file_id: i32,
    /// Copied from the owning source file so the dedup key can be indexed
    pub institution_code: String,
    /// `bib` or `holding`
    pub record_type: String,
    pub control_identifier: String,
    /// Numeric form of the record's `005` value, `0` when unknown
    pub modification_timestamp: f64,
    pub processed: bool,
    pub exported: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::source_file::Entity",
        from = "Column::FileId",
        to = "super::source_file::Column::Id"
    )]
    SourceFile,
    #[sea_orm(has_many = "super::field::Entity")]
    Fields,
}

impl Related<super::source_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourceFile.def()
    }
}

impl Related<super::field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fields.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RecordRef {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            file_id: model.file_id,
            institution_code: model.institution_code,
            record_type: RecordType::parse(&model.record_type),
            control_identifier: model.control_identifier,
            modification_timestamp: model.modification_timestamp,
            processed: model.processed,
            exported: model.exported,
        }
    }
}
