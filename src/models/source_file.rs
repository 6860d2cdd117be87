use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{FileType, SourceFile};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "source_files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub institution_code: String,
    pub filename: String,
    /// Seconds since the Unix epoch, as reported by the filesystem
    pub modification_timestamp: i64,
    /// One of `marc`, `csv`, `text`, `excel`, `xml`
    pub file_type: String,
    pub completed: bool,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::record::Entity")]
    Records,
}

impl Related<super::record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for SourceFile {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let file_type = FileType::parse(&model.file_type).ok_or_else(|| {
            DbErr::Custom(format!(
                "source file {} has unknown type '{}'",
                model.id, model.file_type
            ))
        })?;

        Ok(Self {
            id: model.id,
            institution_code: model.institution_code,
            filename: model.filename,
            modification_timestamp: model.modification_timestamp,
            file_type,
            completed: model.completed,
        })
    }
}
