use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{FieldKind, StoredField};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fields")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub record_id: i32,
    pub tag: String,
    pub value: String,
    /// `control` or `data`
    pub kind: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::record::Entity",
        from = "Column::RecordId",
        to = "super::record::Column::Id"
    )]
    Record,
    #[sea_orm(has_many = "super::subfield::Entity")]
    Subfields,
}

impl Related<super::record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Record.def()
    }
}

impl Related<super::subfield::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subfields.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for StoredField {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            tag: model.tag,
            value: model.value,
            kind: FieldKind::parse(&model.kind).unwrap_or(FieldKind::Data),
        }
    }
}
