use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::StoredSubfield;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subfields")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub field_id: i32,
    pub code: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::field::Entity",
        from = "Column::FieldId",
        to = "super::field::Column::Id"
    )]
    Field,
}

impl Related<super::field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Field.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for StoredSubfield {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            value: model.value,
        }
    }
}
