//! SeaORM implementation of the catalog store
//!
//! One generic store type serves both the pooled connection (autocommit) and
//! an open transaction, so every operation has a single implementation.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain::{
    CatalogRepository, CatalogStore, CatalogUnit, DomainError, FieldKind, FileType, RecordRef,
    RecordType, SourceFile, StoredField, StoredSubfield,
};
use crate::models::{field, record, source_file, subfield};

/// SeaORM-based catalog store over any connection-like handle
pub struct SeaOrmCatalogStore<C> {
    conn: C,
}

/// Autocommit store backed by the connection pool
pub type SeaOrmCatalogRepository = SeaOrmCatalogStore<DatabaseConnection>;

/// Store bound to one open transaction
pub type SeaOrmCatalogUnit = SeaOrmCatalogStore<DatabaseTransaction>;

impl<C> SeaOrmCatalogStore<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }
}

impl<C> SeaOrmCatalogStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn field_ids_with_tag(&self, record_id: i32, tag: &str) -> Result<Vec<i32>, DomainError> {
        let ids = field::Entity::find()
            .select_only()
            .column(field::Column::Id)
            .filter(field::Column::RecordId.eq(record_id))
            .filter(field::Column::Tag.eq(tag))
            .order_by_asc(field::Column::Id)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?;
        Ok(ids)
    }
}

#[async_trait]
impl<C> CatalogStore for SeaOrmCatalogStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find_source_file(
        &self,
        institution_code: &str,
        filename: &str,
        modification_timestamp: i64,
    ) -> Result<Option<SourceFile>, DomainError> {
        let model = source_file::Entity::find()
            .filter(source_file::Column::InstitutionCode.eq(institution_code))
            .filter(source_file::Column::Filename.eq(filename))
            .filter(source_file::Column::ModificationTimestamp.eq(modification_timestamp))
            .one(&self.conn)
            .await?;

        Ok(model.map(SourceFile::try_from).transpose()?)
    }

    async fn insert_source_file(
        &self,
        institution_code: &str,
        filename: &str,
        modification_timestamp: i64,
        file_type: FileType,
    ) -> Result<SourceFile, DomainError> {
        let new_file = source_file::ActiveModel {
            institution_code: Set(institution_code.to_string()),
            filename: Set(filename.to_string()),
            modification_timestamp: Set(modification_timestamp),
            file_type: Set(file_type.as_str().to_string()),
            completed: Set(false),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = source_file::Entity::insert(new_file)
            .exec(&self.conn)
            .await?;

        Ok(SourceFile {
            id: result.last_insert_id,
            institution_code: institution_code.to_string(),
            filename: filename.to_string(),
            modification_timestamp,
            file_type,
            completed: false,
        })
    }

    async fn mark_source_file_completed(&self, file_id: i32) -> Result<(), DomainError> {
        let result = source_file::Entity::update_many()
            .col_expr(source_file::Column::Completed, Expr::value(true))
            .filter(source_file::Column::Id.eq(file_id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }

    async fn get_source_file(&self, file_id: i32) -> Result<Option<SourceFile>, DomainError> {
        let model = source_file::Entity::find_by_id(file_id)
            .one(&self.conn)
            .await?;
        Ok(model.map(SourceFile::try_from).transpose()?)
    }

    async fn find_record(
        &self,
        institution_code: &str,
        record_type: RecordType,
        control_identifier: &str,
    ) -> Result<Option<RecordRef>, DomainError> {
        let model = record::Entity::find()
            .filter(record::Column::InstitutionCode.eq(institution_code))
            .filter(record::Column::RecordType.eq(record_type.as_str()))
            .filter(record::Column::ControlIdentifier.eq(control_identifier))
            .one(&self.conn)
            .await?;

        Ok(model.map(RecordRef::from))
    }

    async fn get_record(&self, record_id: i32) -> Result<Option<RecordRef>, DomainError> {
        let model = record::Entity::find_by_id(record_id).one(&self.conn).await?;
        Ok(model.map(RecordRef::from))
    }

    async fn get_modification_timestamp(&self, record_id: i32) -> Result<f64, DomainError> {
        let timestamp = record::Entity::find_by_id(record_id)
            .select_only()
            .column(record::Column::ModificationTimestamp)
            .into_tuple::<f64>()
            .one(&self.conn)
            .await?
            .ok_or(DomainError::NotFound)?;
        Ok(timestamp)
    }

    async fn insert_record(
        &self,
        file_id: i32,
        record_type: RecordType,
        control_identifier: &str,
        modification_timestamp: f64,
    ) -> Result<i32, DomainError> {
        let file = source_file::Entity::find_by_id(file_id)
            .one(&self.conn)
            .await?
            .ok_or(DomainError::NotFound)?;

        let now = chrono::Utc::now().to_rfc3339();
        let new_record = record::ActiveModel {
            file_id: Set(file_id),
            institution_code: Set(file.institution_code),
            record_type: Set(record_type.as_str().to_string()),
            control_identifier: Set(control_identifier.to_string()),
            modification_timestamp: Set(modification_timestamp),
            processed: Set(false),
            exported: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = record::Entity::insert(new_record).exec(&self.conn).await?;
        Ok(result.last_insert_id)
    }

    async fn update_modification_timestamp(
        &self,
        record_id: i32,
        modification_timestamp: f64,
    ) -> Result<(), DomainError> {
        let result = record::Entity::update_many()
            .col_expr(
                record::Column::ModificationTimestamp,
                Expr::value(modification_timestamp),
            )
            .col_expr(
                record::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(record::Column::Id.eq(record_id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }

    async fn reset_record(&self, record_id: i32, file_id: i32) -> Result<(), DomainError> {
        let result = record::Entity::update_many()
            .col_expr(record::Column::FileId, Expr::value(file_id))
            .col_expr(record::Column::Processed, Expr::value(false))
            .col_expr(record::Column::Exported, Expr::value(false))
            .filter(record::Column::Id.eq(record_id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }

    async fn insert_field(
        &self,
        record_id: i32,
        tag: &str,
        value: &str,
        kind: FieldKind,
    ) -> Result<i32, DomainError> {
        let new_field = field::ActiveModel {
            record_id: Set(record_id),
            tag: Set(tag.to_string()),
            value: Set(value.to_string()),
            kind: Set(kind.as_str().to_string()),
            ..Default::default()
        };

        let result = field::Entity::insert(new_field).exec(&self.conn).await?;
        Ok(result.last_insert_id)
    }

    async fn insert_subfield(
        &self,
        field_id: i32,
        code: &str,
        value: &str,
    ) -> Result<i32, DomainError> {
        let new_subfield = subfield::ActiveModel {
            field_id: Set(field_id),
            code: Set(code.to_string()),
            value: Set(value.to_string()),
            ..Default::default()
        };

        let result = subfield::Entity::insert(new_subfield)
            .exec(&self.conn)
            .await?;
        Ok(result.last_insert_id)
    }

    async fn list_field_ids(&self, record_id: i32) -> Result<Vec<i32>, DomainError> {
        let ids = field::Entity::find()
            .select_only()
            .column(field::Column::Id)
            .filter(field::Column::RecordId.eq(record_id))
            .order_by_asc(field::Column::Id)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?;
        Ok(ids)
    }

    async fn list_fields(&self, record_id: i32) -> Result<Vec<StoredField>, DomainError> {
        let fields = field::Entity::find()
            .filter(field::Column::RecordId.eq(record_id))
            .order_by_asc(field::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(fields.into_iter().map(StoredField::from).collect())
    }

    async fn list_subfields(&self, field_id: i32) -> Result<Vec<StoredSubfield>, DomainError> {
        let subfields = subfield::Entity::find()
            .filter(subfield::Column::FieldId.eq(field_id))
            .order_by_asc(subfield::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(subfields.into_iter().map(StoredSubfield::from).collect())
    }

    async fn delete_subfields(&self, field_id: i32) -> Result<(), DomainError> {
        subfield::Entity::delete_many()
            .filter(subfield::Column::FieldId.eq(field_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    async fn delete_fields(&self, record_id: i32) -> Result<(), DomainError> {
        field::Entity::delete_many()
            .filter(field::Column::RecordId.eq(record_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    async fn delete_record(&self, record_id: i32) -> Result<(), DomainError> {
        let result = record::Entity::delete_by_id(record_id)
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }

    async fn list_unprocessed_record_ids(&self) -> Result<Vec<i32>, DomainError> {
        let ids = record::Entity::find()
            .select_only()
            .column(record::Column::Id)
            .filter(record::Column::Processed.eq(false))
            .order_by_asc(record::Column::Id)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?;
        Ok(ids)
    }

    async fn mark_processed(&self, record_id: i32) -> Result<(), DomainError> {
        let result = record::Entity::update_many()
            .col_expr(record::Column::Processed, Expr::value(true))
            .filter(record::Column::Id.eq(record_id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }

    async fn field_values(&self, record_id: i32, tag: &str) -> Result<Vec<String>, DomainError> {
        let values = field::Entity::find()
            .select_only()
            .column(field::Column::Value)
            .filter(field::Column::RecordId.eq(record_id))
            .filter(field::Column::Tag.eq(tag))
            .order_by_asc(field::Column::Id)
            .into_tuple::<String>()
            .all(&self.conn)
            .await?;
        Ok(values)
    }

    async fn subfield_values(
        &self,
        record_id: i32,
        tag: &str,
        code: &str,
    ) -> Result<Vec<String>, DomainError> {
        let field_ids = self.field_ids_with_tag(record_id, tag).await?;
        if field_ids.is_empty() {
            return Ok(Vec::new());
        }

        let values = subfield::Entity::find()
            .select_only()
            .column(subfield::Column::Value)
            .filter(subfield::Column::FieldId.is_in(field_ids))
            .filter(subfield::Column::Code.eq(code))
            .order_by_asc(subfield::Column::Id)
            .into_tuple::<String>()
            .all(&self.conn)
            .await?;
        Ok(values)
    }

    async fn count_records(&self) -> Result<u64, DomainError> {
        Ok(record::Entity::find().count(&self.conn).await?)
    }
}

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn begin(&self) -> Result<Box<dyn CatalogUnit>, DomainError> {
        let txn = self.conn.begin().await?;
        Ok(Box::new(SeaOrmCatalogStore::new(txn)))
    }
}

#[async_trait]
impl CatalogUnit for SeaOrmCatalogUnit {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.conn.commit().await?;
        Ok(())
    }
}
