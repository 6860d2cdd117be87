use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS source_files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            institution_code TEXT NOT NULL,
            filename TEXT NOT NULL,
            modification_timestamp INTEGER NOT NULL,
            file_type TEXT NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_source_files_identity
        ON source_files (institution_code, filename, modification_timestamp)
        "#,
        // Children reference parents without ON DELETE CASCADE: the pipeline
        // deletes subfields, then fields, then the record itself.
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id INTEGER NOT NULL,
            institution_code TEXT NOT NULL,
            record_type TEXT NOT NULL,
            control_identifier TEXT NOT NULL,
            modification_timestamp REAL NOT NULL DEFAULT 0,
            processed BOOLEAN NOT NULL DEFAULT 0,
            exported BOOLEAN NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (file_id) REFERENCES source_files(id)
        )
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_records_key
        ON records (institution_code, record_type, control_identifier)
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_records_processed ON records (processed)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS fields (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_id INTEGER NOT NULL,
            tag TEXT NOT NULL,
            value TEXT NOT NULL,
            kind TEXT NOT NULL,
            FOREIGN KEY (record_id) REFERENCES records(id)
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_fields_record_tag ON fields (record_id, tag)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS subfields (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            field_id INTEGER NOT NULL,
            code TEXT NOT NULL,
            value TEXT NOT NULL,
            FOREIGN KEY (field_id) REFERENCES fields(id)
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_subfields_field ON subfields (field_id)
        "#,
    ];

    for sql in statements {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_owned(),
        ))
        .await?;
    }

    Ok(())
}
