use sqlx::PgPool;
use tracing::debug;

use crate::database::manager::DatabaseError;

/// Idempotent DDL for the four tables. Child rows cascade from their parent so deleting
/// a user removes its contacts, and deleting a contact removes its phone numbers and
/// addresses.
const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          BIGSERIAL PRIMARY KEY,
        username    TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL,
        role        TEXT NOT NULL DEFAULT 'ROLE_USER'
                    CHECK (role IN ('ROLE_USER', 'ROLE_ADMIN'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contacts (
        id          BIGSERIAL PRIMARY KEY,
        first_name  TEXT NOT NULL,
        last_name   TEXT NOT NULL,
        email       TEXT,
        taj_number  TEXT,
        tax_id      TEXT,
        mother_name TEXT,
        birth_date  DATE,
        user_id     BIGINT REFERENCES users (id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS contacts_user_id_idx ON contacts (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS phone_numbers (
        id           BIGSERIAL PRIMARY KEY,
        contact_id   BIGINT NOT NULL REFERENCES contacts (id) ON DELETE CASCADE,
        phone_number TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS phone_numbers_contact_id_idx ON phone_numbers (contact_id)",
    r#"
    CREATE TABLE IF NOT EXISTS addresses (
        id          BIGSERIAL PRIMARY KEY,
        contact_id  BIGINT NOT NULL REFERENCES contacts (id) ON DELETE CASCADE,
        street      TEXT NOT NULL,
        city        TEXT NOT NULL,
        zip_code    TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS addresses_contact_id_idx ON addresses (contact_id)",
];

pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("Schema up to date ({} statements)", STATEMENTS.len());
    Ok(())
}
