use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::auth::Role;
use crate::database::manager::DatabaseError;
use crate::database::models::{Address, Contact, ContactDraft, NewUser, PhoneNumber, User, UserChanges};
use crate::database::repository::{ContactRepository, UserRepository};

const CONTACT_COLUMNS: &str =
    "id, first_name, last_name, email, taj_number, tax_id, mother_name, birth_date, user_id";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| DatabaseError::CorruptRow(format!("users.id={}: {}", row.id, e)))?;
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password,
            role,
        })
    }
}

#[derive(Debug, FromRow)]
struct ContactRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: Option<String>,
    taj_number: Option<String>,
    tax_id: Option<String>,
    mother_name: Option<String>,
    birth_date: Option<NaiveDate>,
    user_id: Option<i64>,
}

#[derive(Debug, FromRow)]
struct PhoneRow {
    id: i64,
    contact_id: i64,
    phone_number: String,
}

#[derive(Debug, FromRow)]
struct AddressRow {
    id: i64,
    contact_id: i64,
    street: String,
    city: String,
    zip_code: String,
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, UserRow>("SELECT id, username, password, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, UserRow>("SELECT id, username, password, role FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        sqlx::query_as::<_, UserRow>("SELECT id, username, password, role FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, password, role) VALUES ($1, $2, $3) \
             RETURNING id, username, password, role",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, &format!("username '{}'", user.username)))?;

        User::try_from(row)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let what = changes
            .username
            .as_ref()
            .map(|u| format!("username '{}'", u))
            .unwrap_or_else(|| "username".to_string());

        sqlx::query_as::<_, UserRow>(
            "UPDATE users SET \
                username = COALESCE($2, username), \
                password = COALESCE($3, password), \
                role = COALESCE($4, role) \
             WHERE id = $1 \
             RETURNING id, username, password, role",
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.password_hash)
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, &what))?
        .map(User::try_from)
        .transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        // contacts.user_id cascades
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attaches phone numbers and addresses to a page of contact rows with one query per
    /// child table.
    async fn hydrate(&self, rows: Vec<ContactRow>) -> Result<Vec<Contact>, DatabaseError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let phones = sqlx::query_as::<_, PhoneRow>(
            "SELECT id, contact_id, phone_number FROM phone_numbers WHERE contact_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let addresses = sqlx::query_as::<_, AddressRow>(
            "SELECT id, contact_id, street, city, zip_code FROM addresses WHERE contact_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut phones_by_contact: HashMap<i64, Vec<PhoneNumber>> = HashMap::new();
        for p in phones {
            phones_by_contact.entry(p.contact_id).or_default().push(PhoneNumber {
                id: p.id,
                phone_number: p.phone_number,
            });
        }

        let mut addresses_by_contact: HashMap<i64, Vec<Address>> = HashMap::new();
        for a in addresses {
            addresses_by_contact.entry(a.contact_id).or_default().push(Address {
                id: a.id,
                street: a.street,
                city: a.city,
                zip_code: a.zip_code,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Contact {
                phone_numbers: phones_by_contact.remove(&row.id).unwrap_or_default(),
                addresses: addresses_by_contact.remove(&row.id).unwrap_or_default(),
                id: row.id,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                taj_number: row.taj_number,
                tax_id: row.tax_id,
                mother_name: row.mother_name,
                birth_date: row.birth_date,
                user_id: row.user_id,
            })
            .collect())
    }

    async fn insert_children(
        tx: &mut Transaction<'_, Postgres>,
        contact_id: i64,
        draft: &ContactDraft,
    ) -> Result<(), DatabaseError> {
        for number in &draft.phone_numbers {
            sqlx::query("INSERT INTO phone_numbers (contact_id, phone_number) VALUES ($1, $2)")
                .bind(contact_id)
                .bind(number)
                .execute(&mut **tx)
                .await?;
        }
        for address in &draft.addresses {
            sqlx::query("INSERT INTO addresses (contact_id, street, city, zip_code) VALUES ($1, $2, $3, $4)")
                .bind(contact_id)
                .bind(&address.street)
                .bind(&address.city)
                .bind(&address.zip_code)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Contact>, DatabaseError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!("SELECT {} FROM contacts WHERE id = $1", CONTACT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Contact>, DatabaseError> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!("SELECT {} FROM contacts ORDER BY id", CONTACT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Contact>, DatabaseError> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {} FROM contacts WHERE user_id = $1 ORDER BY id",
            CONTACT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn insert(&self, owner_id: Option<i64>, draft: ContactDraft) -> Result<Contact, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO contacts (first_name, last_name, email, taj_number, tax_id, mother_name, birth_date, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.email)
        .bind(&draft.taj_number)
        .bind(&draft.tax_id)
        .bind(&draft.mother_name)
        .bind(draft.birth_date)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_children(&mut tx, id, &draft).await?;
        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::CorruptRow(format!("contacts.id={} vanished after insert", id)))
    }

    async fn replace(&self, id: i64, draft: ContactDraft) -> Result<Option<Contact>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE contacts SET first_name = $2, last_name = $3, email = $4, taj_number = $5, \
             tax_id = $6, mother_name = $7, birth_date = $8 WHERE id = $1",
        )
        .bind(id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.email)
        .bind(&draft.taj_number)
        .bind(&draft.tax_id)
        .bind(&draft.mother_name)
        .bind(draft.birth_date)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("DELETE FROM phone_numbers WHERE contact_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM addresses WHERE contact_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        Self::insert_children(&mut tx, id, &draft).await?;
        tx.commit().await?;

        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
