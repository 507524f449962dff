use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::{AppError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChargerMapping {
    pub name: String,
    pub serial: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MappingCreate {
    pub name: String,
    pub serial: String,
}

/// Body of an update; a `name` field, if sent, is ignored in favour of the path.
#[derive(Debug, Deserialize, Clone)]
pub struct MappingUpdate {
    pub serial: String,
}

#[derive(Debug, Clone)]
pub struct MappingsRepository {
    pool: DbPool,
}

impl MappingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get all mappings in insertion order
    pub async fn get_all(&self) -> Result<Vec<ChargerMapping>> {
        let mappings = sqlx::query_as::<_, ChargerMapping>(
            r#"
            SELECT name, serial, created_at, updated_at
            FROM charger_mappings
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(mappings)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<ChargerMapping> {
        let mapping = sqlx::query_as::<_, ChargerMapping>(
            r#"
            SELECT name, serial, created_at, updated_at
            FROM charger_mappings
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Mapping {} not found", name)))?;

        Ok(mapping)
    }

    /// Insert a new mapping; a duplicate name or serial is a conflict.
    pub async fn create(&self, create: &MappingCreate) -> Result<ChargerMapping> {
        validate_field("name", &create.name)?;
        validate_field("serial", &create.serial)?;

        let now = Utc::now();
        let mapping = sqlx::query_as::<_, ChargerMapping>(
            r#"
            INSERT INTO charger_mappings (name, serial, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            RETURNING name, serial, created_at, updated_at
            "#,
        )
        .bind(&create.name)
        .bind(&create.serial)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(into_conflict)?;

        Ok(mapping)
    }

    /// Replace the serial of the mapping called `name`
    pub async fn update_serial(&self, name: &str, update: &MappingUpdate) -> Result<ChargerMapping> {
        validate_field("serial", &update.serial)?;

        let mapping = sqlx::query_as::<_, ChargerMapping>(
            r#"
            UPDATE charger_mappings
            SET serial = ?2, updated_at = ?3
            WHERE name = ?1
            RETURNING name, serial, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(&update.serial)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(into_conflict)?
        .ok_or_else(|| AppError::NotFound(format!("Mapping {} not found", name)))?;

        Ok(mapping)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM charger_mappings WHERE name = ?1")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Mapping {} not found", name)));
        }

        Ok(())
    }
}

fn validate_field(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

// Uniqueness is enforced by the table constraints; surface violations as conflicts.
fn into_conflict(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(db_err.message().to_string())
        }
        other => AppError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_field_rejects_blank() {
        assert!(matches!(
            validate_field("name", ""),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_field("serial", "   "),
            Err(AppError::InvalidInput(_))
        ));
        assert!(validate_field("serial", "SN-001").is_ok());
    }

    #[test]
    fn test_into_conflict_passes_other_errors_through() {
        let err = into_conflict(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
