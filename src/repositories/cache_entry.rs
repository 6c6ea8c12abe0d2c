//! Cache entry repository for database operations.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::cache_entry;

/// Repository for key-value cache rows.
pub struct CacheEntryRepository;

impl CacheEntryRepository {
    /// Get a single entry by key.
    pub async fn get<C>(conn: &C, key: &str) -> Result<Option<cache_entry::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(cache_entry::Entity::find_by_id(key.to_string()).one(conn).await?)
    }

    /// Insert or replace the value stored under `key`.
    pub async fn upsert<C>(conn: &C, key: &str, value: String, updated_at: String) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let entry = cache_entry::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value),
            updated_at: ActiveValue::Set(updated_at),
        };

        cache_entry::Entity::insert(entry)
            .on_conflict(
                OnConflict::column(cache_entry::Column::Key)
                    .update_columns([cache_entry::Column::Value, cache_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// Delete every entry whose key is in `keys`.
    pub async fn delete_many<C>(conn: &C, keys: &[String]) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        if keys.is_empty() {
            return Ok(0);
        }

        let result = cache_entry::Entity::delete_many()
            .filter(cache_entry::Column::Key.is_in(keys.iter().cloned()))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
