//! SQLite-backed record store.

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::records::{RecordFilter, RecordStore};
use crate::error::{AssetError, Result};
use crate::models::{ImageAsset, LegacyGalleryEntry, StyleRecord, Tier};

const SELECT_COLUMNS: &str = "SELECT id, slug, legacy_gallery_json, images_json, tier FROM styles";

/// Style records stored in a single SQLite table.
pub struct SqliteRecordStore {
    db_path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Create or open a record store at the given path.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| AssetError::Io {
                    message: format!("Failed to create directory {}", parent.display()),
                    path: Some(parent.to_path_buf()),
                    source: Some(e),
                })?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;

        Ok(Self {
            db_path: Some(db_path),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::ensure_schema(&conn)?;
        Ok(Self {
            db_path: None,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout=30000;
            PRAGMA synchronous=NORMAL;
            ",
        )?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        // Slugs are expected to be unique but the constraint lives upstream;
        // duplicates are surfaced by the reorganization runner instead.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS styles (
                id TEXT PRIMARY KEY,
                slug TEXT NOT NULL,
                legacy_gallery_json TEXT NOT NULL DEFAULT '[]',
                images_json TEXT NOT NULL DEFAULT '[]',
                tier TEXT,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_styles_slug ON styles(slug)",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AssetError::Database {
            message: "Failed to acquire connection lock".to_string(),
            source: None,
        })
    }

    /// Get the database path, `None` for in-memory stores.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Insert or replace a full record.
    pub fn upsert(&self, record: &StyleRecord) -> Result<()> {
        let conn = self.lock()?;
        let legacy_json = serde_json::to_string(&record.legacy_gallery)?;
        let images_json = serde_json::to_string(&record.images)?;

        conn.execute(
            "INSERT INTO styles (id, slug, legacy_gallery_json, images_json, tier, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 slug=excluded.slug,
                 legacy_gallery_json=excluded.legacy_gallery_json,
                 images_json=excluded.images_json,
                 tier=excluded.tier,
                 updated_at=excluded.updated_at",
            params![
                record.id,
                record.slug,
                legacy_json,
                images_json,
                record.tier.map(|t| t.as_str()),
                now(),
            ],
        )?;

        debug!("Upserted style: {}", record.id);
        Ok(())
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> Result<Option<StyleRecord>> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let record = conn
            .query_row(&sql, params![id], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM styles", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StyleRecord> {
        let legacy_json: String = row.get(2)?;
        let images_json: String = row.get(3)?;
        let tier: Option<String> = row.get(4)?;

        let legacy_gallery: Vec<LegacyGalleryEntry> = serde_json::from_str(&legacy_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        let images: Vec<ImageAsset> = serde_json::from_str(&images_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
        let tier = tier
            .map(|t| t.parse::<Tier>())
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

        Ok(StyleRecord {
            id: row.get(0)?,
            slug: row.get(1)?,
            legacy_gallery,
            images,
            tier,
        })
    }

    fn update_column(&self, id: &str, sql: &str, value: Option<String>) -> Result<()> {
        let conn = self.lock()?;
        let rows = conn.execute(sql, params![value, now(), id])?;
        if rows == 0 {
            return Err(AssetError::NotFound {
                record_id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find_many(&self, filter: &RecordFilter) -> Result<Vec<StyleRecord>> {
        let conn = self.lock()?;

        let mut where_clause = String::from("WHERE 1=1");
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(ids) = &filter.ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders: Vec<_> = ids.iter().map(|_| "?").collect();
            where_clause.push_str(&format!(" AND id IN ({})", placeholders.join(",")));
            params_vec.extend(ids.iter().cloned());
        }

        match filter.has_images {
            Some(true) => where_clause.push_str(" AND json_array_length(images_json) > 0"),
            Some(false) => where_clause.push_str(" AND json_array_length(images_json) = 0"),
            None => {}
        }

        let mut sql = format!("{} {} ORDER BY id", SELECT_COLUMNS, where_clause);
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params_vec.iter()), Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    async fn update_images(&self, id: &str, images: &[ImageAsset]) -> Result<()> {
        let images_json = serde_json::to_string(images)?;
        self.update_column(
            id,
            "UPDATE styles SET images_json = ?1, updated_at = ?2 WHERE id = ?3",
            Some(images_json),
        )?;
        debug!("Updated {} images on style {}", images.len(), id);
        Ok(())
    }

    async fn update_tier(&self, id: &str, tier: Tier) -> Result<()> {
        self.update_column(
            id,
            "UPDATE styles SET tier = ?1, updated_at = ?2 WHERE id = ?3",
            Some(tier.as_str().to_string()),
        )
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageCategory;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteRecordStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteRecordStore::open(temp_dir.path().join("styles.db")).unwrap();
        (store, temp_dir)
    }

    fn migrated_record(id: &str) -> StyleRecord {
        StyleRecord::new(id, format!("{}-slug", id))
            .with_images(vec![ImageAsset::linked(
                format!("{}/a.png", id),
                format!("https://cdn/{}/a.png", id),
                id,
                0,
            )
            .with_category(ImageCategory::Overview)])
            .with_tier(Tier::Premium)
    }

    #[test]
    fn test_upsert_and_get() {
        let (store, _temp) = create_test_store();

        let record = StyleRecord::new("s1", "coastal-calm")
            .with_legacy_gallery(["https://old/1.png", "https://old/2.png"]);
        store.upsert(&record).unwrap();

        let loaded = store.get("s1").unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(store.get("missing").unwrap().is_none());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_many_filters() {
        let (store, _temp) = create_test_store();
        store.upsert(&StyleRecord::new("c", "gamma")).unwrap();
        store.upsert(&migrated_record("a")).unwrap();
        store.upsert(&StyleRecord::new("b", "beta")).unwrap();

        let all = store.find_many(&RecordFilter::all()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let migrated = store
            .find_many(&RecordFilter::all().with_has_images(true))
            .await
            .unwrap();
        assert_eq!(migrated.len(), 1);
        assert_eq!(migrated[0], migrated_record("a"));

        let scoped = store
            .find_many(&RecordFilter::all().with_ids(["c", "b"]).with_limit(1))
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, "b");

        let none = store
            .find_many(&RecordFilter::all().with_ids(Vec::<String>::new()))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_updates_replace_whole_field() {
        let store = SqliteRecordStore::in_memory().unwrap();
        store.upsert(&migrated_record("s1")).unwrap();

        store.update_images("s1", &[]).await.unwrap();
        store.update_tier("s1", Tier::Signature).await.unwrap();

        let loaded = store.get("s1").unwrap().unwrap();
        assert!(loaded.images.is_empty());
        assert_eq!(loaded.tier, Some(Tier::Signature));
    }

    #[tokio::test]
    async fn test_update_unknown_record_is_not_found() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let err = store.update_tier("ghost", Tier::Standard).await.unwrap_err();
        assert!(matches!(err, AssetError::NotFound { record_id } if record_id == "ghost"));
    }
}
