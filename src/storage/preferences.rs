use anyhow::Result;

use super::schema::Database;

impl Database {
    // ========================================================================
    // User Preferences Operations
    // ========================================================================

    /// Get a single preference value by key.
    ///
    /// Keys use dotted convention: `style.all`, `smart_cap`, `keybind.quit`.
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM user_preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a preference value (UPSERT).
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a preference so the config default applies again.
    /// Returns true if a row was deleted.
    pub async fn delete_preference(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get all preferences matching a key prefix, ordered by key.
    ///
    /// `_` and `%` in the prefix are escaped, so `style.` never matches
    /// `styleX...`.
    pub async fn get_preferences_by_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("{}%", escaped);
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT key, value FROM user_preferences WHERE key LIKE ? ESCAPE '\\' ORDER BY key",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_preference_missing() {
        let db = test_db().await;
        let value = db.get_preference("nonexistent.key").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_and_get_preference() {
        let db = test_db().await;
        db.set_preference("style.all", "videos").await.unwrap();

        let value = db.get_preference("style.all").await.unwrap();
        assert_eq!(value, Some("videos".to_string()));
    }

    #[tokio::test]
    async fn test_set_preference_upsert() {
        let db = test_db().await;
        db.set_preference("smart_cap", "true").await.unwrap();
        db.set_preference("smart_cap", "false").await.unwrap();

        let value = db.get_preference("smart_cap").await.unwrap();
        assert_eq!(value, Some("false".to_string()));
    }

    #[tokio::test]
    async fn test_delete_preference() {
        let db = test_db().await;
        db.set_preference("style.threads", "standard").await.unwrap();

        assert!(db.delete_preference("style.threads").await.unwrap());
        assert!(!db.delete_preference("style.threads").await.unwrap());
        assert_eq!(db.get_preference("style.threads").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_preferences_by_prefix() {
        let db = test_db().await;
        db.set_preference("style.all", "videos").await.unwrap();
        db.set_preference("style.readLater", "threads").await.unwrap();
        db.set_preference("keybind.quit", "q").await.unwrap();

        let styles = db.get_preferences_by_prefix("style.").await.unwrap();
        assert_eq!(
            styles,
            vec![
                ("style.all".to_string(), "videos".to_string()),
                ("style.readLater".to_string(), "threads".to_string()),
            ]
        );

        let all = db.get_preferences_by_prefix("").await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_get_preferences_by_prefix_no_false_matches() {
        let db = test_db().await;
        db.set_preference("smart_cap", "true").await.unwrap();
        db.set_preference("smartXcap", "test").await.unwrap();

        // "_" is literal, not a single-character wildcard
        let prefs = db.get_preferences_by_prefix("smart_").await.unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].0, "smart_cap");
    }

    #[tokio::test]
    async fn test_set_preference_records_timestamp() {
        let db = test_db().await;
        db.set_preference("test.key", "value1").await.unwrap();

        let row: (String,) =
            sqlx::query_as("SELECT updated_at FROM user_preferences WHERE key = ?")
                .bind("test.key")
                .fetch_one(&db.pool)
                .await
                .unwrap();
        assert!(!row.0.is_empty());
    }
}
