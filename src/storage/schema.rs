//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Friend-Crawler database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Monitored friend websites
CREATE TABLE IF NOT EXISTS friend_link (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    website_name TEXT NOT NULL DEFAULT '',
    website_url TEXT NOT NULL,
    website_icon_url TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    times INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    is_died INTEGER NOT NULL DEFAULT 0,
    enable_rss INTEGER NOT NULL DEFAULT 1,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_friend_link_status ON friend_link(status);
CREATE INDEX IF NOT EXISTS idx_friend_link_url ON friend_link(website_url);

-- Registered RSS/Atom sources
CREATE TABLE IF NOT EXISTS friend_rss (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    friend_link_id INTEGER REFERENCES friend_link(id) ON DELETE CASCADE,
    name TEXT NOT NULL DEFAULT '',
    rss_url TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'survival',
    updated_at INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_friend_rss_link ON friend_rss(friend_link_id);
CREATE INDEX IF NOT EXISTS idx_friend_rss_url ON friend_rss(rss_url);

-- Ingested feed entries
CREATE TABLE IF NOT EXISTS friend_rss_post (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rss_id INTEGER NOT NULL REFERENCES friend_rss(id) ON DELETE CASCADE,
    title TEXT NOT NULL DEFAULT '',
    link TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    author TEXT NOT NULL DEFAULT '',
    time INTEGER NOT NULL DEFAULT 0
);

DROP INDEX IF EXISTS idx_friend_rss_post_link;
CREATE UNIQUE INDEX IF NOT EXISTS uq_friend_rss_post_link ON friend_rss_post(link);
CREATE INDEX IF NOT EXISTS idx_friend_rss_post_rss ON friend_rss_post(rss_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        let result = initialize_schema(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_article_link_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO friend_rss (name, rss_url) VALUES ('Feed', 'https://a.example/feed')",
            [],
        )
        .unwrap();
        let insert = "INSERT INTO friend_rss_post (rss_id, link) VALUES (1, 'https://a.example/1')";

        conn.execute(insert, []).unwrap();
        let err = conn.execute(insert, []).unwrap_err();
        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["friend_link", "friend_rss", "friend_rss_post"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
