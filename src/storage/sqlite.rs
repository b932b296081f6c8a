//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::ProbeResult;
use crate::state::{advance, FeedStatus, LinkStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    ArticleRecord, FeedFilter, FeedRecord, InsertOutcome, LinkFilter, LinkRecord, NewArticle,
    NewLink,
};
use crate::CrawlerError;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const LINK_COLUMNS: &str = "id, website_name, website_url, website_icon_url, description, email,
     times, status, is_died, enable_rss, updated_at";

const FEED_COLUMNS: &str = "id, friend_link_id, rss_url, name, status, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CrawlerError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CrawlerError> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for tests and dry runs)
    pub fn new_in_memory() -> Result<Self, CrawlerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<LinkRecord> {
    Ok(LinkRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        icon: row.get(3)?,
        description: row.get(4)?,
        email: row.get(5)?,
        failure_count: row.get(6)?,
        status: LinkStatus::from_db_string(&row.get::<_, String>(7)?)
            .unwrap_or(LinkStatus::Pending),
        is_died: row.get(8)?,
        rss_enabled: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<FeedRecord> {
    Ok(FeedRecord {
        id: row.get(0)?,
        link_id: row.get(1)?,
        url: row.get(2)?,
        name: row.get(3)?,
        status: FeedStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(FeedStatus::Pause),
        updated_at: row.get(5)?,
    })
}

/// Builds the WHERE clause and bound values for a link filter
fn link_filter_clause(filter: &LinkFilter) -> (String, Vec<Value>) {
    let mut clause = String::from("WHERE 1=1");
    let mut values = Vec::new();

    if let Some(status) = filter.status {
        clause.push_str(" AND status = ?");
        values.push(Value::Text(status.to_db_string().to_string()));
    }

    if !filter.statuses.is_empty() {
        let placeholders = vec!["?"; filter.statuses.len()].join(", ");
        let op = if filter.not_in { "NOT IN" } else { "IN" };
        clause.push_str(&format!(" AND status {} ({})", op, placeholders));
        for status in &filter.statuses {
            values.push(Value::Text(status.to_db_string().to_string()));
        }
    }

    if let Some(is_died) = filter.is_died {
        clause.push_str(" AND is_died = ?");
        values.push(Value::Integer(is_died as i64));
    }

    (clause, values)
}

impl Storage for SqliteStorage {
    // ===== Link Management =====

    fn insert_link(&mut self, link: &NewLink) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO friend_link (website_name, website_url, website_icon_url, description,
             email, status, enable_rss, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                link.name,
                link.url,
                link.icon,
                link.description,
                link.email,
                LinkStatus::Pending.to_db_string(),
                link.rss_enabled,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn bootstrap_links(&mut self, links: &[NewLink]) -> StorageResult<usize> {
        let existing: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM friend_link", [], |row| row.get(0))?;

        if existing > 0 {
            tracing::info!("Found {} existing links, skipping bootstrap", existing);
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        let now = Utc::now().to_rfc3339();

        for link in links {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM friend_link WHERE website_url = ?1)",
                params![link.url],
                |row| row.get(0),
            )?;

            if exists {
                tracing::debug!("Bootstrap link {} already exists, skipping", link.url);
                continue;
            }

            tx.execute(
                "INSERT INTO friend_link (website_name, website_url, website_icon_url, description,
                 email, status, enable_rss, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
                params![
                    link.name,
                    link.url,
                    link.icon,
                    link.description,
                    link.email,
                    LinkStatus::Survival.to_db_string(),
                    now
                ],
            )?;
            inserted += 1;
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn get_link(&self, link_id: i64) -> StorageResult<LinkRecord> {
        let sql = format!("SELECT {} FROM friend_link WHERE id = ?1", LINK_COLUMNS);
        self.conn
            .query_row(&sql, params![link_id], link_from_row)
            .optional()?
            .ok_or(StorageError::LinkNotFound(link_id))
    }

    fn query_links(&self, filter: &LinkFilter) -> StorageResult<Vec<LinkRecord>> {
        let (clause, values) = link_filter_clause(filter);
        let sql = format!(
            "SELECT {} FROM friend_link {} ORDER BY updated_at DESC, id ASC",
            LINK_COLUMNS, clause
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map(params_from_iter(values), link_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn update_link(
        &mut self,
        link: &LinkRecord,
        probe: &ProbeResult,
    ) -> StorageResult<LinkRecord> {
        let next = advance(link, probe);
        let now = Utc::now().to_rfc3339();

        // Metadata columns are only filled when still empty in the database,
        // so manual edits made during the probe are kept.
        let updated = self.conn.execute(
            "UPDATE friend_link SET
                website_url = ?1,
                description = CASE WHEN description = '' THEN ?2 ELSE description END,
                website_icon_url = CASE WHEN website_icon_url = '' THEN ?3 ELSE website_icon_url END,
                status = ?4,
                times = ?5,
                is_died = ?6,
                updated_at = ?7
             WHERE id = ?8",
            params![
                next.url,
                next.description,
                next.icon,
                next.status.to_db_string(),
                next.failure_count,
                next.is_died,
                now,
                link.id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::LinkNotFound(link.id));
        }

        tracing::debug!(
            "Updated link {}: status={}, failure_count={}, is_died={}",
            link.id,
            next.status,
            next.failure_count,
            next.is_died
        );

        self.get_link(link.id)
    }

    fn set_link_status(&mut self, link_id: i64, status: LinkStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE friend_link SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, link_id],
        )?;
        if updated == 0 {
            return Err(StorageError::LinkNotFound(link_id));
        }
        Ok(())
    }

    // ===== Feed Management =====

    fn feed_exists(&self, link_id: Option<i64>, url: &str) -> StorageResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM friend_rss WHERE friend_link_id IS ?1 AND rss_url = ?2)",
            params![link_id, url],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn register_feed(
        &mut self,
        link_id: Option<i64>,
        url: &str,
        name: &str,
    ) -> StorageResult<Option<FeedRecord>> {
        if self.feed_exists(link_id, url)? {
            return Ok(None);
        }

        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO friend_rss (friend_link_id, name, rss_url, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![link_id, name, url, FeedStatus::Survival.to_db_string(), now],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_feed(id).map(Some)
    }

    fn get_feed(&self, feed_id: i64) -> StorageResult<FeedRecord> {
        let sql = format!("SELECT {} FROM friend_rss WHERE id = ?1", FEED_COLUMNS);
        self.conn
            .query_row(&sql, params![feed_id], feed_from_row)
            .optional()?
            .ok_or(StorageError::FeedNotFound(feed_id))
    }

    fn query_feeds(&self, filter: FeedFilter) -> StorageResult<Vec<FeedRecord>> {
        let (sql, values) = match filter {
            FeedFilter::All => (
                "SELECT r.id, r.friend_link_id, r.rss_url, r.name, r.status, r.updated_at
                 FROM friend_rss r ORDER BY r.id"
                    .to_string(),
                vec![],
            ),
            FeedFilter::Status(status) => (
                "SELECT r.id, r.friend_link_id, r.rss_url, r.name, r.status, r.updated_at
                 FROM friend_rss r WHERE r.status = ?1 ORDER BY r.id"
                    .to_string(),
                vec![Value::Text(status.to_db_string().to_string())],
            ),
            FeedFilter::Valid => (
                "SELECT r.id, r.friend_link_id, r.rss_url, r.name, r.status, r.updated_at
                 FROM friend_rss r
                 LEFT JOIN friend_link l ON r.friend_link_id = l.id
                 WHERE r.status != ?1
                   AND (r.friend_link_id IS NULL
                        OR (l.status != ?2 AND l.is_died = 0 AND l.enable_rss = 1))
                 ORDER BY r.id"
                    .to_string(),
                vec![
                    Value::Text(FeedStatus::Pause.to_db_string().to_string()),
                    Value::Text(LinkStatus::Ignored.to_db_string().to_string()),
                ],
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let feeds = stmt
            .query_map(params_from_iter(values), feed_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    // ===== Article Management =====

    fn insert_article(&mut self, article: &NewArticle) -> StorageResult<InsertOutcome> {
        let inserted = self.conn.execute(
            "INSERT INTO friend_rss_post (rss_id, title, link, description, author, time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                article.feed_id,
                article.title,
                article.link,
                article.description,
                article.author,
                article.published
            ],
        );

        match inserted {
            Ok(_) => Ok(InsertOutcome::Inserted(self.conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_articles(&self, feed_id: i64) -> StorageResult<Vec<ArticleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, rss_id, title, link, description, author, time
             FROM friend_rss_post WHERE rss_id = ?1 ORDER BY time DESC, id DESC",
        )?;

        let articles = stmt
            .query_map(params![feed_id], |row| {
                Ok(ArticleRecord {
                    id: row.get(0)?,
                    feed_id: row.get(1)?,
                    title: row.get(2)?,
                    link: row.get(3)?,
                    description: row.get(4)?,
                    author: row.get(5)?,
                    published: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    // ===== Statistics =====

    fn count_links_by_status(&self) -> StorageResult<HashMap<LinkStatus, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM friend_link GROUP BY status")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (status_str, count) = row?;
            match LinkStatus::from_db_string(&status_str) {
                Some(status) => {
                    counts.insert(status, count as u64);
                }
                None => tracing::warn!("Unknown link status in database: {}", status_str),
            }
        }

        Ok(counts)
    }

    fn count_died_links(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM friend_link WHERE is_died = 1 AND status != ?1",
            params![LinkStatus::Ignored.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_feeds_by_status(&self) -> StorageResult<HashMap<FeedStatus, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM friend_rss GROUP BY status")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (status_str, count) = row?;
            if let Some(status) = FeedStatus::from_db_string(&status_str) {
                counts.insert(status, count as u64);
            }
        }

        Ok(counts)
    }

    fn count_articles(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM friend_rss_post", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
