//! Shared helpers for the integration tests

use friend_crawler::config::{
    Config, CrawlerConfig, LinkEntry, OutputConfig, ScheduleConfig, UserAgentConfig,
};
use friend_crawler::crawler::{prepare_storage, Coordinator};
use friend_crawler::storage::SharedStorage;
use tempfile::TempDir;

/// Creates a test configuration with the given bootstrap links
pub fn create_test_config(links: Vec<LinkEntry>, db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            concurrency: 3,
            probe_timeout_seconds: 2,
            rss_timeout_seconds: 2,
            scan_on_startup: false,
        },
        schedule: ScheduleConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        links,
    }
}

/// A bootstrap link entry
pub fn link_entry(name: &str, url: &str) -> LinkEntry {
    LinkEntry {
        name: name.to_string(),
        url: url.to_string(),
        icon: String::new(),
        description: String::new(),
        email: String::new(),
    }
}

/// Test environment: temporary database, storage and coordinator
pub struct TestEnv {
    // Held so the database directory outlives the test
    _dir: TempDir,
    pub storage: SharedStorage,
    pub coordinator: Coordinator,
}

/// Opens a fresh database seeded with the given links
pub fn setup(links: Vec<LinkEntry>) -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("friends.db");
    let config = create_test_config(links, db_path.to_str().expect("utf-8 temp path"));

    let storage = prepare_storage(&config).expect("Failed to open storage");
    let coordinator = Coordinator::new(&config, storage.clone()).expect("Failed to build coordinator");

    TestEnv {
        _dir: dir,
        storage,
        coordinator,
    }
}

/// An RSS document with one channel and the given items
pub fn rss(title: &str, items: &[(&str, &str, Option<&str>)]) -> String {
    let mut body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>{}</title>
<link>https://example.com</link>
<description>test feed</description>
"#,
        title
    );

    for (item_title, link, pub_date) in items {
        body.push_str("<item>");
        body.push_str(&format!("<title>{}</title><link>{}</link>", item_title, link));
        body.push_str("<description>&lt;p&gt;Some &lt;b&gt;text&lt;/b&gt;&lt;/p&gt;</description>");
        if let Some(date) = pub_date {
            body.push_str(&format!("<pubDate>{}</pubDate>", date));
        }
        body.push_str("</item>\n");
    }

    body.push_str("</channel></rss>");
    body
}
