use serde::Deserialize;

/// Main configuration structure for friend-crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    /// Friend links inserted when the link table is empty
    #[serde(default, rename = "link")]
    pub links: Vec<LinkEntry>,
}

/// Crawl and ingest behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers per batch (values <= 0 fall back to 5)
    #[serde(default = "default_concurrency")]
    pub concurrency: i64,

    /// Timeout for one website probe (seconds)
    #[serde(rename = "probe-timeout-seconds", default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,

    /// Timeout for one feed fetch (seconds)
    #[serde(rename = "rss-timeout-seconds", default = "default_rss_timeout")]
    pub rss_timeout_seconds: u64,

    /// Run a crawl followed by an ingest as soon as the daemon starts
    #[serde(rename = "scan-on-startup", default)]
    pub scan_on_startup: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            probe_timeout_seconds: default_probe_timeout(),
            rss_timeout_seconds: default_rss_timeout(),
            scan_on_startup: false,
        }
    }
}

/// Job cadences
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Hours between full crawls of live links
    #[serde(rename = "crawl-interval-hours", default = "default_crawl_interval")]
    pub crawl_interval_hours: u64,

    /// Hours between recovery checks of dead links
    #[serde(rename = "recovery-interval-hours", default = "default_recovery_interval")]
    pub recovery_interval_hours: u64,

    /// Hours between feed ingestion runs
    #[serde(rename = "ingest-interval-hours", default = "default_ingest_interval")]
    pub ingest_interval_hours: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            crawl_interval_hours: default_crawl_interval(),
            recovery_interval_hours: default_recovery_interval(),
            ingest_interval_hours: default_ingest_interval(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: String::new(),
            contact_email: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    ///
    /// `Name/Version (+ContactURL; ContactEmail)`, with the parenthesized part
    /// omitted when no contact details are configured.
    pub fn header_value(&self) -> String {
        let contacts: Vec<String> = [
            (!self.contact_url.is_empty()).then(|| format!("+{}", self.contact_url)),
            (!self.contact_email.is_empty()).then(|| self.contact_email.clone()),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contacts.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contacts.join("; ")
            )
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A friend link listed in the configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LinkEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub email: String,
}

fn default_concurrency() -> i64 {
    5
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_rss_timeout() -> u64 {
    15
}

fn default_crawl_interval() -> u64 {
    6
}

fn default_recovery_interval() -> u64 {
    24
}

fn default_ingest_interval() -> u64 {
    1
}

fn default_crawler_name() -> String {
    "FriendCrawler".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_with_contacts() {
        let ua = UserAgentConfig {
            crawler_name: "FriendCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        };
        assert_eq!(
            ua.header_value(),
            "FriendCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_user_agent_without_contacts() {
        let ua = UserAgentConfig {
            crawler_version: "2.3".to_string(),
            ..UserAgentConfig::default()
        };
        assert_eq!(ua.header_value(), "FriendCrawler/2.3");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[output]
database-path = "friends.db"
"#,
        )
        .unwrap();

        assert_eq!(config.crawler.concurrency, 5);
        assert_eq!(config.crawler.probe_timeout_seconds, 10);
        assert_eq!(config.crawler.rss_timeout_seconds, 15);
        assert!(!config.crawler.scan_on_startup);
        assert_eq!(config.schedule.crawl_interval_hours, 6);
        assert_eq!(config.schedule.recovery_interval_hours, 24);
        assert_eq!(config.schedule.ingest_interval_hours, 1);
        assert!(config.links.is_empty());
    }
}
