//! Link crawl and recovery tests

use crate::common::{link_entry, rss, setup};
use friend_crawler::crawler::run_concurrently;
use friend_crawler::state::LinkStatus;
use friend_crawler::storage::{lock, FeedFilter, LinkFilter, Storage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn only_link_id(env: &crate::common::TestEnv) -> i64 {
    let links = lock(&env.storage)
        .unwrap()
        .query_links(&LinkFilter::default())
        .unwrap();
    assert_eq!(links.len(), 1);
    links[0].id
}

#[tokio::test]
async fn test_crawl_extracts_metadata_and_registers_feed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let home = r#"<html><head>
        <meta name="description" content="Alice writes about gardens">
        <link rel="shortcut icon" href="/f.ico">
        <link rel="alternate" type="application/rss+xml" title="RSS" href="/feed.xml">
    </head><body>Hello</body></html>"#;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(home)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss("Alice's Garden", &[])))
        .mount(&mock_server)
        .await;

    let env = setup(vec![link_entry("Alice", &format!("{}/", base_url))]);
    let link_id = only_link_id(&env);

    let summary = env.coordinator.run_link_crawl().await.unwrap();
    assert_eq!(summary.probed, 1);
    assert_eq!(summary.survived, 1);
    assert_eq!(summary.feeds_registered, 1);

    let storage = lock(&env.storage).unwrap();
    let link = storage.get_link(link_id).unwrap();
    assert_eq!(link.status, LinkStatus::Survival);
    assert_eq!(link.description, "Alice writes about gardens");
    assert_eq!(link.icon, format!("{}/f.ico", base_url));
    assert_eq!(link.failure_count, 0);

    let feeds = storage.query_feeds(FeedFilter::All).unwrap();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].url, format!("{}/feed.xml", base_url));
    assert_eq!(feeds[0].name, "Alice's Garden");
    assert_eq!(feeds[0].link_id, Some(link_id));
}

#[tokio::test]
async fn test_second_crawl_does_not_duplicate_feed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<link rel="alternate" type="application/atom+xml" href="/atom.xml">"#,
        ))
        .mount(&mock_server)
        .await;

    // The feed title is fetched once, on first registration only
    Mock::given(method("GET"))
        .and(path("/atom.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Atom</title><id>urn:a</id><updated>2024-01-01T00:00:00Z</updated></feed>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let env = setup(vec![link_entry("Bob", &format!("{}/", base_url))]);

    let first = env.coordinator.run_link_crawl().await.unwrap();
    let second = env.coordinator.run_link_crawl().await.unwrap();

    assert_eq!(first.feeds_registered, 1);
    assert_eq!(second.feeds_registered, 0);
    assert_eq!(
        lock(&env.storage).unwrap().query_feeds(FeedFilter::All).unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_redirect_updates_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "https://moved.example.com/"),
        )
        .mount(&mock_server)
        .await;

    let env = setup(vec![link_entry("Carol", &format!("{}/", mock_server.uri()))]);
    let link_id = only_link_id(&env);

    env.coordinator.run_link_crawl().await.unwrap();

    let link = lock(&env.storage).unwrap().get_link(link_id).unwrap();
    assert_eq!(link.status, LinkStatus::Survival);
    assert_eq!(link.url, "https://moved.example.com/");
    assert_eq!(link.failure_count, 0);
}

#[tokio::test]
async fn test_repeated_errors_kill_link_and_recovery_revives_it() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let env = setup(vec![link_entry("Dave", &mock_server.uri())]);
    let link_id = only_link_id(&env);

    for _ in 0..3 {
        env.coordinator.run_link_crawl().await.unwrap();
    }
    {
        let link = lock(&env.storage).unwrap().get_link(link_id).unwrap();
        assert_eq!(link.failure_count, 3);
        assert!(!link.is_died);
    }

    let summary = env.coordinator.run_link_crawl().await.unwrap();
    assert_eq!(summary.newly_died, 1);
    {
        let link = lock(&env.storage).unwrap().get_link(link_id).unwrap();
        assert_eq!(link.failure_count, 4);
        assert!(link.is_died);
        assert_eq!(link.status, LinkStatus::Error);
    }

    // Dead links leave the regular crawl
    let summary = env.coordinator.run_link_crawl().await.unwrap();
    assert_eq!(summary.probed, 0);

    mock_server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let summary = env.coordinator.run_recovery_check().await.unwrap();
    assert_eq!(summary.probed, 1);
    assert_eq!(summary.revived, 1);

    let link = lock(&env.storage).unwrap().get_link(link_id).unwrap();
    assert!(!link.is_died);
    assert_eq!(link.failure_count, 0);
    assert_eq!(link.status, LinkStatus::Survival);
}

#[tokio::test]
async fn test_ignored_links_are_never_probed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let env = setup(vec![link_entry("Eve", &mock_server.uri())]);
    let link_id = only_link_id(&env);
    lock(&env.storage)
        .unwrap()
        .set_link_status(link_id, LinkStatus::Ignored)
        .unwrap();

    assert_eq!(env.coordinator.run_link_crawl().await.unwrap().probed, 0);
    assert_eq!(env.coordinator.run_recovery_check().await.unwrap().probed, 0);
}

#[tokio::test]
async fn test_unreachable_site_is_timeout() {
    let env = setup(vec![link_entry("Frank", "http://127.0.0.1:9/")]);
    let link_id = only_link_id(&env);

    let summary = env.coordinator.run_link_crawl().await.unwrap();
    assert_eq!(summary.failed, 1);

    let link = lock(&env.storage).unwrap().get_link(link_id).unwrap();
    assert_eq!(link.status, LinkStatus::Timeout);
    assert_eq!(link.failure_count, 1);
}

#[tokio::test]
async fn test_many_links_all_updated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let links = (0..12)
        .map(|i| link_entry(&format!("Friend {}", i), &format!("{}/site/{}", mock_server.uri(), i)))
        .collect();
    let env = setup(links);

    let summary = env.coordinator.run_link_crawl().await.unwrap();
    assert_eq!(summary.probed, 12);
    assert_eq!(summary.survived, 12);
    assert_eq!(summary.update_errors, 0);
}

#[tokio::test]
async fn test_dispatcher_completeness() {
    for (jobs, concurrency) in [(1usize, 1i64), (7, 2), (20, 5), (20, 20), (3, 0)] {
        let results = run_concurrently(
            (0..jobs).collect::<Vec<_>>(),
            |job| async move {
                tokio::task::yield_now().await;
                job
            },
            concurrency,
        )
        .await;

        assert_eq!(results.len(), jobs);
        let mut sorted = results.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..jobs).collect::<Vec<_>>());
    }
}
