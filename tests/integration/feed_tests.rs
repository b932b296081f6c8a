//! Feed registration and ingestion tests

use crate::common::{link_entry, rss, setup};
use friend_crawler::config::UserAgentConfig;
use friend_crawler::crawler::build_feed_client;
use friend_crawler::feed::{FeedIngestor, FeedRegistrar, Registration};
use friend_crawler::storage::{lock, FeedFilter, LinkFilter, Storage};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATE_1: &str = "Mon, 01 Jan 2024 10:00:00 GMT";
const DATE_2: &str = "Tue, 02 Jan 2024 10:00:00 GMT";

fn feed_client() -> reqwest::Client {
    build_feed_client(&UserAgentConfig::default(), Duration::from_secs(2)).unwrap()
}

async fn mount_feed(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/rss+xml"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_register_same_feed_twice() {
    let mock_server = MockServer::start().await;
    mount_feed(&mock_server, "/rss", rss("Grace", &[])).await;

    let env = setup(vec![link_entry("Grace", "https://grace.example")]);
    let link_id = lock(&env.storage)
        .unwrap()
        .query_links(&LinkFilter::default())
        .unwrap()[0]
        .id;

    let registrar = FeedRegistrar::new(env.storage.clone(), feed_client());
    let url = format!("{}/rss", mock_server.uri());

    let first = registrar.register(Some(link_id), &url).await.unwrap();
    let second = registrar.register(Some(link_id), &url).await.unwrap();

    assert!(matches!(first, Registration::Created(_)));
    assert_eq!(second, Registration::AlreadyExists);
    assert_eq!(
        lock(&env.storage).unwrap().query_feeds(FeedFilter::All).unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_ingest_is_idempotent() {
    let mock_server = MockServer::start().await;
    let items = [
        ("One", "https://heidi.example/1", Some(DATE_1)),
        ("Two", "https://heidi.example/2", Some(DATE_2)),
    ];
    mount_feed(&mock_server, "/rss", rss("Heidi", &items)).await;

    let env = setup(vec![]);
    let feed = lock(&env.storage)
        .unwrap()
        .register_feed(None, &format!("{}/rss", mock_server.uri()), "Heidi")
        .unwrap()
        .unwrap();

    let first = env.coordinator.run_feed_ingest().await.unwrap();
    assert_eq!(first.feeds, 1);
    assert_eq!(first.articles.inserted, 2);

    let second = env.coordinator.run_feed_ingest().await.unwrap();
    assert_eq!(second.articles.inserted, 0);
    assert_eq!(second.articles.duplicates, 2);

    let storage = lock(&env.storage).unwrap();
    assert_eq!(storage.count_articles().unwrap(), 2);

    let articles = storage.get_articles(feed.id).unwrap();
    assert_eq!(articles[0].link, "https://heidi.example/2");
    assert_eq!(articles[0].description, "Some text");
    assert_eq!(articles[0].author, "Heidi");
    assert_eq!(articles[1].published, 1_704_103_200);
}

#[tokio::test]
async fn test_entry_without_timestamp_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_feed(
        &mock_server,
        "/rss",
        rss("Ivan", &[("Undated", "https://ivan.example/undated", None)]),
    )
    .await;

    let env = setup(vec![]);
    let feed = lock(&env.storage)
        .unwrap()
        .register_feed(None, &format!("{}/rss", mock_server.uri()), "Ivan")
        .unwrap()
        .unwrap();

    let ingestor = FeedIngestor::new(env.storage.clone(), feed_client());
    let report = ingestor.ingest(&feed).await.unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(lock(&env.storage).unwrap().count_articles().unwrap(), 0);
}

#[tokio::test]
async fn test_broken_feed_does_not_stop_others() {
    let mock_server = MockServer::start().await;
    mount_feed(
        &mock_server,
        "/good",
        rss("Judy", &[("Post", "https://judy.example/post", Some(DATE_1))]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("this is not a feed"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let env = setup(vec![]);
    {
        let mut storage = lock(&env.storage).unwrap();
        for (route, name) in [("/broken", "Broken"), ("/good", "Judy"), ("/gone", "Gone")] {
            storage
                .register_feed(None, &format!("{}{}", mock_server.uri(), route), name)
                .unwrap();
        }
    }

    let summary = env.coordinator.run_feed_ingest().await.unwrap();
    assert_eq!(summary.feeds, 3);
    assert_eq!(summary.feed_errors, 2);
    assert_eq!(summary.articles.inserted, 1);
}

#[tokio::test]
async fn test_feeds_of_dead_links_are_not_ingested() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss("Mallory", &[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let env = setup(vec![link_entry("Mallory", "https://mallory.example")]);
    {
        let mut storage = lock(&env.storage).unwrap();
        let link = storage.query_links(&LinkFilter::default()).unwrap().remove(0);
        storage
            .register_feed(Some(link.id), &format!("{}/rss", mock_server.uri()), "Mallory")
            .unwrap();

        let failure = friend_crawler::ProbeResult::with_status(friend_crawler::LinkStatus::Error);
        let mut current = link;
        for _ in 0..4 {
            current = storage.update_link(&current, &failure).unwrap();
        }
        assert!(current.is_died);
    }

    let summary = env.coordinator.run_feed_ingest().await.unwrap();
    assert_eq!(summary.feeds, 0);
}
