//! End-to-end harvests against mock upstreams.

use review_scrap::{
    AppStoreJson, AppStoreXml, HarvestConfig, Harvester, HttpFetcher, PageOutcome, PlayStore,
};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const XML_PAGE: &str = include_str!("fixtures/appstore_page.xml");
const XML_LAST_PAGE: &str = include_str!("fixtures/appstore_last_page.xml");
const JSON_PAGE: &str = include_str!("fixtures/appstore_page.json");
const JSON_LAST_PAGE: &str = include_str!("fixtures/appstore_last_page.json");
const PLAY_PAGE: &str = include_str!("fixtures/playstore_page.html");
const PLAY_EMPTY: &str = include_str!("fixtures/playstore_empty.html");

fn xml_feed_path(page: usize) -> String {
    format!("/rss/customerreviews/id=284882215/page={page}/sortby=mostrecent/xml")
}

fn json_feed_path(page: usize) -> String {
    format!("/rss/customerreviews/id=284882215/page={page}/sortby=mostrecent/json")
}

async fn mount_get(server: &MockServer, at: String, body: &str, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_owned(), content_type))
        .mount(server)
        .await;
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new().expect("failed to build http client")
}

#[tokio::test]
async fn test_xml_feed_harvest_skips_failed_and_empty_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(xml_feed_path(1)))
        .and(query_param("country", "us"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(XML_PAGE, "application/xml"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(xml_feed_path(2)))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_get(&server, xml_feed_path(3), XML_LAST_PAGE, "application/xml").await;

    let dir = TempDir::new().expect("failed to create temp dir");
    let config = HarvestConfig::new(dir.path().join("reviews_ios.csv"), 3);
    let harvester = Harvester::new(AppStoreXml::new("us").with_base_url(server.uri()), fetcher());

    let report = harvester
        .harvest("284882215", &config)
        .await
        .expect("harvest should not fail on page errors");

    assert_eq!(report.written, 2);
    assert_eq!(report.rows[0].title, "Can't log in");
    assert_eq!(
        report.rows[0].review,
        "Since the update the app says my \"session expired\", every time."
    );
    assert_eq!(report.rows[0].vote_sum, Some(4));
    assert_eq!(report.rows[1].author, "mika");
    assert_eq!(
        report.outcomes[0],
        PageOutcome::Appended { page: 1, rows: 2 }
    );
    assert!(matches!(report.outcomes[1], PageOutcome::Skipped { page: 2, .. }));
    assert_eq!(report.outcomes[2], PageOutcome::Empty { page: 3 });

    let text = std::fs::read_to_string(&config.output).expect("output file should exist");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("title,review_date,author,author_url,version,rating,review,vote_count,vote_sum")
    );
    let first = lines.next().expect("first review row");
    assert!(first.starts_with("Can't log in,2017-03-09T21:31:00"), "{first}");
    assert!(
        first.ends_with(
            ",kjl2017,https://itunes.apple.com/us/reviews/id111111111,84.0,1,\
             \"Since the update the app says my \"\"session expired\"\", every time.\",5,4"
        ),
        "{first}"
    );
    assert_eq!(lines.count(), 1);

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_json_feed_harvest_treats_missing_entry_as_empty() {
    let server = MockServer::start().await;
    mount_get(&server, json_feed_path(1), JSON_PAGE, "application/json").await;
    mount_get(&server, json_feed_path(2), JSON_LAST_PAGE, "application/json").await;
    mount_get(&server, json_feed_path(3), JSON_LAST_PAGE, "application/json").await;

    let dir = TempDir::new().expect("failed to create temp dir");
    let config = HarvestConfig::new(dir.path().join("reviews_ios.csv"), 3);
    let harvester = Harvester::new(AppStoreJson::new().with_base_url(server.uri()), fetcher());

    let report = harvester.harvest("284882215", &config).await.unwrap();

    assert_eq!(report.written, 2);
    let ids: Vec<_> = report
        .rows
        .iter()
        .map(|r| r.review_id.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(ids, ["1597301122", "1597299999"]);
    assert_eq!(report.rows[0].title, "Best \"social\" app");
    assert_eq!(report.rows[1].rating.stars(), 3);
    assert_eq!(report.outcomes[1], PageOutcome::Empty { page: 2 });
    assert_eq!(report.outcomes[2], PageOutcome::Empty { page: 3 });

    let text = std::fs::read_to_string(&config.output).unwrap();
    assert!(text.starts_with(
        "review_id,title,review_date,author,author_url,version,rating,review,vote_count\n"
    ));
    assert!(text.contains("\"I use it \"\"every\"\" day\""), "{text}");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_play_store_harvest_posts_zero_based_pages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store/getreviews"))
        .and(body_string_contains("pageNum=0"))
        .and(body_string_contains("id=com.example.app"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLAY_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/store/getreviews"))
        .and(body_string_contains("pageNum=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLAY_EMPTY))
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("failed to create temp dir");
    let config = HarvestConfig::new(dir.path().join("reviews_android.csv"), 2);
    let surface = PlayStore::new().unwrap().with_base_url(server.uri());
    let harvester = Harvester::new(surface, fetcher());

    let report = harvester.harvest("com.example.app", &config).await.unwrap();

    assert_eq!(report.written, 2);
    assert_eq!(report.outcomes[1], PageOutcome::Empty { page: 1 });
    let text = std::fs::read_to_string(&config.output).unwrap();
    assert_eq!(
        text,
        "author,review_date,rating,content\n\
         Jane O'Doe,2017-03-03,4,\"I love \"\"this\"\" app  & more\"\n\
         Sam,2017-02-28,2,Crashes on start\n"
    );
}

#[tokio::test]
async fn test_second_run_appends_without_repeating_header() {
    let server = MockServer::start().await;
    mount_get(&server, json_feed_path(1), JSON_PAGE, "application/json").await;

    let dir = TempDir::new().expect("failed to create temp dir");
    let config = HarvestConfig::new(dir.path().join("reviews.csv"), 1);
    let harvester = Harvester::new(AppStoreJson::new().with_base_url(server.uri()), fetcher());

    harvester.harvest("284882215", &config).await.unwrap();
    harvester.harvest("284882215", &config).await.unwrap();

    let text = std::fs::read_to_string(&config.output).unwrap();
    assert_eq!(text.matches("review_id,title").count(), 1);
    assert_eq!(text.matches("1597301122").count(), 2);
}

#[tokio::test]
async fn test_prefetch_keeps_page_order_in_output() {
    let server = MockServer::start().await;
    for page in 1..=4 {
        let body = if page % 2 == 1 { XML_PAGE } else { XML_LAST_PAGE };
        mount_get(&server, xml_feed_path(page), body, "application/xml").await;
    }

    let dir = TempDir::new().expect("failed to create temp dir");
    let config = HarvestConfig::new(dir.path().join("reviews.csv"), 4).with_prefetch(3);
    let harvester = Harvester::new(AppStoreXml::new("us").with_base_url(server.uri()), fetcher());

    let report = harvester.harvest("284882215", &config).await.unwrap();

    let pages: Vec<_> = report.outcomes.iter().map(PageOutcome::page).collect();
    assert_eq!(pages, [1, 2, 3, 4]);
    assert_eq!(report.written, 4);
    let authors: Vec<_> = report.rows.iter().map(|r| r.author.as_str()).collect();
    assert_eq!(authors, ["kjl2017", "mika", "kjl2017", "mika"]);
}

#[tokio::test]
async fn test_unreachable_upstream_still_produces_header_file() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let config = HarvestConfig::new(dir.path().join("reviews.csv"), 2);
    let harvester = Harvester::new(AppStoreJson::new().with_base_url(server.uri()), fetcher());

    let report = harvester.harvest("284882215", &config).await.unwrap();

    assert!(report.rows.is_empty());
    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o, PageOutcome::Skipped { .. })));
    assert_eq!(
        std::fs::read_to_string(&config.output).unwrap(),
        "review_id,title,review_date,author,author_url,version,rating,review,vote_count\n"
    );
}

#[tokio::test]
async fn test_missing_target_makes_no_requests_and_no_file() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let config = HarvestConfig::new(dir.path().join("reviews.csv"), 2);
    let harvester = Harvester::new(AppStoreXml::new("us").with_base_url(server.uri()), fetcher());

    assert!(harvester.harvest("", &config).await.is_err());
    assert!(!config.output.exists());
    assert!(server.received_requests().await.unwrap().is_empty());
}
