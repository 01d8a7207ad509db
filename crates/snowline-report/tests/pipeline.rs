//! End-to-end pipeline tests against a wiremock HTTP server.

use snowline_core::servers::ServerFormat;
use snowline_core::Resort;
use snowline_report::{
    AssumeOnline, CacheMode, CatalogError, Connectivity, HttpClient, LocationFinder, ReportCache,
    ReportFetcher, Server, SkiServer,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Offline;

impl Connectivity for Offline {
    fn is_online(&self) -> bool {
        false
    }
}

fn test_client() -> HttpClient {
    HttpClient::new(5, "snowline-tests/0.1", 0, 0).expect("client construction should not fail")
}

fn ski_server(uri: &str, format: ServerFormat) -> SkiServer {
    SkiServer::new(uri, format).expect("mock server URI should be a valid base")
}

fn peak_one() -> Resort {
    Resort {
        name: "Peak One".to_string(),
        region: "Summit County".to_string(),
        path: "report?loc=peak-one".to_string(),
    }
}

#[tokio::test]
async fn regions_and_locations_enumerate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location_list"))
        .and(query_param("region", "Summit County"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "location = Peak One|report?loc=peak-one\nlocation = Peak Two|report?loc=peak-two\n",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/location_list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("region = Summit County\nregion = Front Range\n"),
        )
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let finder = LocationFinder::new(&client, &ski);

    let regions = finder.regions().await.expect("catalog should parse");
    assert_eq!(regions, vec!["Summit County", "Front Range"]);

    let locations = finder
        .locations("Summit County")
        .await
        .expect("region should list locations");
    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0].resort.name, "Peak One");
    assert_eq!(locations[0].resort.path, "report?loc=peak-one");
    assert_eq!(locations[0].region, "Summit County");
}

#[tokio::test]
async fn duplicate_regions_collapse_preserving_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location_list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "region = Summit County\nregion = Front Range\nregion = Summit County\n",
        ))
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let finder = LocationFinder::new(&client, &ski);

    let regions = finder.regions().await.unwrap();
    assert_eq!(regions, vec!["Summit County", "Front Range"]);
}

#[tokio::test]
async fn empty_catalog_is_a_hard_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location_list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# nothing today\n"))
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let finder = LocationFinder::new(&client, &ski);

    let err = finder.regions().await.unwrap_err();
    assert!(matches!(err, CatalogError::EmptyCatalog { .. }));
}

#[tokio::test]
async fn empty_region_is_a_reportable_inconsistency() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location_list"))
        .and(query_param("region", "Ghost Range"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let finder = LocationFinder::new(&client, &ski);

    let err = finder.locations("Ghost Range").await.unwrap_err();
    assert!(
        matches!(err, CatalogError::EmptyRegion { ref region, .. } if region == "Ghost Range")
    );
}

#[tokio::test]
async fn catalog_fetch_failure_carries_the_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location_list"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let finder = LocationFinder::new(&client, &ski);

    let err = finder.regions().await.unwrap_err();
    match err {
        CatalogError::Fetch { url, .. } => assert!(url.ends_with("/location_list")),
        other => panic!("expected Fetch error, got: {other:?}"),
    }
}

#[tokio::test]
async fn report_with_fresh_total_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .and(query_param("loc", "peak-one"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("resort = Peak One\nsnow.fresh = 12\nsnow.units = in\n"),
        )
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);

    let report = fetcher.load(&peak_one(), &ski, CacheMode::NoCache).await;
    assert!(!report.has_errors());
    assert!(report.has_fresh_snow_total());
    assert_eq!(report.fresh_as_string(), "12 in");
    assert!(!report.request_url().is_empty());
}

#[tokio::test]
async fn report_without_figure_is_success_without_total() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("resort = Peak One\nsnow.base = 45\n"),
        )
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);

    let report = fetcher.load(&peak_one(), &ski, CacheMode::NoCache).await;
    assert!(!report.has_errors());
    assert!(!report.has_fresh_snow_total());
}

#[tokio::test]
async fn json_server_report_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"resort":"Peak One","snow":{"fresh":12,"units":"in"},"source_url":"https://upstream.example.com/peak-one"}"#,
        ))
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::Json);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);

    let report = fetcher.load(&peak_one(), &ski, CacheMode::NoCache).await;
    assert!(!report.has_errors());
    assert_eq!(report.fresh_as_string(), "12 in");
    assert_eq!(
        report.fresh_source_url(),
        "https://upstream.example.com/peak-one"
    );
}

#[tokio::test]
async fn persistent_server_error_becomes_error_report() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);

    let report = fetcher.load(&peak_one(), &ski, CacheMode::NoCache).await;
    assert!(report.has_errors());
    assert!(!report.has_fresh_snow_total());
    assert!(!report.request_url().is_empty());
    assert!(report.non_localized_error().unwrap().starts_with("transport:"));
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(200).set_body_string("snow.fresh = 6\nsnow.units = in\n"))
        .mount(&server)
        .await;

    let client = HttpClient::new(5, "snowline-tests/0.1", 2, 0).unwrap();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);

    let report = fetcher.load(&peak_one(), &ski, CacheMode::NoCache).await;
    assert!(!report.has_errors(), "error: {:?}", report.error());
    assert_eq!(report.fresh_as_string(), "6 in");
}

#[tokio::test]
async fn malformed_content_names_the_resort() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>maintenance</body></html>"),
        )
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);

    let report = fetcher.load(&peak_one(), &ski, CacheMode::Cached).await;
    assert!(report.has_errors());
    assert!(report.error().unwrap().contains("Peak One"));
}

#[tokio::test]
async fn cached_mode_stores_payload_for_later() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("snow.fresh = 12\nsnow.units = in\n"),
        )
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);

    let resort = peak_one();
    let report = fetcher.load(&resort, &ski, CacheMode::Cached).await;
    assert!(!report.has_errors());

    let entry = cache.get(ski.cache_id(), &resort.path).unwrap();
    assert_eq!(
        entry.expect("payload should be cached").content,
        "snow.fresh = 12\nsnow.units = in\n"
    );
}

#[tokio::test]
async fn offline_with_cache_serves_cached_payload_without_network() {
    let server = MockServer::start().await;

    // Any request at all would violate the offline contract.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("snow.fresh = 99\n"))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let resort = peak_one();
    cache
        .put(ski.cache_id(), &resort.path, "snow.fresh = 12\nsnow.units = in\n")
        .unwrap();

    let fetcher = ReportFetcher::new(&client, &cache, &Offline);
    let report = fetcher.load(&resort, &ski, CacheMode::Cached).await;
    assert!(!report.has_errors());
    assert_eq!(report.fresh_as_string(), "12 in");
}

#[tokio::test]
async fn offline_with_empty_cache_is_an_error_report() {
    let server = MockServer::start().await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());

    let fetcher = ReportFetcher::new(&client, &cache, &Offline);
    let report = fetcher.load(&peak_one(), &ski, CacheMode::Cached).await;
    assert!(report.has_errors());
    assert!(!report.has_fresh_snow_total());
    assert_eq!(report.non_localized_error().unwrap(), "offline-no-cache");
}

#[tokio::test]
async fn online_fetch_failure_falls_back_to_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let resort = peak_one();
    cache
        .put(ski.cache_id(), &resort.path, "snow.fresh = 8\nsnow.units = in\n")
        .unwrap();

    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);
    let report = fetcher.load(&resort, &ski, CacheMode::Cached).await;
    assert!(!report.has_errors());
    assert_eq!(report.fresh_as_string(), "8 in");
}

#[tokio::test]
async fn no_cache_mode_never_reads_or_writes_the_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("snow.fresh = 3\nsnow.units = in\n"),
        )
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let resort = peak_one();
    cache
        .put(ski.cache_id(), &resort.path, "snow.fresh = 99\nsnow.units = in\n")
        .unwrap();

    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);
    let report = fetcher.load(&resort, &ski, CacheMode::NoCache).await;

    // Live content wins over the stale entry, and the entry is untouched.
    assert_eq!(report.fresh_as_string(), "3 in");
    let entry = cache.get(ski.cache_id(), &resort.path).unwrap().unwrap();
    assert_eq!(entry.content, "snow.fresh = 99\nsnow.units = in\n");
}

#[tokio::test]
async fn repeated_no_cache_loads_are_deterministic() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("snow.fresh = 12\nsnow.units = in\n"),
        )
        .mount(&server)
        .await;

    let client = test_client();
    let ski = ski_server(&server.uri(), ServerFormat::KeyValue);
    let dir = tempfile::tempdir().unwrap();
    let cache = ReportCache::new(dir.path());
    let fetcher = ReportFetcher::new(&client, &cache, &AssumeOnline);

    let first = fetcher.load(&peak_one(), &ski, CacheMode::NoCache).await;
    let second = fetcher.load(&peak_one(), &ski, CacheMode::NoCache).await;
    assert_eq!(first.has_errors(), second.has_errors());
    assert_eq!(first.fresh_as_string(), second.fresh_as_string());
}
