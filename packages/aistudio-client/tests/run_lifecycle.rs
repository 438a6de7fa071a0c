//! Run lifecycle tests against a scripted transport.
//!
//! Time is paused, so poll sleeps advance a virtual clock instead of
//! blocking the test.

use std::time::Duration;

use aistudio_client::testing::MockTransport;
use aistudio_client::transport::Method;
use aistudio_client::{
    AiStudioClient, AiStudioError, BrowseOptions, CrawlOptions, Family, OutputFormat, PollPolicy,
    RunHandle, RunOutput, ScrapeOptions, SearchOptions, TransportError,
};
use serde_json::json;
use tokio::time::Instant;
use tokio_test::assert_err;

fn policy(timeout_secs: u64) -> PollPolicy {
    PollPolicy::new(Duration::from_secs(timeout_secs)).with_interval(Duration::from_secs(5))
}

#[tokio::test(start_paused = true)]
async fn test_scrape_end_to_end_single_poll() {
    let mock = MockTransport::new()
        .with_response(Method::Post, "/scrape", json!({ "run_id": "r1" }))
        .with_response(Method::Get, "/scrape/run", json!({ "status": "completed" }))
        .with_response(Method::Get, "/scrape/run/data", json!({ "data": { "md": "hi" } }));
    let client = AiStudioClient::with_transport(mock.clone());

    let options = ScrapeOptions::new("https://a").with_output_format(OutputFormat::Markdown);
    let output = client.scrape(&options, policy(120)).await.unwrap();

    assert_eq!(
        output,
        RunOutput {
            status: None,
            data: json!({ "md": "hi" }),
            message: None,
        }
    );
    assert_eq!(mock.call_count(Method::Get, "/scrape/run"), 1);
    assert_eq!(mock.call_count(Method::Get, "/scrape/run/data"), 1);

    let calls = mock.calls();
    assert_eq!(
        calls[0].body,
        Some(json!({ "url": "https://a", "output_format": "markdown", "render_html": false }))
    );
    assert_eq!(calls[1].query_param("run_id"), Some("r1"));
    assert_eq!(calls[2].query_param("run_id"), Some("r1"));
}

#[tokio::test(start_paused = true)]
async fn test_immediate_success_adds_no_delay() {
    for (family, submit, status, data, body) in [
        (Family::Scrape, "/scrape", "/scrape/run", "/scrape/run/data", json!({ "status": "success" })),
        (Family::Crawl, "/extract/run", "/extract/run/steps", "/extract/run/data", json!({ "run": { "status": "completed" } })),
        (Family::Browse, "/browser-agent/run", "/browser-agent/run/steps", "/browser-agent/run/data", json!({ "run": { "status": "success" } })),
    ] {
        let mock = MockTransport::new()
            .with_response(Method::Post, submit, json!({ "id": "r9" }))
            .with_response(Method::Get, status, body)
            .with_response(Method::Get, data, json!({ "status": "completed", "data": [1, 2] }));
        let client = AiStudioClient::with_transport(mock.clone());
        let run_client = client.run_client(family);

        let request = match family {
            Family::Scrape => ScrapeOptions::new("https://a").to_request(),
            Family::Crawl => CrawlOptions::new("https://a", "p").to_request(),
            Family::Browse => BrowseOptions::new("https://a", "p").to_request(),
            Family::Search => unreachable!(),
        }
        .unwrap();

        let started = Instant::now();
        let result = run_client.run_to_completion(&request, policy(60)).await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO, "{family} slept");
        assert_eq!(result.family, family);
        assert_eq!(result.payload["data"], json!([1, 2]));
        assert_eq!(mock.call_count(Method::Get, status), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_never_fetches_result() {
    let mock = MockTransport::new()
        .with_response(Method::Post, "/extract/run", json!({ "run_id": "r1" }))
        .with_response(Method::Get, "/extract/run/steps", json!({ "run": { "status": "running" } }));
    let client = AiStudioClient::with_transport(mock.clone());

    let err = client
        .crawl(&CrawlOptions::new("https://a", "p"), policy(30))
        .await
        .unwrap_err();

    match err {
        AiStudioError::PollTimeout { family, timeout } => {
            assert_eq!(family, Family::Crawl);
            assert_eq!(timeout, Duration::from_secs(30));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    // Polls at t = 0, 5, 10, 15, 20, 25.
    assert_eq!(mock.call_count(Method::Get, "/extract/run/steps"), 6);
    assert_eq!(mock.call_count(Method::Get, "/extract/run/data"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_message_carries_budget() {
    let mock = MockTransport::new()
        .with_response(Method::Post, "/scrape", json!({ "run_id": "r1" }))
        .with_response(Method::Get, "/scrape/run", json!({ "status": "pending" }));
    let client = AiStudioClient::with_transport(mock);

    let err = client
        .scrape(&ScrapeOptions::new("https://a"), policy(10))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "Scraping timeout after 10000ms");
}

#[tokio::test(start_paused = true)]
async fn test_missing_run_id_stops_before_polling() {
    let mock = MockTransport::new()
        .with_response(Method::Post, "/browser-agent/run", json!({ "status": "pending" }));
    let client = AiStudioClient::with_transport(mock.clone());

    let err = client
        .browse(&BrowseOptions::new("https://a", "p"), policy(60))
        .await
        .unwrap_err();

    assert!(matches!(err, AiStudioError::Submission { family: Family::Browse }));
    assert_eq!(mock.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_nested_failure_message() {
    for (submit, steps, family) in [
        ("/extract/run", "/extract/run/steps", Family::Crawl),
        ("/browser-agent/run", "/browser-agent/run/steps", Family::Browse),
    ] {
        let mock = MockTransport::new()
            .with_response(Method::Post, submit, json!({ "run_id": "r1" }))
            .with_response(Method::Get, steps, json!({ "run": { "status": "failed", "error": "X" } }));
        let client = AiStudioClient::with_transport(mock.clone());

        let err = match family {
            Family::Crawl => client.crawl(&CrawlOptions::new("https://a", "p"), policy(60)).await,
            _ => client.browse(&BrowseOptions::new("https://a", "p"), policy(60)).await,
        }
        .unwrap_err();

        match &err {
            AiStudioError::RemoteRunFailure { message, .. } => assert_eq!(message, "X"),
            other => panic!("expected remote failure, got {other:?}"),
        }
        assert_eq!(mock.total_calls(), 2);
    }
}

#[tokio::test(start_paused = true)]
async fn test_scrape_top_level_failure() {
    let mock = MockTransport::new()
        .with_response(Method::Post, "/scrape", json!({ "run_id": "r1" }))
        .with_response(Method::Get, "/scrape/run", json!({ "status": "error", "message": "blocked" }));
    let client = AiStudioClient::with_transport(mock);

    let err = client
        .scrape(&ScrapeOptions::new("https://a"), policy(60))
        .await
        .unwrap_err();

    assert!(err.is_remote_failure());
    assert_eq!(err.to_string(), "Scraping failed: blocked");
}

#[tokio::test(start_paused = true)]
async fn test_unknown_status_keeps_polling_outside_search() {
    let mock = MockTransport::new()
        .with_response(Method::Post, "/scrape", json!({ "run_id": "r1" }))
        .with_response(Method::Get, "/scrape/run", json!({ "status": "queued" }))
        .with_response(Method::Get, "/scrape/run", json!({ "status": "completed" }))
        .with_response(Method::Get, "/scrape/run/data", json!({ "data": "ok" }));
    let client = AiStudioClient::with_transport(mock.clone());

    let started = Instant::now();
    let output = client
        .scrape(&ScrapeOptions::new("https://a"), policy(60))
        .await
        .unwrap();

    assert_eq!(output.data, json!("ok"));
    assert_eq!(mock.call_count(Method::Get, "/scrape/run"), 2);
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_search_processing_then_completed() {
    let mock = MockTransport::new()
        .with_response(Method::Post, "/search/run", json!({ "run_id": "s1" }))
        .with_response(Method::Get, "/search/run/data", json!({ "status": "processing" }))
        .with_response(Method::Get, "/search/run/data", json!({ "status": "processing" }))
        .with_response(
            Method::Get,
            "/search/run/data",
            json!({
                "status": "completed",
                "message": null,
                "data": [{ "url": "https://a", "title": "A", "description": "d" }]
            }),
        );
    let client = AiStudioClient::with_transport(mock.clone());

    let options = SearchOptions::new("rust").with_limit(10);
    let output = client.search(&options, policy(180)).await.unwrap();

    assert_eq!(output.status.as_deref(), Some("completed"));
    assert_eq!(
        output.data,
        json!([{ "url": "https://a", "title": "A", "description": "d" }])
    );
    assert_eq!(output.message, None);
    assert_eq!(output.search_hits().unwrap()[0].title, "A");
    assert_eq!(mock.call_count(Method::Get, "/search/run/data"), 3);
    // Status and data come from one endpoint; nothing else is polled.
    assert_eq!(mock.total_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_search_unknown_status_fails_without_retry() {
    let mock = MockTransport::new()
        .with_response(Method::Post, "/search/run", json!({ "run_id": "s1" }))
        .with_response(Method::Get, "/search/run/data", json!({ "status": "queued" }));
    let client = AiStudioClient::with_transport(mock.clone());

    let started = Instant::now();
    let err = client
        .search(&SearchOptions::new("rust"), policy(180))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Search failed: Unknown status queued");
    assert_eq!(mock.call_count(Method::Get, "/search/run/data"), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_search_failed_uses_message() {
    let mock = MockTransport::new()
        .with_response(Method::Post, "/search/run", json!({ "run_id": "s1" }))
        .with_response(Method::Get, "/search/run/data", json!({ "status": "failed", "message": "rate limited" }));
    let client = AiStudioClient::with_transport(mock);

    let err = client
        .search(&SearchOptions::new("rust"), policy(180))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Search failed: rate limited");
}

#[tokio::test]
async fn test_empty_handle_rejected_before_request() {
    let mock = MockTransport::new();
    let client = AiStudioClient::with_transport(mock.clone());

    let err = client
        .run_client(Family::Scrape)
        .poll_status(&RunHandle::new(Family::Scrape, ""))
        .await
        .unwrap_err();

    assert!(matches!(err, AiStudioError::InvalidHandle { .. }));
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_handle_bound_to_its_family() {
    let mock = MockTransport::new();
    let client = AiStudioClient::with_transport(mock.clone());

    let result = client
        .run_client(Family::Browse)
        .fetch_result(&RunHandle::new(Family::Crawl, "r1"))
        .await;

    assert_err!(&result);
    assert!(matches!(result, Err(AiStudioError::InvalidHandle { .. })));
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_transport_error_propagates_unchanged() {
    let mock = MockTransport::new().with_error(
        Method::Post,
        "/scrape",
        TransportError::Api {
            status: 401,
            message: "invalid api key".into(),
        },
    );
    let client = AiStudioClient::with_transport(mock.clone());

    let err = client
        .scrape(&ScrapeOptions::new("https://a"), policy(60))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AiStudioError::Transport(TransportError::Api { status: 401, .. })
    ));
    assert_eq!(mock.total_calls(), 1);
}

#[tokio::test]
async fn test_check_credentials() {
    let mock = MockTransport::new().with_response(Method::Get, "/status", json!({ "status": "ok" }));
    let client = AiStudioClient::with_transport(mock);

    assert_eq!(client.check_credentials().await.unwrap(), json!({ "status": "ok" }));
}
