use assert_json_diff::assert_json_include;
use fedreg_server::{AppConfig, build_app};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_upstream() -> MockServer {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/agencies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 136, "name": "Department of Energy", "slug": "energy", "short_name": "DOE",
             "agency_url": "https://www.energy.gov/"},
            {"id": 7, "name": "Acme Bakery Council", "slug": "acme"}
        ])))
        .expect(3)
        .mount(&upstream)
        .await;

    Mock::given(method("GET"))
        .and(path("/documents.json"))
        .and(query_param("conditions[agencies][]", "energy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 41,
            "results": [
                {"title": "Energy Conservation Standards", "document_number": "2020-00001",
                 "publication_date": "2020-01-15", "type": "Rule", "abstract": "Standards"},
                {"title": "Meeting Notice", "document_number": "2020-00002",
                 "publication_date": "2020-01-14", "type": "Notice"}
            ]
        })))
        .mount(&upstream)
        .await;

    Mock::given(method("GET"))
        .and(path("/documents.json"))
        .and(query_param("fields[]", "agencies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "results": [
                {"title": "Hours of Service", "document_number": "2020-00010",
                 "publication_date": "2020-01-15", "type": "Proposed Rule",
                 "agencies": [{"name": "Transportation Department"}]},
                {"title": "Untyped", "document_number": "2020-00011",
                 "publication_date": "2020-01-15", "agencies": []}
            ]
        })))
        .mount(&upstream)
        .await;

    upstream
}

async fn start_server(upstream: &MockServer) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let mut cfg = AppConfig::default();
    cfg.upstream.base_url = upstream.uri();
    cfg.upstream.timeout_secs = 5;
    let app = build_app(&cfg).expect("build app");

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

#[tokio::test]
async fn server_endpoints_work() {
    let upstream = mock_upstream().await;
    let (base, shutdown_tx, handle) = start_server(&upstream).await;
    let client = reqwest::Client::new();

    // GET /healthz
    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    // GET /api/health before anything is cached
    let body: Value = client
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache_status"], "empty");
    assert_eq!(body["cache_ttl_secs"], Value::Null);

    // GET /api/agency-stats populates the cache
    let resp = client
        .get(format!("{base}/api/agency-stats"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total_agencies"], 1);
    assert!(body["last_updated"].as_str().is_some());
    let agencies = body["agencies"].as_object().unwrap();
    assert_eq!(agencies.keys().collect::<Vec<_>>(), ["DOE"]);
    assert_eq!(agencies["DOE"]["document_count"], 41);
    assert_eq!(agencies["DOE"]["size_mb"], 0.2246);
    assert_eq!(agencies["DOE"]["recent_documents"][0]["type"], "Rule");
    assert_eq!(agencies["DOE"]["recent_documents"][0]["abstract"], "Standards...");

    let body: Value = client
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["cache_status"], "populated");

    // GET /api/agency/{slug}
    let resp = client
        .get(format!("{base}/api/agency/energy"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_json_include!(
        actual: body,
        expected: json!({
            "display_name": "DOE",
            "full_name": "Department of Energy",
            "slug": "energy",
            "agency_id": 136,
            "url": "https://www.energy.gov/",
            "document_count": 41,
            "new_documents_count": 0
        })
    );

    let resp = client
        .get(format!("{base}/api/agency/acme"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "Agency with slug 'acme' not found"}));

    // GET /api/agencies/search
    let body: Value = client
        .get(format!("{base}/api/agencies/search?name=energy"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["slug"], "energy");
    let resp = client
        .get(format!("{base}/api/agencies/search?name=bakery"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let resp = client
        .get(format!("{base}/api/agencies/search"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    // HTML views of the cached snapshot
    let resp = client
        .get(format!("{base}/api/agency-stats?format=html"))
        .send()
        .await
        .unwrap();
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let page = resp.text().await.unwrap();
    assert!(page.contains("Energy Conservation Standards"));

    let page = client
        .get(format!("{base}/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("<strong>Total Agencies:</strong> 1"));
    assert!(!page.contains("Acme Bakery Council"));

    // Recent documents across all agencies
    let body: Value = client
        .get(format!("{base}/api/recent"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["documents"][0]["agency"], "Transportation Department");
    assert_eq!(body["documents"][0]["size_kb"], 120);
    assert_eq!(body["documents"][1]["agency"], "Unknown");
    assert_eq!(body["documents"][1]["type"], "Unknown");

    let page = client
        .get(format!("{base}/recent"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Found 2 new documents."));

    // GET and POST /refresh both rebuild the snapshot
    for request in [
        client.get(format!("{base}/refresh")),
        client.post(format!("{base}/refresh")),
    ] {
        let body: Value = request.send().await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["total_agencies"], 1);
    }

    // GET /api
    let body: Value = client
        .get(format!("{base}/api"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["service"], "fedreg");
    assert!(body["endpoints"]["GET /api/agency/{slug}"].is_string());

    // shutdown
    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn upstream_outage_surfaces_as_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agencies"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;
    let (base, shutdown_tx, handle) = start_server(&upstream).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/api/agency-stats"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("agency directory"));

    let body: Value = client
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["cache_status"], "empty");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
