//! Watcher integration tests against a live HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use boardwatch::{BoardWatch, ManifestSource, ScanReport, WatchConfig, Watcher};
use tiny_http::{Response, Server};

const TWO_PAWNS_MANIFEST: &str = r#"{ "pieces": [ { "type": "wp" }, { "type": "wp" } ] }"#;

fn board_page(pieces: &str) -> String {
    format!(
        r#"<html><head><title>Board</title></head><body><div class="board">{}</div></body></html>"#,
        pieces
    )
}

/// A tiny test server whose page, manifest, and redirect target can
/// be swapped while it runs.
struct TestServer {
    base_url: String,
    page: Arc<Mutex<String>>,
    redirect_to: Arc<Mutex<Option<String>>>,
    manifest_hits: Arc<AtomicUsize>,
}

fn start_server(page: &str, manifest: &str) -> TestServer {
    let server = Server::http("0.0.0.0:0").unwrap();
    let addr = server.server_addr();

    let page = Arc::new(Mutex::new(page.to_string()));
    let manifest = manifest.to_string();
    let redirect_to: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let manifest_hits = Arc::new(AtomicUsize::new(0));

    let page_srv = page.clone();
    let redirect_srv = redirect_to.clone();
    let hits_srv = manifest_hits.clone();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let path = request.url().to_string();
            let response = match path.as_str() {
                "/pieces.json" => {
                    hits_srv.fetch_add(1, Ordering::SeqCst);
                    Response::from_string(manifest.clone())
                }
                "/" => match redirect_srv.lock().unwrap().clone() {
                    Some(target) => Response::from_string("").with_status_code(302).with_header(
                        format!("Location: {}", target)
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    None => Response::from_string(page_srv.lock().unwrap().clone()),
                },
                "/a" | "/b" => Response::from_string(page_srv.lock().unwrap().clone()),
                _ => Response::from_string("Not Found").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    TestServer {
        base_url: format!("http://{}", addr),
        page,
        redirect_to,
        manifest_hits,
    }
}

fn quick_config() -> WatchConfig {
    WatchConfig {
        poll_interval_ms: 50,
        container_retry_delays_ms: vec![50],
        ..Default::default()
    }
}

fn collect_reports(watcher: &mut Watcher) -> Arc<Mutex<Vec<ScanReport>>> {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    watcher.on_report(move |r| sink.lock().unwrap().push(r.clone()));
    reports
}

#[test]
fn served_board_mutation_triggers_a_rescan() {
    let srv = start_server(
        &board_page(
            r#"<div class="piece wp square-12"></div><div class="piece wp square-22"></div>"#,
        ),
        TWO_PAWNS_MANIFEST,
    );

    let mut watcher = Watcher::new(
        quick_config(),
        ManifestSource::Url("pieces.json".into()),
    )
    .unwrap();
    let reports = collect_reports(&mut watcher);

    watcher.goto(&srv.base_url).unwrap();
    assert!(watcher.attached());
    {
        let got = reports.lock().unwrap();
        assert_eq!(got.len(), 1);
        assert!(got[0].complete);
    }

    // A pawn disappears from the served page.
    *srv.page.lock().unwrap() = board_page(r#"<div class="piece wp square-12"></div>"#);
    watcher.poll_once().unwrap();

    let got = reports.lock().unwrap();
    assert_eq!(got.len(), 2);
    assert!(!got[1].complete);
    assert_eq!(
        got[1].missing,
        vec!["wp: missing 1 of 2. Remaining on squares: a2"]
    );
}

#[test]
fn attribute_churn_outside_the_allowlist_is_not_a_mutation() {
    let srv = start_server(
        &board_page(r#"<div class="piece wp square-12" aria-hidden="true"></div>"#),
        r#"{ "pieces": [ { "type": "wp" } ] }"#,
    );

    let mut watcher = Watcher::new(
        quick_config(),
        ManifestSource::Url("pieces.json".into()),
    )
    .unwrap();
    let reports = collect_reports(&mut watcher);

    watcher.goto(&srv.base_url).unwrap();
    assert_eq!(reports.lock().unwrap().len(), 1);

    // aria-hidden is outside the observed allowlist.
    *srv.page.lock().unwrap() =
        board_page(r#"<div class="piece wp square-12" aria-hidden="false"></div>"#);
    watcher.poll_once().unwrap();
    assert_eq!(reports.lock().unwrap().len(), 1);

    // A class change is a qualifying mutation.
    *srv.page.lock().unwrap() =
        board_page(r#"<div class="piece wp square-14" aria-hidden="false"></div>"#);
    watcher.poll_once().unwrap();
    assert_eq!(reports.lock().unwrap().len(), 2);
}

#[test]
fn late_container_is_picked_up_by_the_retry_schedule() {
    let srv = start_server(
        r#"<html><body><p>loading...</p></body></html>"#,
        r#"{ "pieces": [] }"#,
    );

    let config = WatchConfig {
        poll_interval_ms: 50,
        container_retry_delays_ms: vec![100, 200, 400],
        ..Default::default()
    };
    let mut watcher = Watcher::new(config, ManifestSource::Url("pieces.json".into())).unwrap();

    // The board renders a moment after the first fetch.
    let page = srv.page.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        *page.lock().unwrap() = board_page(r#"<div class="piece wp square-12"></div>"#);
    });

    watcher.goto(&srv.base_url).unwrap();
    assert!(watcher.attached());
}

#[test]
fn exhausted_retry_schedule_gives_up_without_an_error() {
    let srv = start_server(
        r#"<html><body><p>no board here</p></body></html>"#,
        r#"{ "pieces": [] }"#,
    );

    let config = WatchConfig {
        poll_interval_ms: 50,
        container_retry_delays_ms: vec![50, 100],
        ..Default::default()
    };
    let mut watcher = Watcher::new(config, ManifestSource::Url("pieces.json".into())).unwrap();

    watcher.goto(&srv.base_url).unwrap();
    assert!(!watcher.attached());
    // The scan still ran document-wide; an empty manifest succeeds.
    assert!(watcher.latest_report().unwrap().complete);
}

#[test]
fn navigation_reinitializes_and_refetches_the_manifest() {
    let srv = start_server(
        &board_page(
            r#"<div class="piece wp square-12"></div><div class="piece wp square-22"></div>"#,
        ),
        TWO_PAWNS_MANIFEST,
    );
    *srv.redirect_to.lock().unwrap() = Some("/a".to_string());

    let mut watcher = Watcher::new(
        quick_config(),
        ManifestSource::Url("pieces.json".into()),
    )
    .unwrap();

    let navigations = Arc::new(Mutex::new(Vec::new()));
    let sink = navigations.clone();
    watcher.on_navigation(move |change| {
        sink.lock().unwrap().push((change.from.clone(), change.to.clone()));
    });

    watcher.goto(&srv.base_url).unwrap();
    assert!(watcher.current_url().unwrap().ends_with("/a"));
    assert_eq!(srv.manifest_hits.load(Ordering::SeqCst), 1);

    // The app navigates: the same entry URL now lands on /b.
    *srv.redirect_to.lock().unwrap() = Some("/b".to_string());
    watcher.poll_once().unwrap();

    assert!(watcher.current_url().unwrap().ends_with("/b"));
    assert_eq!(srv.manifest_hits.load(Ordering::SeqCst), 2);
    let navs = navigations.lock().unwrap();
    assert_eq!(navs.len(), 1);
    assert!(navs[0].0.ends_with("/a"));
    assert!(navs[0].1.ends_with("/b"));
}

#[test]
fn manifest_failure_leaves_the_watcher_idle() {
    let srv = start_server(
        &board_page(r#"<div class="piece wp square-12"></div>"#),
        "this is not json",
    );

    let mut watcher = Watcher::new(
        quick_config(),
        ManifestSource::Url("pieces.json".into()),
    )
    .unwrap();

    // Initialization is not an error, but nothing was scanned and no
    // observer attached.
    watcher.goto(&srv.base_url).unwrap();
    assert!(watcher.latest_report().is_none());
    assert!(!watcher.attached());
    assert!(watcher.scan_now().is_err());
}

#[tokio::test]
async fn async_handle_round_trip() {
    let srv = start_server(
        &board_page(
            r#"<div class="piece wp square-12"></div><div class="piece wp square-22"></div>"#,
        ),
        TWO_PAWNS_MANIFEST,
    );

    let watch = BoardWatch::new(Some(quick_config()), ManifestSource::Url("pieces.json".into()))
        .await
        .unwrap();

    watch.goto(&srv.base_url).await.unwrap();
    let report = watch.latest_report().await.unwrap().unwrap();
    assert!(report.complete);

    *srv.page.lock().unwrap() = board_page(r#"<div class="piece wp square-12"></div>"#);
    let report = watch.scan_now().await.unwrap();
    assert!(!report.complete);

    watch.close().await.unwrap();
}
