use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use transclude_core::contract::{FetchError, Fetcher, MockFetcher};
use transclude_core::directive::has_directives;
use transclude_core::error::TranscludeError;
use transclude_core::resolver::Resolver;
use transclude_core::store::{FsStore, MemoryStore};

/// Store that delays selected paths and records completion order.
struct DelayedStore {
    inner: MemoryStore,
    delays: HashMap<String, Duration>,
    completed: Mutex<Vec<String>>,
}

impl DelayedStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            delays: HashMap::new(),
            completed: Mutex::new(Vec::new()),
        }
    }

    fn delay(mut self, path: &str, by: Duration) -> Self {
        self.delays.insert(path.to_string(), by);
        self
    }
}

#[async_trait]
impl Fetcher for DelayedStore {
    async fn get(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        let result = self.inner.get(path).await;
        self.completed.lock().unwrap().push(path.to_string());
        result
    }
}

#[tokio::test]
async fn test_end_to_end_example() {
    let store = MemoryStore::new().with("/a.shtml", "<span>hi</span>");
    let resolver = Resolver::new(store);

    let out = resolver
        .resolve(r#"<div><!--#include virtual="/a.shtml" --></div>"#, "/")
        .await
        .expect("resolution should succeed");

    assert_eq!(out, "<div><span>hi</span></div>");
}

#[tokio::test]
async fn test_document_without_directives_is_unchanged() {
    let mut fetcher = MockFetcher::new();
    fetcher.expect_get().never();
    let resolver = Resolver::new(fetcher);

    let body = "<html>\n  <!-- not an include -->\n  <p>caf\u{e9}</p>\n</html>\n";
    let out = resolver.resolve(body, "/any/dir").await.unwrap();
    assert_eq!(out, body);
}

#[tokio::test(start_paused = true)]
async fn test_order_follows_directives_not_fetch_completion() {
    let store = DelayedStore::new(
        MemoryStore::new()
            .with("/p1.html", "FIRST")
            .with("/p2.html", "SECOND"),
    )
    .delay("/p1.html", Duration::from_millis(50));
    let store = Arc::new(store);
    let resolver = Resolver::new(store.clone());

    let out = resolver
        .resolve(
            r#"<!--#include virtual="/p1.html" -->|<!--#include virtual="/p2.html" -->"#,
            "/",
        )
        .await
        .unwrap();

    assert_eq!(out, "FIRST|SECOND");
    assert_eq!(
        *store.completed.lock().unwrap(),
        vec!["/p2.html".to_string(), "/p1.html".to_string()],
        "p2 should have completed first for this test to be meaningful"
    );
}

#[tokio::test]
async fn test_duplicate_directives_are_each_substituted() {
    let store = MemoryStore::new().with("/nav.html", "<nav/>");
    let resolver = Resolver::new(store);

    let out = resolver
        .resolve(
            r#"<!--#include virtual="/nav.html" --><main/><!--#include virtual="/nav.html" -->"#,
            "/",
        )
        .await
        .unwrap();

    assert_eq!(out, "<nav/><main/><nav/>");
    assert_eq!(resolver.fetcher().fetch_count(), 2);
}

#[tokio::test]
async fn test_nested_includes_resolve_relative_to_parent() {
    let store = MemoryStore::new()
        .with("/site/b.shtml", r#"<b><!--#include virtual="parts/c.shtml" --></b>"#)
        .with("/site/parts/c.shtml", "C")
        .with("/site/parts/d.html", "unused");
    let resolver = Resolver::new(store);

    let out = resolver
        .resolve(r#"<a><!--#include virtual="b.shtml"--></a>"#, "/site")
        .await
        .unwrap();

    assert_eq!(out, "<a><b>C</b></a>");
    assert!(!has_directives(&out));
}

#[tokio::test]
async fn test_relative_parent_dirs_resolve_from_store_root() {
    let store = MemoryStore::new()
        .with("/a.shtml", "A")
        .with("/docs/nav.shtml", "N");
    let resolver = Resolver::new(store);

    for dir in ["", ".", "/"] {
        let out = resolver
            .resolve(r#"<!--#include virtual="a.shtml" -->"#, dir)
            .await
            .unwrap();
        assert_eq!(out, "A", "parent dir {dir:?}");
    }

    let out = resolver
        .resolve(r#"[<!--#include virtual="nav.shtml" -->|<!--#include virtual="../a.shtml" -->]"#, "docs")
        .await
        .unwrap();
    assert_eq!(out, "[N|A]");
}

#[tokio::test]
async fn test_parent_segments_are_clamped_at_store_root() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_get()
        .withf(|path: &str| path == "/secret.txt")
        .times(2)
        .returning(|_| Ok(b"inside".to_vec()));
    let resolver = Resolver::new(fetcher);

    let out = resolver
        .resolve(r#"<!--#include virtual="../secret.txt" -->"#, ".")
        .await
        .unwrap();
    assert_eq!(out, "inside");

    let out = resolver
        .resolve(r#"<!--#include virtual="../../../secret.txt" -->"#, "/docs")
        .await
        .unwrap();
    assert_eq!(out, "inside");
}

#[tokio::test]
async fn test_directory_store_never_reads_outside_its_root() {
    let outer = tempfile::tempdir().unwrap();
    let site = outer.path().join("site");
    std::fs::create_dir_all(&site).unwrap();
    std::fs::write(outer.path().join("secret.txt"), "SECRET").unwrap();
    let resolver = Resolver::new(FsStore::new(&site));

    let err = resolver
        .resolve(r#"<!--#include virtual="../secret.txt" -->"#, ".")
        .await
        .unwrap_err();
    assert!(
        matches!(err, TranscludeError::NotFound { ref path } if path == "/secret.txt"),
        "unexpected: {err:?}"
    );

    let err = resolver.resolve_document("../secret.txt").await.unwrap_err();
    assert!(
        matches!(err, TranscludeError::NotFound { ref path } if path == "/secret.txt"),
        "unexpected: {err:?}"
    );

    std::fs::write(site.join("secret.txt"), "public").unwrap();
    assert_eq!(resolver.resolve_document("../secret.txt").await.unwrap(), "public");
}

#[tokio::test]
async fn test_non_transcludable_include_is_verbatim() {
    let raw = r#"<pre><!--#include virtual="/never-fetched.html" --></pre>"#;
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_get()
        .withf(|path: &str| path == "/snippet.html")
        .times(1)
        .returning(move |_| Ok(raw.as_bytes().to_vec()));
    let resolver = Resolver::new(fetcher);

    let out = resolver
        .resolve(r#"<!--#include virtual="snippet.html" -->"#, "/")
        .await
        .unwrap();

    assert_eq!(out, raw);
}

#[tokio::test]
async fn test_custom_policy_controls_recursion() {
    let store = MemoryStore::new()
        .with("/outer.html", r#"[<!--#include virtual="/inner.txt" -->]"#)
        .with("/inner.txt", "in");
    let resolver = Resolver::new(store).with_policy(|path: &str| path.ends_with(".html"));

    let out = resolver
        .resolve(r#"<!--#include virtual="/outer.html" -->"#, "/")
        .await
        .unwrap();

    assert_eq!(out, "[in]");
}

#[tokio::test]
async fn test_missing_nested_document_fails_whole_resolution() {
    let store = MemoryStore::new()
        .with("/ok.html", "fine")
        .with("/mid.shtml", r#"<!--#include virtual="/gone.html" -->"#);
    let resolver = Resolver::new(store);

    let err = resolver
        .resolve(
            r#"<!--#include virtual="/ok.html" --><!--#include virtual="/mid.shtml" -->"#,
            "/",
        )
        .await
        .unwrap_err();

    match err {
        TranscludeError::NotFound { path } => assert_eq!(path, "/gone.html"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_store_error_is_surfaced_not_retried() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_get()
        .times(1)
        .returning(|_| Err(FetchError::Store("throttled".into())));
    let resolver = Resolver::new(fetcher);

    let err = resolver
        .resolve(r#"<!--#include virtual="/a.html" -->"#, "/")
        .await
        .unwrap_err();

    assert!(matches!(err, TranscludeError::Store { ref path, .. } if path == "/a.html"));
}

#[tokio::test]
async fn test_direct_self_include_is_a_cycle() {
    let store = MemoryStore::new().with("/loop.shtml", r#"x<!--#include virtual="loop.shtml" -->"#);
    let resolver = Resolver::new(store);

    let err = resolver.resolve_document("/loop.shtml").await.unwrap_err();
    match err {
        TranscludeError::CycleDetected { chain } => {
            assert_eq!(chain, vec!["/loop.shtml", "/loop.shtml"]);
        }
        other => panic!("expected CycleDetected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transitive_cycle_is_detected() {
    let store = MemoryStore::new()
        .with("/a.shtml", r#"<!--#include virtual="/b.shtml" -->"#)
        .with("/b.shtml", r#"<!--#include virtual="/c.shtml" -->"#)
        .with("/c.shtml", r#"<!--#include virtual="/a.shtml" -->"#);
    let resolver = Resolver::new(store);

    let err = resolver
        .resolve(r#"<!--#include virtual="/a.shtml" -->"#, "/")
        .await
        .unwrap_err();

    match err {
        TranscludeError::CycleDetected { chain } => {
            assert_eq!(chain, vec!["/a.shtml", "/b.shtml", "/c.shtml", "/a.shtml"]);
        }
        other => panic!("expected CycleDetected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_diamond_inclusion_is_not_a_cycle() {
    let store = MemoryStore::new()
        .with("/left.shtml", r#"L<!--#include virtual="/shared.shtml" -->"#)
        .with("/right.shtml", r#"R<!--#include virtual="/shared.shtml" -->"#)
        .with("/shared.shtml", "S");
    let resolver = Resolver::new(store);

    let out = resolver
        .resolve(
            r#"<!--#include virtual="/left.shtml" -->|<!--#include virtual="/right.shtml" -->"#,
            "/",
        )
        .await
        .unwrap();

    assert_eq!(out, "LS|RS");
}

#[tokio::test]
async fn test_depth_limit() {
    let store = MemoryStore::new()
        .with("/1.shtml", r#"<!--#include virtual="/2.shtml" -->"#)
        .with("/2.shtml", r#"<!--#include virtual="/3.shtml" -->"#)
        .with("/3.shtml", "deep");
    let body = r#"<!--#include virtual="/1.shtml" -->"#;

    let shallow = Resolver::new(store).with_max_depth(2);
    let err = shallow.resolve(body, "/").await.unwrap_err();
    assert!(matches!(err, TranscludeError::DepthExceeded { depth: 3, ref path } if path == "/3.shtml"));

    let store = MemoryStore::new()
        .with("/1.shtml", r#"<!--#include virtual="/2.shtml" -->"#)
        .with("/2.shtml", r#"<!--#include virtual="/3.shtml" -->"#)
        .with("/3.shtml", "deep");
    let enough = Resolver::new(store).with_max_depth(3);
    assert_eq!(enough.resolve(body, "/").await.unwrap(), "deep");
}

#[tokio::test(start_paused = true)]
async fn test_deadline_bounds_slow_fetches() {
    let store = DelayedStore::new(MemoryStore::new().with("/slow.html", "late"))
        .delay("/slow.html", Duration::from_secs(30));
    let resolver = Resolver::new(store).with_timeout(Some(Duration::from_millis(100)));

    let err = resolver
        .resolve(r#"<!--#include virtual="/slow.html" -->"#, "/")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TranscludeError::DeadlineExceeded { timeout } if timeout == Duration::from_millis(100)
    ));
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced() {
    let store = MemoryStore::new().with("/bin.html", vec![b'o', b'k', 0xff]);
    let resolver = Resolver::new(store);

    let out = resolver
        .resolve(r#"<!--#include virtual="/bin.html" -->"#, "/")
        .await
        .unwrap();

    assert_eq!(out, "ok\u{fffd}");
}
