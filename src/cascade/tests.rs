//! Cascade Module Tests
//!
//! ## Test Scopes
//! - **Candidates**: de-duplication, `next_candidate` skipping and exhaustion.
//! - **Cover Art**: ordering of raw, region and cleaned variants; known-URL filtering.
//! - **Cartridge**: local/remote fall-through, mode tracking, re-probing the local tier.
//! - **Probes**: `HttpProbe` against a live server, `LibraryProbe` in-process, `LocalProbe` selection.
//! - **Endpoints**: JSON contracts for the UI layer.

#[cfg(test)]
mod tests {
    use crate::app::{Services, router};
    use crate::cascade::candidates::{CandidateList, is_priority};
    use crate::cascade::cartridge::CartridgeCascade;
    use crate::cascade::cover_art::{build_cover_candidates, clean_display_name};
    use crate::cascade::failures::FailureSet;
    use crate::cascade::probe::{HttpProbe, LibraryProbe, LocalProbe, SourceProbe};
    use crate::cascade::types::{CascadeError, CdnFamily, NextCandidate, SourceMode};
    use crate::config::AppConfig;
    use crate::library::resolver::LibraryResolver;
    use crate::library::types::LibraryLayout;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::fs;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const REMOTE: &str = "https://storage.example/roms";

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Probe with a fixed answer that counts how often it was asked.
    struct FixedProbe {
        answer: bool,
        calls: AtomicUsize,
    }

    impl FixedProbe {
        fn new(answer: bool) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SourceProbe for FixedProbe {
        type Found = ();

        async fn probe(&self, _url: &str) -> Option<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.then_some(())
        }
    }

    /// Probe that plays back a fixed sequence of answers.
    struct ScriptedProbe {
        answers: Mutex<Vec<bool>>,
    }

    impl ScriptedProbe {
        fn new(mut answers: Vec<bool>) -> Self {
            answers.reverse();
            Self {
                answers: Mutex::new(answers),
            }
        }
    }

    impl SourceProbe for ScriptedProbe {
        type Found = ();

        async fn probe(&self, _url: &str) -> Option<()> {
            let answer = self.answers.lock().unwrap().pop().unwrap_or(false);
            answer.then_some(())
        }
    }

    fn library_with(shard: &str, name: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(shard)).unwrap();
        fs::write(dir.path().join(shard).join(name), b"NES\x1a").unwrap();
        dir
    }

    // ============================================================
    // CANDIDATE LIST TESTS
    // ============================================================

    #[test]
    fn test_candidate_list_deduplicates_preserving_order() {
        let list = CandidateList::new("asset", urls(&["a", "b", "a", "c", "b"]));

        assert_eq!(list.urls(), &urls(&["a", "b", "c"])[..]);
        assert_eq!(list.asset(), "asset");
    }

    #[test]
    fn test_next_candidate_walks_in_order() {
        let list = CandidateList::new("asset", urls(&["a", "b", "c"]));
        let failures = FailureSet::new();

        assert_eq!(
            list.next_candidate(None, &failures),
            NextCandidate::Candidate {
                index: 0,
                url: "a".to_string()
            }
        );
        assert_eq!(
            list.next_candidate(Some(0), &failures),
            NextCandidate::Candidate {
                index: 1,
                url: "b".to_string()
            }
        );
        assert_eq!(list.next_candidate(Some(2), &failures), NextCandidate::Exhausted);
    }

    #[test]
    fn test_next_candidate_skips_failed_urls() {
        let list = CandidateList::new("asset", urls(&["a", "b", "c"]));
        let failures = FailureSet::new();
        failures.mark_failed("a");
        failures.mark_failed("b");

        assert_eq!(
            list.next_candidate(None, &failures),
            NextCandidate::Candidate {
                index: 2,
                url: "c".to_string()
            }
        );
    }

    #[test]
    fn test_all_failed_means_exhausted() {
        let list = build_cover_candidates("Mega Man 2 (USA)", None);
        let failures = FailureSet::new();

        for url in list.urls() {
            assert_ne!(
                list.next_candidate(None, &failures),
                NextCandidate::Exhausted
            );
            failures.mark_failed(url);
        }

        assert_eq!(list.next_candidate(None, &failures), NextCandidate::Exhausted);
    }

    #[test]
    fn test_next_candidate_never_returns_failed_url() {
        let list = build_cover_candidates("Contra", Some("https://cdn.example/contra.png"));
        let failures = FailureSet::new();
        for url in list.urls().iter().step_by(2) {
            failures.mark_failed(url);
        }

        let mut last = None;
        while let NextCandidate::Candidate { index, url } = list.next_candidate(last, &failures) {
            assert!(!failures.has_failed(&url));
            last = Some(index);
        }
    }

    #[test]
    fn test_mark_failed_is_idempotent() {
        let failures = FailureSet::new();

        assert!(failures.is_empty());
        assert!(failures.mark_failed("https://cdn.example/x.png"));
        assert!(!failures.mark_failed("https://cdn.example/x.png"));
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn test_failure_set_stays_within_capacity() {
        let failures = FailureSet::with_capacity(3);

        for i in 0..10 {
            failures.mark_failed(&format!("https://cdn.example/{}.png", i));
            assert!(failures.len() <= failures.capacity());
        }

        // The most recent report is always kept
        assert!(failures.has_failed("https://cdn.example/9.png"));
        assert!(!failures.has_failed("https://cdn.example/0.png"));
    }

    #[test]
    fn test_priority_hint_covers_leading_candidates() {
        assert!(is_priority(0));
        assert!(is_priority(5));
        assert!(!is_priority(6));
    }

    // ============================================================
    // COVER ART TESTS
    // ============================================================

    #[test]
    fn test_clean_display_name() {
        assert_eq!(clean_display_name("Mega Man 2 (USA)"), "Mega_Man_2");
        assert_eq!(clean_display_name("Super Mario Bros. [!] (World)"), "Super_Mario_Bros");
        assert_eq!(clean_display_name("Dr. Mario - Remix"), "Dr_Mario_Remix");
        assert_eq!(clean_display_name("(Unl)"), "");
    }

    #[test]
    fn test_cover_candidates_for_display_name() {
        // ACT
        let list = build_cover_candidates("Mega Man 2 (USA)", None);
        let urls = list.urls();

        // ASSERT: non-empty and de-duplicated
        assert!(!urls.is_empty());
        let unique: std::collections::HashSet<_> = urls.iter().collect();
        assert_eq!(unique.len(), urls.len());

        // Raw name variant precedes the cleaned variant in every family
        for family in CdnFamily::ALL {
            let raw = family.image_url("Mega%20Man%202%20%28USA%29");
            let cleaned = family.image_url("Mega_Man_2");
            let raw_at = urls.iter().position(|u| *u == raw).unwrap();
            let cleaned_at = urls.iter().position(|u| *u == cleaned).unwrap();
            assert!(raw_at < cleaned_at);
        }

        // Families are tried in their declared order
        assert!(urls[0].starts_with(CdnFamily::LibretroSnaps.base_url()));
        assert!(urls[urls.len() - 1].starts_with(CdnFamily::LibretroBoxarts.base_url()));
    }

    #[test]
    fn test_region_variants_come_first() {
        let list = build_cover_candidates("Contra", None);
        let snaps = CdnFamily::LibretroSnaps;

        assert_eq!(
            &list.urls()[..6],
            &[
                snaps.image_url("Contra%20%28USA%29"),
                snaps.image_url("Contra%20%28World%29"),
                snaps.image_url("Contra%20%28Europe%29"),
                snaps.image_url("Contra%20%28Japan%29"),
                snaps.image_url("Contra"),
                // cleaned name equals the raw name here and is de-duplicated away
                CdnFamily::LibretroTitles.image_url("Contra%20%28USA%29"),
            ][..]
        );
    }

    #[test]
    fn test_known_url_goes_first_when_usable() {
        let known = "https://cdn.example/boxart/contra.png";
        let list = build_cover_candidates("Contra", Some(known));

        assert_eq!(list.urls()[0], known);
    }

    #[test]
    fn test_ephemeral_known_urls_are_ignored() {
        for known in ["blob:https://site/123", "https://site/placeholder.png", "  "] {
            let list = build_cover_candidates("Contra", Some(known));
            assert!(!list.urls().iter().any(|u| u == known), "{}", known);
        }
    }

    #[test]
    fn test_blank_display_name_yields_only_known_url() {
        assert!(build_cover_candidates("   ", None).is_empty());

        let list = build_cover_candidates("", Some("https://cdn.example/x.png"));
        assert_eq!(list.len(), 1);
    }

    // ============================================================
    // CARTRIDGE CASCADE TESTS
    // ============================================================

    #[test]
    fn test_cartridge_candidates_are_local_then_remote() {
        let cascade = CartridgeCascade::new(Some("https://storage.example/roms/"));

        let list = cascade.build_candidates("/Nes ROMs Complete 1 Of 4/Contra (U).zip");

        assert_eq!(
            list.urls(),
            &urls(&[
                "/api/roms/Nes%20ROMs%20Complete%201%20Of%204/Contra%20%28U%29.zip",
                "https://storage.example/roms/Nes%20ROMs%20Complete%201%20Of%204/Contra%20%28U%29.zip",
            ])[..]
        );
    }

    #[tokio::test]
    async fn test_cartridge_prefers_local_when_probe_succeeds() {
        let cascade = CartridgeCascade::new(Some(REMOTE));
        let probe = FixedProbe::new(true);

        let source = cascade.resolve("Contra (U).zip", &probe).await.unwrap();

        assert_eq!(source.mode, SourceMode::Local);
        assert_eq!(source.url, "/api/roms/Contra%20%28U%29.zip");
        assert_eq!(cascade.current_mode(), Some(SourceMode::Local));
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_cartridge_falls_back_to_remote() {
        let cascade = CartridgeCascade::new(Some(REMOTE));
        let probe = FixedProbe::new(false);
        assert_eq!(cascade.current_mode(), None);

        let source = cascade.resolve("Contra (U).zip", &probe).await.unwrap();

        assert_eq!(source.mode, SourceMode::Remote);
        assert_eq!(source.url, format!("{}/Contra%20%28U%29.zip", REMOTE));
        assert_eq!(cascade.current_mode(), Some(SourceMode::Remote));
    }

    #[tokio::test]
    async fn test_local_tier_is_probed_on_every_resolution() {
        // ARRANGE: the cartridge is missing locally, then appears
        let cascade = CartridgeCascade::new(Some(REMOTE));
        let probe = ScriptedProbe::new(vec![false, true]);

        // ACT
        let first = cascade.resolve("Contra (U).zip", &probe).await.unwrap();
        let second = cascade.resolve("Contra (U).zip", &probe).await.unwrap();

        // ASSERT
        assert_eq!(first.mode, SourceMode::Remote);
        assert_eq!(second.mode, SourceMode::Local);
        assert_eq!(cascade.current_mode(), Some(SourceMode::Local));
    }

    #[tokio::test]
    async fn test_local_miss_without_remote_recovers_once_present() {
        let cascade = CartridgeCascade::new(None);
        let probe = ScriptedProbe::new(vec![false, true]);

        assert!(cascade.resolve("Contra (U).zip", &probe).await.is_err());
        assert!(cascade.resolve("Contra (U).zip", &probe).await.is_ok());
    }

    #[tokio::test]
    async fn test_cartridge_without_remote_tier_fails_outright() {
        let cascade = CartridgeCascade::new(None);
        let probe = FixedProbe::new(false);

        let result = cascade.resolve("Contra (U).zip", &probe).await;

        assert_eq!(
            result,
            Err(CascadeError::Exhausted {
                asset: "Contra (U).zip".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_empty_cartridge_path_is_exhausted() {
        let cascade = CartridgeCascade::new(Some(REMOTE));
        let probe = FixedProbe::new(true);

        assert!(cascade.resolve(" / ", &probe).await.is_err());
        assert_eq!(probe.calls(), 0);
    }

    // ============================================================
    // PROBE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_library_probe_checks_resolver() {
        let dir = library_with("Shard1", "Known.nes");
        let resolver =
            LibraryResolver::new(LibraryLayout::new(dir.path(), vec!["Shard1".to_string()])).unwrap();
        let probe = LibraryProbe::new(resolver);

        let found = probe.probe("/api/roms/Known.nes").await.unwrap();
        assert_eq!(found.relative_path(), "Shard1/Known.nes");
        assert!(probe.probe("/api/roms/Missing.nes").await.is_none());
        assert!(probe.probe("/api/roms/..%2FKnown.nes").await.is_none());
        assert!(probe.probe("https://storage.example/roms/Known.nes").await.is_none());
    }

    #[tokio::test]
    async fn test_http_probe_against_live_server() {
        // ARRANGE: serve a real library on an ephemeral port
        let dir = library_with("Shard1", "Known.nes");
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        config.library = LibraryLayout::new(dir.path(), vec!["Shard1".to_string()]);
        let app = router(&Services::from_config(&config).unwrap());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let origin = format!("http://{}/", addr);
        let probe = HttpProbe::new(&origin);

        // ACT + ASSERT
        assert!(probe.probe("/api/roms/Known.nes").await.is_some());
        assert!(probe.probe("/api/roms/Missing.nes").await.is_none());
        assert!(HttpProbe::new("http://127.0.0.1:1").probe("/api/roms/Known.nes").await.is_none());

        // Through a public origin, hits carry no resolved file
        let resolver =
            LibraryResolver::new(LibraryLayout::new(dir.path(), vec!["Shard1".to_string()])).unwrap();
        let via_origin = LocalProbe::new(resolver, Some(origin.as_str()));
        assert_eq!(via_origin.probe("/api/roms/Known.nes").await, Some(None));
        assert_eq!(via_origin.probe("/api/roms/Missing.nes").await, None);
    }

    #[tokio::test]
    async fn test_local_probe_defaults_to_in_process() {
        let dir = library_with("Shard1", "Known.nes");
        let resolver =
            LibraryResolver::new(LibraryLayout::new(dir.path(), vec!["Shard1".to_string()])).unwrap();
        let probe = LocalProbe::new(resolver, None);

        let found = probe.probe("/api/roms/Known.nes").await.unwrap();

        assert!(matches!(probe, LocalProbe::Library(_)));
        assert_eq!(found.map(|asset| asset.name), Some("Known.nes".to_string()));
    }

    // ============================================================
    // ENDPOINT TESTS
    // ============================================================

    fn services(dir: &TempDir, remote: Option<&str>) -> Services {
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        config.library = LibraryLayout::new(dir.path(), vec!["Shard1".to_string()]);
        config.remote_storage_url = remote.map(str::to_string);
        Services::from_config(&config).unwrap()
    }

    async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_cover_endpoints_walk_and_exhaust() {
        let dir = library_with("Shard1", "Known.nes");
        let app = router(&services(&dir, None));

        // Candidates
        let (status, body) = send(&app, get("/api/covers/candidates?name=Contra")).await;
        assert_eq!(status, StatusCode::OK);
        let candidates: Vec<String> = serde_json::from_value(body["candidates"].clone()).unwrap();
        assert_eq!(body["name"], "Contra");
        assert!(!candidates.is_empty());

        // First candidate
        let (_, first) = send(&app, get("/api/covers/next?name=Contra")).await;
        assert_eq!(first["index"], 0);
        assert_eq!(first["url"], candidates[0].as_str());
        assert_eq!(first["priority"], true);

        // Report every candidate as broken
        for url in &candidates {
            let report = serde_json::json!({ "name": "Contra", "url": url });
            let (status, marked) = send(&app, post_json("/api/covers/failed", report)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(marked["newly_marked"], true);
        }

        let (status, exhausted) = send(&app, get("/api/covers/next?name=Contra")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(exhausted, serde_json::json!({ "exhausted": true }));
    }

    #[tokio::test]
    async fn test_cover_failure_for_foreign_url_is_refused() {
        let dir = library_with("Shard1", "Known.nes");
        let services = services(&dir, None);
        let app = router(&services);

        let report = serde_json::json!({ "name": "Contra", "url": "https://junk.example/1" });
        let (status, body) = send(&app, post_json("/api/covers/failed", report)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["url"], "https://junk.example/1");
        assert!(services.cover_failures.is_empty());

        // Known URLs count as candidates when they are part of the report
        let known = "https://cdn.example/contra.png";
        let report = serde_json::json!({ "name": "Contra", "known": known, "url": known });
        let (status, _) = send(&app, post_json("/api/covers/failed", report)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(services.cover_failures.has_failed(known));
    }

    #[tokio::test]
    async fn test_cover_next_resumes_after_index() {
        let dir = library_with("Shard1", "Known.nes");
        let app = router(&services(&dir, None));

        let (_, next) = send(&app, get("/api/covers/next?name=Contra&after=6")).await;

        assert_eq!(next["index"], 7);
        assert_eq!(next["priority"], false);
    }

    #[tokio::test]
    async fn test_cartridge_source_endpoint() {
        let dir = library_with("Shard1", "Known (U).nes");
        let app = router(&services(&dir, Some(REMOTE)));

        let (status, local) = send(&app, get("/api/cartridges/source/Known%20(U).nes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(local["mode"], "local");
        assert_eq!(local["url"], "/api/roms/Known%20%28U%29.nes");
        assert_eq!(local["location"], "Shard1/Known (U).nes");

        let (status, remote) = send(&app, get("/api/cartridges/source/Other.nes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(remote["mode"], "remote");
        assert_eq!(remote["url"], format!("{}/Other.nes", REMOTE));
        assert!(remote.get("location").is_none());
    }

    #[tokio::test]
    async fn test_cartridge_source_unavailable_without_remote() {
        let dir = library_with("Shard1", "Known.nes");
        let app = router(&services(&dir, None));

        let (status, body) = send(&app, get("/api/cartridges/source/Other.nes")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["path"], "Other.nes");
    }

    #[tokio::test]
    async fn test_cartridge_source_picks_up_files_added_later() {
        let dir = library_with("Shard1", "Known.nes");
        let app = router(&services(&dir, Some(REMOTE)));

        let (_, before) = send(&app, get("/api/cartridges/source/Later.nes")).await;
        assert_eq!(before["mode"], "remote");

        fs::write(dir.path().join("Shard1/Later.nes"), b"NES\x1a").unwrap();

        let (status, after) = send(&app, get("/api/cartridges/source/Later.nes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(after["mode"], "local");
        assert_eq!(after["location"], "Shard1/Later.nes");
    }

    #[tokio::test]
    async fn test_cartridge_sources_cannot_be_reported_dead() {
        let dir = library_with("Shard1", "Known.nes");
        let app = router(&services(&dir, Some(REMOTE)));

        let report = serde_json::json!({ "url": format!("{}/Other.nes", REMOTE) });
        let response = app
            .clone()
            .oneshot(post_json("/api/cartridges/failed", report))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (status, remote) = send(&app, get("/api/cartridges/source/Other.nes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(remote["mode"], "remote");
    }
}
