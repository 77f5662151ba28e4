//! Tests for the `tools_install` application service.
//!
//! Runs the installer against a real temp tools root with a fixture
//! downloader, so every assertion is on the layout a web server would see.

#![allow(clippy::expect_used)]

use sitebox_cli::application::services::tools_install::{InstallReport, install_tools};
use sitebox_cli::domain::tool::PREDIS_URL;
use sitebox_cli::domain::{ManifestError, ToolError};
use sitebox_cli::infra::archive::LocalArchiveExtractor;
use sitebox_cli::infra::fs::LocalToolFs;

use crate::mocks::{
    CountingExtractor, CountingFs, FaultyFs, Fixture, FixtureDownloader, NoopLocks, NoopReporter,
    zip_bytes,
};

const PMA_URL_TEMPLATE: &str = "https://dl.test/phpMyAdmin-{version}-all-languages.zip";
const PMA_URL: &str = "https://dl.test/phpMyAdmin-5.2.2-all-languages.zip";
const REDIS_URL: &str = "https://dl.test/phpRedisAdmin-1.19.1.zip";
const OPCACHE_URL: &str = "https://dl.test/opcache-gui/index.php";

fn full_manifest() -> String {
    format!(
        r#"{{
  "index": {{}},
  "phpinfo": {{}},
  "pma": {{ "url": "{PMA_URL_TEMPLATE}", "version": "5.2.2" }},
  "phpredisadmin": {{ "url": "{REDIS_URL}" }},
  "opcache": {{ "url": "{OPCACHE_URL}" }}
}}"#
    )
}

async fn install_local(fx: &Fixture, http: &FixtureDownloader) -> anyhow::Result<InstallReport> {
    let tools = fx.tools(&LocalToolFs, http, &LocalArchiveExtractor);
    install_tools(&tools, &NoopLocks::default(), &NoopReporter).await
}

fn full_downloader() -> FixtureDownloader {
    FixtureDownloader::default()
        .with(
            PMA_URL,
            zip_bytes(&[
                ("phpMyAdmin-5.2.2-all-languages/", ""),
                ("phpMyAdmin-5.2.2-all-languages/index.php", "<?php // pma"),
            ]),
        )
        .with(
            REDIS_URL,
            zip_bytes(&[
                ("phpRedisAdmin-1.19.1/index.php", "<?php // redis"),
                ("phpRedisAdmin-1.19.1/includes/common.inc.php", "<?php"),
            ]),
        )
        .with(
            PREDIS_URL,
            zip_bytes(&[("predis-1.1.10/autoload.php", "<?php // predis")]),
        )
        .with(OPCACHE_URL, b"<?php // opcache gui".to_vec())
}

// ── Happy paths ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn install_template_tools_writes_two_pages() {
    let fx = Fixture::new(r#"{"index":{},"phpinfo":{}}"#);
    let http = FixtureDownloader::default();
    let tools = fx.tools(&LocalToolFs, &http, &LocalArchiveExtractor);

    let report = install_tools(&tools, &NoopLocks::default(), &NoopReporter)
        .await
        .expect("install");

    assert_eq!(report.installed, vec!["index", "phpinfo"]);
    assert!(report.skipped.is_empty());
    let index = std::fs::read_to_string(fx.root().join("index.php")).expect("index.php");
    assert!(index.contains("/admin-tools"), "url path rendered into index");
    assert!(!index.contains("{{"), "no unrendered placeholders");
    assert!(fx.root().join("phpinfo.php").is_file());
    assert!(!fx.root().join("index.php.partial").exists());
    assert!(!fx.root().join("phpinfo.php.partial").exists());
    assert!(http.calls().is_empty(), "template tools never download");
}

#[tokio::test]
async fn second_install_performs_no_writes() {
    let fx = Fixture::new(r#"{"index":{},"phpinfo":{}}"#);
    let http = FixtureDownloader::default();
    let locks = NoopLocks::default();
    install_tools(&fx.tools(&LocalToolFs, &http, &LocalArchiveExtractor), &locks, &NoopReporter)
        .await
        .expect("first install");

    let fs = CountingFs::default();
    let report = install_tools(&fx.tools(&fs, &http, &LocalArchiveExtractor), &locks, &NoopReporter)
        .await
        .expect("second install");

    assert!(report.installed.is_empty());
    assert_eq!(report.skipped, vec!["index", "phpinfo"]);
    assert_eq!(fs.writes(), 0, "idempotent run must not touch the filesystem");
    assert_eq!(*locks.install_calls.lock().expect("lock"), 2);
}

#[tokio::test]
async fn install_all_tools_lays_out_every_artifact() {
    let fx = Fixture::new(&full_manifest());
    let http = full_downloader();
    let tools = fx.tools(&LocalToolFs, &http, &LocalArchiveExtractor);

    let report = install_tools(&tools, &NoopLocks::default(), &NoopReporter)
        .await
        .expect("install");

    assert_eq!(
        report.installed,
        vec!["index", "phpinfo", "pma", "phpredisadmin", "opcache"]
    );
    let root = fx.root();
    assert!(root.join("index.php").is_file());
    assert!(root.join("phpinfo.php").is_file());
    assert!(root.join("pma/index.php").is_file(), "archive root relocated");
    let pma_config = std::fs::read_to_string(root.join("pma/config.inc.php")).expect("pma config");
    assert!(pma_config.contains("blowfish_secret"));
    assert!(!pma_config.contains("{{blowfish_secret}}"));
    assert!(root.join("phpredisadmin/index.php").is_file());
    assert!(root.join("phpredisadmin/vendor/predis/autoload.php").is_file());
    assert!(root.join("phpredisadmin/includes/config.inc.php").is_file());
    assert_eq!(
        std::fs::read_to_string(root.join("opcache-gui.php")).expect("opcache"),
        "<?php // opcache gui"
    );
    let leftovers: Vec<_> = std::fs::read_dir(&fx.config.scratch_dir)
        .map(|rd| rd.flatten().collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "scratch should be cleaned: {leftovers:?}");
}

#[tokio::test]
async fn second_full_install_skips_network_and_extraction() {
    let fx = Fixture::new(&full_manifest());
    let http = full_downloader();
    let extractor = CountingExtractor::default();
    let tools = fx.tools(&LocalToolFs, &http, &extractor);
    install_tools(&tools, &NoopLocks::default(), &NoopReporter)
        .await
        .expect("first install");
    let downloads = http.calls().len();
    let extractions = extractor.count();
    assert_eq!(downloads, 4, "pma, phpredisadmin, predis, opcache");
    assert_eq!(extractions, 3);

    let report = install_tools(&tools, &NoopLocks::default(), &NoopReporter)
        .await
        .expect("second install");

    assert_eq!(report.skipped.len(), 5);
    assert_eq!(http.calls().len(), downloads, "no new downloads");
    assert_eq!(extractor.count(), extractions, "no new extractions");
}

#[tokio::test]
async fn pma_secret_differs_between_installs() {
    let first = Fixture::new(&full_manifest());
    let second = Fixture::new(&full_manifest());
    let http = full_downloader();
    for fx in [&first, &second] {
        install_local(fx, &http).await.expect("install");
    }
    let a = std::fs::read_to_string(first.root().join("pma/config.inc.php")).expect("a");
    let b = std::fs::read_to_string(second.root().join("pma/config.inc.php")).expect("b");
    assert_ne!(a, b, "each install generates its own secret");
}

// ── Manifest failures ─────────────────────────────────────────────────────────

async fn manifest_failure(manifest: &str) -> (Fixture, ManifestError) {
    let fx = Fixture::new(manifest);
    let http = FixtureDownloader::default();
    let err = install_local(&fx, &http)
        .await
        .expect_err("manifest should be rejected");
    let manifest_err = err
        .downcast::<ManifestError>()
        .expect("error should be a ManifestError");
    (fx, manifest_err)
}

fn tools_root_is_empty(fx: &Fixture) -> bool {
    std::fs::read_dir(fx.root())
        .map(|mut rd| rd.next().is_none())
        .unwrap_or(true)
}

#[tokio::test]
async fn blank_manifest_is_a_read_error() {
    let (fx, err) = manifest_failure("   \n").await;
    assert!(matches!(err, ManifestError::Read { .. }), "got {err:?}");
    assert!(tools_root_is_empty(&fx));
}

#[tokio::test]
async fn non_object_manifest_is_a_parse_error() {
    let (fx, err) = manifest_failure(r#"["index"]"#).await;
    assert!(matches!(err, ManifestError::Parse { .. }), "got {err:?}");
    assert!(tools_root_is_empty(&fx));
}

#[tokio::test]
async fn invalid_json_manifest_is_a_parse_error() {
    let (fx, err) = manifest_failure(r#"{"index": "#).await;
    assert!(matches!(err, ManifestError::Parse { .. }), "got {err:?}");
    assert!(tools_root_is_empty(&fx));
}

#[tokio::test]
async fn empty_object_manifest_is_rejected() {
    let (fx, err) = manifest_failure("{}").await;
    assert!(matches!(err, ManifestError::Empty { .. }), "got {err:?}");
    assert!(tools_root_is_empty(&fx));
}

#[tokio::test]
async fn non_json_manifest_path_is_a_format_error() {
    let mut fx = Fixture::new("{}");
    let yaml = fx.dir.path().join("admin-tools.yaml");
    std::fs::write(&yaml, "index: {}\n").expect("write yaml manifest");
    fx.config.manifest_path = yaml;
    let http = FixtureDownloader::default();

    let err = install_local(&fx, &http)
        .await
        .expect_err("yaml manifest");

    assert!(matches!(
        err.downcast_ref::<ManifestError>(),
        Some(ManifestError::Format { .. })
    ));
    assert!(tools_root_is_empty(&fx));
}

#[tokio::test]
async fn missing_manifest_is_a_read_error() {
    let fx = Fixture::new("{}");
    std::fs::remove_file(&fx.config.manifest_path).expect("remove manifest");
    let http = FixtureDownloader::default();

    let err = install_local(&fx, &http)
        .await
        .expect_err("missing manifest");

    assert!(matches!(
        err.downcast_ref::<ManifestError>(),
        Some(ManifestError::Read { .. })
    ));
}

// ── Tool failures ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_tool_aborts_before_any_install() {
    let fx = Fixture::new(r#"{"index":{},"adminer":{"url":"https://dl.test/adminer.php"}}"#);
    let http = FixtureDownloader::default();

    let err = install_local(&fx, &http)
        .await
        .expect_err("unknown tool");

    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::UnknownTool(id)) if id == "adminer"
    ));
    assert!(!fx.root().join("index.php").exists(), "nothing installed");
    assert!(http.calls().is_empty());
}

#[tokio::test]
async fn network_failure_keeps_earlier_tools() {
    let fx = Fixture::new(
        r#"{"index":{},"opcache":{"url":"https://dl.test/gone.php"},"phpinfo":{}}"#,
    );
    let http = FixtureDownloader::default();

    let err = install_local(&fx, &http)
        .await
        .expect_err("download fails");

    match err.downcast_ref::<ToolError>() {
        Some(ToolError::Network { url, reason }) => {
            assert_eq!(url, "https://dl.test/gone.php");
            assert!(reason.contains("404"), "reason: {reason}");
        }
        other => panic!("expected Network error, got {other:?}"),
    }
    assert!(format!("{err:#}").contains("installing admin tool 'opcache'"));
    assert!(fx.root().join("index.php").is_file(), "earlier tool survives");
    assert!(!fx.root().join("opcache-gui.php").exists());
    assert!(!fx.root().join("phpinfo.php").exists(), "run stops at first failure");
}

#[tokio::test]
async fn page_that_cannot_be_moved_into_place_is_not_installed() {
    let fx = Fixture::new(r#"{"phpinfo":{},"index":{}}"#);
    let http = FixtureDownloader::default();
    let fs = FaultyFs::default().locked_target("index.php");

    let tools = fx.tools(&fs, &http, &LocalArchiveExtractor);
    let err = install_tools(&tools, &NoopLocks::default(), &NoopReporter)
        .await
        .expect_err("rename fails");

    assert!(format!("{err:#}").contains("installing admin tool 'index'"), "got {err:#}");
    assert!(fx.root().join("phpinfo.php").is_file(), "earlier page survives");
    assert!(!fx.root().join("index.php").exists());
    assert!(!fx.root().join("index.php.partial").exists(), "partial page cleaned up");

    let report = install_local(&fx, &http).await.expect("retry");
    assert_eq!(report.installed, vec!["index"]);
    assert_eq!(report.skipped, vec!["phpinfo"]);
}

#[tokio::test]
async fn multi_root_archive_is_an_extraction_error() {
    let fx = Fixture::new(&format!(r#"{{"pma":{{"url":"{PMA_URL}"}}}}"#));
    let http = FixtureDownloader::default().with(
        PMA_URL,
        zip_bytes(&[("one/index.php", "<?php"), ("two/index.php", "<?php")]),
    );

    let err = install_local(&fx, &http)
        .await
        .expect_err("two roots");

    match err.downcast_ref::<ToolError>() {
        Some(ToolError::Extraction { reason, .. }) => {
            assert!(reason.contains("exactly one"), "reason: {reason}");
        }
        other => panic!("expected Extraction error, got {other:?}"),
    }
    assert!(!fx.root().join("pma").exists(), "no partial artifact");
}

#[tokio::test]
async fn failed_predis_fetch_leaves_no_cache_admin_artifact() {
    let fx = Fixture::new(&format!(r#"{{"phpredisadmin":{{"url":"{REDIS_URL}"}}}}"#));
    let http = FixtureDownloader::default().with(
        REDIS_URL,
        zip_bytes(&[("phpRedisAdmin-1.19.1/index.php", "<?php")]),
    );

    let err = install_local(&fx, &http)
        .await
        .expect_err("predis missing");

    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::Network { url, .. }) if url == PREDIS_URL
    ));
    assert!(
        !fx.root().join("phpredisadmin").exists(),
        "probe must not see a half-configured bundle"
    );
}
