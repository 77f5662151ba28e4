//! Tests for the fetch-extract-relocate pipeline.

#![allow(clippy::expect_used)]

use std::time::Duration;

use sitebox_cli::application::services::pipeline::FetchPipeline;
use sitebox_cli::domain::ToolError;
use sitebox_cli::infra::archive::LocalArchiveExtractor;
use sitebox_cli::infra::fs::LocalToolFs;

use crate::mocks::{FixtureDownloader, zip_bytes};

const URL: &str = "https://dl.test/tool.zip";

struct Scratch {
    dir: tempfile::TempDir,
}

impl Scratch {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn pipeline<'a>(
        &'a self,
        http: &'a FixtureDownloader,
    ) -> FetchPipeline<'a, LocalToolFs, FixtureDownloader, LocalArchiveExtractor> {
        FetchPipeline::new(
            &LocalToolFs,
            http,
            &LocalArchiveExtractor,
            self.dir.path(),
            Duration::from_secs(5),
        )
    }
}

fn serving(entries: &[(&str, &str)]) -> FixtureDownloader {
    FixtureDownloader::default().with(URL, zip_bytes(entries))
}

fn extraction_reason(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ToolError>() {
        Some(ToolError::Extraction { reason, .. }) => reason.clone(),
        other => panic!("expected Extraction error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_root_returns_single_top_level_directory() {
    let scratch = Scratch::new();
    let http = serving(&[("app/index.php", "<?php"), ("app/lib/util.php", "<?php")]);
    let pipeline = scratch.pipeline(&http);

    let root = pipeline.fetch_root("tool", URL).await.expect("fetch");

    assert_eq!(root.file_name().and_then(|n| n.to_str()), Some("app"));
    assert!(root.join("lib/util.php").is_file());
}

#[tokio::test]
async fn relocated_root_lands_at_target() {
    let scratch = Scratch::new();
    let http = serving(&[("app/index.php", "<?php // app")]);
    let pipeline = scratch.pipeline(&http);
    let target = scratch.dir.path().join("tools").join("tool");

    let root = pipeline.fetch_root("tool", URL).await.expect("fetch");
    pipeline.relocate(&root, &target).expect("relocate");
    pipeline.cleanup("tool").expect("cleanup");

    assert_eq!(
        std::fs::read_to_string(target.join("index.php")).expect("read"),
        "<?php // app"
    );
    assert!(!pipeline.scratch_for("tool").exists());
}

#[tokio::test]
async fn relocate_replaces_stale_target() {
    let scratch = Scratch::new();
    let http = serving(&[("app/new.php", "<?php")]);
    let pipeline = scratch.pipeline(&http);
    let target = scratch.dir.path().join("tools").join("tool");
    std::fs::create_dir_all(&target).expect("stale target");
    std::fs::write(target.join("old.php"), "stale").expect("stale file");

    let root = pipeline.fetch_root("tool", URL).await.expect("fetch");
    pipeline.relocate(&root, &target).expect("relocate");

    assert!(target.join("new.php").is_file());
    assert!(!target.join("old.php").exists(), "stale files removed");
}

#[tokio::test]
async fn macos_metadata_and_hidden_entries_are_ignored() {
    let scratch = Scratch::new();
    let http = serving(&[
        ("__MACOSX/._app", ""),
        (".DS_Store", ""),
        ("app/index.php", "<?php"),
    ]);
    let pipeline = scratch.pipeline(&http);

    let root = pipeline.fetch_root("tool", URL).await.expect("fetch");

    assert!(root.ends_with("app"));
}

#[tokio::test]
async fn prepare_drops_stale_scratch_contents() {
    let scratch = Scratch::new();
    let http = serving(&[("app/index.php", "<?php")]);
    let pipeline = scratch.pipeline(&http);
    let stale = pipeline.scratch_for("tool").join("extract").join("leftover");
    std::fs::create_dir_all(&stale).expect("stale dir");

    let root = pipeline.fetch_root("tool", URL).await.expect("stale dir must not count as a root");

    assert!(root.ends_with("app"));
    assert!(!stale.exists());
}

#[tokio::test]
async fn empty_archive_is_rejected() {
    let scratch = Scratch::new();
    let http = serving(&[("__MACOSX/", ""), (".hidden", "")]);
    let pipeline = scratch.pipeline(&http);

    let err = pipeline.fetch_root("tool", URL).await.expect_err("only metadata");

    assert!(extraction_reason(&err).contains("empty"));
}

#[tokio::test]
async fn loose_file_archive_is_rejected() {
    let scratch = Scratch::new();
    let http = serving(&[("index.php", "<?php")]);
    let pipeline = scratch.pipeline(&http);

    let err = pipeline.fetch_root("tool", URL).await.expect_err("no root dir");

    assert!(extraction_reason(&err).contains("no top-level directory"));
}

#[tokio::test]
async fn several_roots_are_listed_in_the_error() {
    let scratch = Scratch::new();
    let http = serving(&[("a/x.php", ""), ("b/y.php", "")]);
    let pipeline = scratch.pipeline(&http);

    let err = pipeline.fetch_root("tool", URL).await.expect_err("two roots");

    let reason = extraction_reason(&err);
    assert!(reason.contains("found 2"), "reason: {reason}");
    assert!(reason.contains("a, b"), "reason: {reason}");
}

#[tokio::test]
async fn non_archive_body_is_an_extraction_error() {
    let scratch = Scratch::new();
    let http = FixtureDownloader::default().with(URL, b"<html>not found</html>".to_vec());
    let pipeline = scratch.pipeline(&http);

    let err = pipeline.fetch_root("tool", URL).await.expect_err("html page");

    assert!(extraction_reason(&err).contains("unsupported archive format"));
}

#[tokio::test]
async fn download_failure_is_a_network_error() {
    let scratch = Scratch::new();
    let http = FixtureDownloader::default();
    let pipeline = scratch.pipeline(&http);

    let err = pipeline.fetch_file("tool", URL).await.expect_err("404");

    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::Network { url, .. }) if url == URL
    ));
}

#[tokio::test]
async fn fetch_file_stores_body_in_scratch() {
    let scratch = Scratch::new();
    let http = FixtureDownloader::default().with(URL, b"<?php // single".to_vec());
    let pipeline = scratch.pipeline(&http);

    let file = pipeline.fetch_file("tool", URL).await.expect("fetch");

    assert!(file.starts_with(pipeline.scratch_for("tool")));
    assert_eq!(std::fs::read(&file).expect("read"), b"<?php // single");
}
