//! Infrastructure implementation of the `HttpDownloader` port.
//!
//! Transfers stream into `<dest>.partial` and are renamed into place only
//! once complete, so an interrupted download never looks finished.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::HttpDownloader;

const USER_AGENT: &str = concat!("sitebox-cli/", env!("CARGO_PKG_VERSION"));
const FILE_SCHEME: &str = "file://";

/// Blocking `ureq` client run on the tokio blocking pool.
pub struct UreqDownloader {
    quiet: bool,
}

impl UreqDownloader {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl HttpDownloader for UreqDownloader {
    async fn download(&self, dest: &Path, url: &str, timeout: Duration) -> Result<()> {
        let dest = dest.to_path_buf();
        let url = url.to_string();
        let quiet = self.quiet;
        tokio::task::spawn_blocking(move || download_blocking(&url, &dest, timeout, quiet))
            .await
            .context("download task panicked")?
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut s = dest.as_os_str().to_owned();
    s.push(".partial");
    PathBuf::from(s)
}

fn download_blocking(url: &str, dest: &Path, timeout: Duration, quiet: bool) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let partial = partial_path(dest);

    // Local mirrors: `file:///srv/mirror/phpMyAdmin.zip`.
    if let Some(local) = url.strip_prefix(FILE_SCHEME) {
        std::fs::copy(local, &partial).with_context(|| format!("copying {local}"))?;
        return std::fs::rename(&partial, dest).context("finalizing download");
    }

    let agent = ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build();
    let response = match agent.get(url).call() {
        Ok(r) => r,
        Err(ureq::Error::Status(code, _)) => anyhow::bail!("HTTP {code}"),
        Err(e) => anyhow::bail!("request failed: {e}"),
    };

    let total = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok());
    let pb = make_progress_bar(quiet, total);

    let mut file = File::create(&partial)
        .with_context(|| format!("creating {}", partial.display()))?;
    let mut reader = response.into_reader();
    let mut buf = vec![0u8; 64 * 1024];
    let result = (|| -> Result<()> {
        loop {
            let n = reader.read(&mut buf).context("download interrupted")?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).context("writing download")?;
            pb.inc(n as u64);
        }
        file.flush().context("flushing download")
    })();
    pb.finish_and_clear();
    drop(file);

    if let Err(e) = result {
        std::fs::remove_file(&partial).ok();
        return Err(e);
    }
    std::fs::rename(&partial, dest).context("finalizing download")?;
    tracing::debug!(url, dest = %dest.display(), "download complete");
    Ok(())
}

fn make_progress_bar(quiet: bool, total: Option<u64>) -> indicatif::ProgressBar {
    if quiet {
        return indicatif::ProgressBar::hidden();
    }
    if let Some(t) = total {
        let pb = indicatif::ProgressBar::new(t);
        pb.set_style(
            indicatif::ProgressStyle::default_bar()
                .template("  [{bar:40}] {bytes}/{total_bytes}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    } else {
        indicatif::ProgressBar::new_spinner()
    }
}
