//! Infrastructure implementation of the `ContainerRuntime` port over the
//! `docker compose` CLI.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::{CommandRunner, ContainerRuntime};
use crate::domain::site::BASE_COMPOSE_FILE;

const DOCKER: &str = "docker";

/// `docker compose` driven through a [`CommandRunner`].
pub struct DockerCompose<R> {
    runner: R,
    /// Upper bound for `up`; exceeding it fails the call.
    up_timeout: Duration,
}

impl<R: CommandRunner> DockerCompose<R> {
    pub fn new(runner: R, up_timeout: Duration) -> Self {
        Self { runner, up_timeout }
    }
}

#[derive(Deserialize)]
struct Mount {
    #[serde(rename = "Destination")]
    destination: String,
}

/// Leading `docker compose` arguments selecting the project and its files.
#[must_use]
pub fn compose_args(working_dir: &Path, files: &[&str]) -> Vec<String> {
    let mut args = vec![
        "compose".to_string(),
        "--project-directory".to_string(),
        working_dir.display().to_string(),
    ];
    for file in files {
        args.push("-f".to_string());
        args.push(working_dir.join(file).display().to_string());
    }
    args
}

fn check_success(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("{program} exited with {}: {}", output.status, stderr.trim())
}

/// Whether the `docker inspect` mounts JSON lists `container_path`.
///
/// # Errors
///
/// Returns an error if the inspect output is not a mounts array.
pub fn mounts_include(mounts_json: &str, container_path: &str) -> Result<bool> {
    let mounts: Vec<Mount> =
        serde_json::from_str(mounts_json.trim()).context("parsing container mounts")?;
    let wanted = container_path.trim_end_matches('/');
    Ok(mounts
        .iter()
        .any(|m| m.destination.trim_end_matches('/') == wanted))
}

impl<R: CommandRunner> ContainerRuntime for DockerCompose<R> {
    async fn compose_services(&self, working_dir: &Path) -> Result<Vec<String>> {
        let mut args = compose_args(working_dir, &[BASE_COMPOSE_FILE]);
        args.extend(["config".to_string(), "--services".to_string()]);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.runner.run(DOCKER, &argv).await?;
        check_success("docker compose config", &output)?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn compose_up(
        &self,
        working_dir: &Path,
        files: &[&str],
        services: &[&str],
    ) -> Result<()> {
        let mut args = compose_args(working_dir, files);
        args.extend(["up".to_string(), "-d".to_string()]);
        args.extend(services.iter().map(|s| (*s).to_string()));
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run_with_timeout(DOCKER, &argv, self.up_timeout)
            .await?;
        check_success("docker compose up", &output)
    }

    async fn mount_active(
        &self,
        working_dir: &Path,
        service: &str,
        container_path: &str,
    ) -> Result<bool> {
        let mut args = compose_args(working_dir, &[BASE_COMPOSE_FILE]);
        args.extend(["ps".to_string(), "-q".to_string(), service.to_string()]);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.runner.run(DOCKER, &argv).await?;
        check_success("docker compose ps", &output)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(container) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
            anyhow::bail!("service '{service}' is not running");
        };

        let output = self
            .runner
            .run(DOCKER, &["inspect", "--format", "{{json .Mounts}}", container])
            .await?;
        check_success("docker inspect", &output)?;
        mounts_include(&String::from_utf8_lossy(&output.stdout), container_path)
    }
}
