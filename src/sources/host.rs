use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::HostConfig;
use crate::error::FetchError;
use crate::models::{
    CheckStatus, ContainerInfo, ContainerReport, ContainerSummary, HostStatus,
    PublicServiceCheck,
};
use crate::sources::CommandRunner;

/// Overall budget for the SSH round trip; connection establishment gets
/// its own 5 s cap via `ConnectTimeout`.
const SSH_TIMEOUT: Duration = Duration::from_secs(15);

const DOCKER_PS: &str = "docker ps --format '{{.Names}}:{{.Status}}'";

/// Fetches the container listing from one server over SSH. Every call
/// opens a fresh channel; nothing is kept between cycles.
pub struct HostAdapter {
    cfg: HostConfig,
    target: String,
    runner: Arc<dyn CommandRunner>,
}

impl HostAdapter {
    pub fn new(cfg: HostConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let target = format!("{}@{}", cfg.user, cfg.host);
        Self {
            cfg,
            target,
            runner,
        }
    }

    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    pub async fn fetch_status(&self) -> Result<HostStatus, FetchError> {
        let out = self
            .runner
            .run(
                "ssh",
                &[
                    "-o",
                    "ConnectTimeout=5",
                    "-o",
                    "StrictHostKeyChecking=no",
                    &self.target,
                    DOCKER_PS,
                ],
                SSH_TIMEOUT,
            )
            .await?;

        if !out.success() {
            let stderr = out.stderr.trim();
            let detail = if stderr.is_empty() {
                format!("ssh to {} exited with {:?}", self.target, out.code)
            } else {
                stderr.to_owned()
            };
            return Err(FetchError::Unreachable(detail));
        }

        let summary = parse_container_listing(&out.stdout);
        Ok(self.status_with(ContainerReport::Summary(summary)))
    }

    /// The record stored when the SSH channel could not be established:
    /// the failure marker in the summary's place, public-service list
    /// still populated.
    pub fn unavailable_status(&self, error: &str) -> HostStatus {
        self.status_with(ContainerReport::Unavailable {
            error: error.to_owned(),
        })
    }

    fn status_with(&self, containers: ContainerReport) -> HostStatus {
        HostStatus {
            host: self.cfg.host.clone(),
            name: self.cfg.name.clone(),
            kind: "server".into(),
            containers,
            public_services: self.public_services(),
            timestamp: Utc::now(),
        }
    }

    /// The ports this host is expected to expose. Real health probes are
    /// not wired up, so every entry reports `unknown`.
    fn public_services(&self) -> Vec<PublicServiceCheck> {
        let host = &self.cfg.host;
        let entries: [(&str, u16, Option<String>); 5] = [
            ("gateway", 18789, Some(format!("http://{host}:18789/health"))),
            ("keycloak", 8080, Some(format!("http://{host}:8080/health"))),
            ("kibana", 5601, Some(format!("http://{host}:5601/api/status"))),
            ("kafka", 9092, None),
            ("subservice", 5005, Some(format!("http://{host}:5005/health"))),
        ];

        let now = Utc::now();
        entries
            .into_iter()
            .map(|(name, port, url)| PublicServiceCheck {
                name: name.to_owned(),
                port,
                url,
                status: CheckStatus::Unknown,
                checked_at: now,
            })
            .collect()
    }
}

/// Parse the newline-delimited `name:status` listing from `docker ps`.
/// A container is running iff its status text contains "Up"; a missing
/// status field becomes "unknown".
fn parse_container_listing(output: &str) -> ContainerSummary {
    let containers: Vec<ContainerInfo> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (name, status) = match line.split_once(':') {
                Some((name, status)) if !status.is_empty() => (name, status),
                Some((name, _)) => (name, "unknown"),
                None => (line, "unknown"),
            };
            ContainerInfo {
                name: name.to_owned(),
                status: status.to_owned(),
                running: status.contains("Up"),
            }
        })
        .collect();

    let running = containers.iter().filter(|c| c.running).count();
    ContainerSummary {
        total: containers.len(),
        running,
        containers,
    }
}
