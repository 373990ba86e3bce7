use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Device status ───────────────────────────────────────────────

/// One Android device as seen over ADB.
///
/// Detail fields the device did not report are `None`, never a zero
/// stand-in, so consumers can tell "measured 0" from "unknown". An
/// offline device carries no detail structures at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub id: String,
    pub name: String,
    /// "android"
    #[serde(rename = "type")]
    pub kind: String,
    /// "adb-ota"
    pub connection: String,
    pub ip: Option<String>,
    pub online: bool,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(rename = "android")]
    pub android_version: Option<String>,
    pub serial: Option<String>,
    pub battery: Option<BatteryInfo>,
    pub storage: Option<StorageInfo>,
    pub network: Option<NetworkInfo>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryInfo {
    /// 0–100, absent when `dumpsys battery` did not report it.
    pub level: Option<u8>,
    pub status: Option<String>,
    /// Degrees Celsius (the device reports tenths).
    pub temperature: Option<f64>,
    pub health: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageInfo {
    /// 1K blocks, straight from `df /data`.
    pub total: Option<u64>,
    pub used: Option<u64>,
    pub available: Option<u64>,
    /// 0–100, parsed from the `Use%` column.
    pub percent: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub wifi_ip: Option<String>,
    pub wifi_ssid: Option<String>,
}

// ── Host status ─────────────────────────────────────────────────

/// One remote server reached over SSH.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatus {
    /// Address the SSH channel targets.
    pub host: String,
    pub name: String,
    /// "server"
    #[serde(rename = "type")]
    pub kind: String,
    pub containers: ContainerReport,
    pub public_services: Vec<PublicServiceCheck>,
    pub timestamp: DateTime<Utc>,
}

/// Container listing, or the connection-failure marker that takes its
/// place when the SSH channel could not be established. Untagged so the
/// wire shape stays `{total, running, containers}` vs `{error}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContainerReport {
    Summary(ContainerSummary),
    Unavailable { error: String },
}

impl ContainerReport {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ContainerReport::Unavailable { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub total: usize,
    pub running: usize,
    pub containers: Vec<ContainerInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub name: String,
    /// Raw status text from `docker ps` (e.g. "Up 3 days").
    pub status: String,
    pub running: bool,
}

/// A port the host is expected to expose publicly. The health URL is
/// recorded but not probed yet, so `status` stays `Unknown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicServiceCheck {
    pub name: String,
    pub port: u16,
    pub url: Option<String>,
    pub status: CheckStatus,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

// ── Portfolio status ────────────────────────────────────────────

/// Exchange account snapshot. On a failed upstream call the numeric
/// fields are zeroed and `error` is set; consumers key off the marker,
/// not the zeros.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStatus {
    pub address: String,
    pub balance: f64,
    pub pnl: f64,
    pub margin_used: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PortfolioStatus {
    /// Zeroed, error-marked record for a failed exchange call.
    pub fn failed(address: &str, error: &impl ToString) -> Self {
        Self {
            address: address.to_owned(),
            balance: 0.0,
            pnl: 0.0,
            margin_used: 0.0,
            timestamp: Utc::now(),
            error: Some(error.to_string()),
        }
    }
}

// ── Derived events ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    DeviceOffline,
    LowBattery,
    StorageFull,
    ServiceError,
    ContainersDegraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One threshold alert. Recomputed from scratch every cycle; nothing is
/// persisted or diffed against earlier cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatEvent {
    #[serde(rename = "type")]
    pub kind: ThreatKind,
    pub severity: Severity,
    pub message: String,
    /// Which entity produced it (device id or host name).
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    Profit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityEvent {
    #[serde(rename = "type")]
    pub kind: OpportunityKind,
    pub source: String,
    pub message: String,
    pub priority: Severity,
}

// ── Snapshot ────────────────────────────────────────────────────

/// The aggregated view of every source at one point in time. Built by
/// the aggregator, then handed to the store whole; never mutated in
/// place. `Default` is the well-defined pre-first-cycle state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub devices: Vec<DeviceStatus>,
    pub services: Vec<HostStatus>,
    pub threats: Vec<ThreatEvent>,
    pub opportunities: Vec<OpportunityEvent>,
    pub trading: Option<PortfolioStatus>,
    pub last_update: Option<DateTime<Utc>>,
}
