use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use crate::config::DeviceConfig;
use crate::error::FetchError;
use crate::models::{BatteryInfo, DeviceStatus, NetworkInfo, StorageInfo};
use crate::sources::CommandRunner;

/// Per-invocation timeout for adb commands.
const ADB_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches status from one Android device over `adb` at a fixed TCP
/// endpoint.
///
/// The reachability probe gates the whole fetch; after it passes, each
/// detail command fails independently and degrades to absent fields.
pub struct DeviceAdapter {
    cfg: DeviceConfig,
    endpoint: String,
    runner: Arc<dyn CommandRunner>,
}

impl DeviceAdapter {
    pub fn new(cfg: DeviceConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let endpoint = format!("{}:{}", cfg.host, cfg.port);
        Self {
            cfg,
            endpoint,
            runner,
        }
    }

    pub fn id(&self) -> &str {
        &self.cfg.id
    }

    /// Probe the device, then scrape identity, battery, storage and
    /// network details.
    pub async fn fetch_status(&self) -> Result<DeviceStatus, FetchError> {
        self.probe().await?;

        let model = self.shell(&["getprop", "ro.product.model"]).await;
        let manufacturer = self.shell(&["getprop", "ro.product.manufacturer"]).await;
        let android_version = self.shell(&["getprop", "ro.build.version.release"]).await;
        let serial = self.shell(&["getprop", "ro.serialno"]).await;

        let battery = self
            .shell(&["dumpsys", "battery"])
            .await
            .map(|out| parse_battery(&out));
        let storage = self
            .shell(&["df", "/data"])
            .await
            .and_then(|out| parse_storage(&out));

        let wifi_ip = self
            .shell(&["ifconfig", "wlan0"])
            .await
            .and_then(|out| parse_wifi_ip(&out));
        let wifi_ssid = self
            .shell(&["dumpsys", "wifi"])
            .await
            .and_then(|out| parse_wifi_ssid(&out));
        let network = (wifi_ip.is_some() || wifi_ssid.is_some()).then(|| NetworkInfo {
            wifi_ip: wifi_ip.clone(),
            wifi_ssid,
        });

        Ok(DeviceStatus {
            id: self.cfg.id.clone(),
            name: self.cfg.name.clone(),
            kind: "android".into(),
            connection: "adb-ota".into(),
            ip: wifi_ip,
            online: true,
            model,
            manufacturer,
            android_version,
            serial,
            battery,
            storage,
            network,
            timestamp: Utc::now(),
        })
    }

    /// The record stored when this device cannot be reached: identity
    /// only, every detail field absent.
    pub fn offline_status(&self) -> DeviceStatus {
        DeviceStatus {
            id: self.cfg.id.clone(),
            name: self.cfg.name.clone(),
            kind: "android".into(),
            connection: "adb-ota".into(),
            ip: None,
            online: false,
            model: None,
            manufacturer: None,
            android_version: None,
            serial: None,
            battery: None,
            storage: None,
            network: None,
            timestamp: Utc::now(),
        }
    }

    /// `adb get-state` prints exactly `device` for a usable device.
    async fn probe(&self) -> Result<(), FetchError> {
        let out = self
            .runner
            .run("adb", &["-s", &self.endpoint, "get-state"], ADB_TIMEOUT)
            .await?;

        if out.success() && out.stdout.trim() == "device" {
            return Ok(());
        }

        let detail = {
            let stderr = out.stderr.trim();
            if stderr.is_empty() {
                format!("{} not in device state", self.endpoint)
            } else {
                stderr.to_owned()
            }
        };
        Err(FetchError::Unreachable(detail))
    }

    /// Run one `adb shell` command, returning trimmed stdout. Failures
    /// and empty output degrade to `None`.
    async fn shell(&self, args: &[&str]) -> Option<String> {
        let mut full: Vec<&str> = vec!["-s", &self.endpoint, "shell"];
        full.extend_from_slice(args);

        match self.runner.run("adb", &full, ADB_TIMEOUT).await {
            Ok(out) if out.success() => {
                let text = out.stdout.trim().to_owned();
                (!text.is_empty()).then_some(text)
            }
            Ok(out) => {
                warn!(
                    "adb shell {} failed on {}: {}",
                    args.join(" "),
                    self.endpoint,
                    out.stderr.trim()
                );
                None
            }
            Err(e) => {
                warn!("adb shell {} failed on {}: {e}", args.join(" "), self.endpoint);
                None
            }
        }
    }
}

/// Scrape `dumpsys battery` key-value output. Unrecognized lines are
/// skipped; the device reports temperature in tenths of a degree.
fn parse_battery(output: &str) -> BatteryInfo {
    let mut info = BatteryInfo {
        level: None,
        status: None,
        temperature: None,
        health: None,
    };

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "level" => info.level = value.parse().ok(),
            "status" => info.status = (!value.is_empty()).then(|| value.to_owned()),
            "temperature" => info.temperature = value.parse::<f64>().ok().map(|t| t / 10.0),
            "health" => info.health = (!value.is_empty()).then(|| value.to_owned()),
            _ => {}
        }
    }

    info
}

/// Parse the data row of `df /data`. Column layout:
/// `Filesystem 1K-blocks Used Available Use% Mounted on`.
fn parse_storage(output: &str) -> Option<StorageInfo> {
    let row = output.lines().nth(1)?;
    let parts: Vec<&str> = row.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }

    Some(StorageInfo {
        total: parts[1].parse().ok(),
        used: parts[2].parse().ok(),
        available: parts[3].parse().ok(),
        percent: parts[4].trim_end_matches('%').parse().ok(),
    })
}

/// Pull the IPv4 address out of `ifconfig wlan0` output
/// (`inet addr:10.144.180.80  Bcast:...` on Android's toybox).
fn parse_wifi_ip(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.contains("inet addr:"))?;
    let after = line.split("inet addr:").nth(1)?;
    let ip = after.split_whitespace().next()?;
    (!ip.is_empty()).then(|| ip.to_owned())
}

/// First SSID mentioned by `dumpsys wifi`, minus surrounding quotes.
fn parse_wifi_ssid(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.contains("SSID:"))?;
    let after = line.split("SSID:").nth(1)?;
    let ssid = after.split(',').next()?.trim().trim_matches('"').trim();
    if ssid.is_empty() || ssid == "<unknown ssid>" {
        return None;
    }
    Some(ssid.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::FakeRunner;

    const DUMPSYS_BATTERY: &str = "Current Battery Service state:\n\
          AC powered: false\n\
          USB powered: true\n\
          Max charging current: 500000\n\
          status: 2\n\
          health: 2\n\
          present: true\n\
          level: 85\n\
          scale: 100\n\
          voltage: 4113\n\
          temperature: 271\n\
          technology: Li-ion\n";

    const DF_DATA: &str = "Filesystem     1K-blocks     Used Available Use% Mounted on\n\
        /dev/block/dm-0 57614284 49423340   8190944  86% /data\n";

    const IFCONFIG_WLAN0: &str = "wlan0     Link encap:Ethernet  HWaddr 64:89:9a:aa:bb:cc\n\
          inet addr:10.144.180.80  Bcast:10.144.180.255  Mask:255.255.255.0\n";

    const DUMPSYS_WIFI: &str =
        "mWifiInfo SSID: \"gibznet\", BSSID: 02:00:00:00:00:00, MAC: 02:00:00:00:00:00\n";

    fn config() -> DeviceConfig {
        DeviceConfig {
            id: "gibson-v20".into(),
            name: "Gibson's V20".into(),
            host: "10.144.180.80".into(),
            port: 5555,
        }
    }

    fn adapter(runner: FakeRunner) -> DeviceAdapter {
        DeviceAdapter::new(config(), Arc::new(runner))
    }

    const EP: &str = "10.144.180.80:5555";

    fn shell_cmd(rest: &str) -> String {
        format!("adb -s {EP} shell {rest}")
    }

    #[tokio::test]
    async fn full_scrape_happy_path() {
        let runner = FakeRunner::new()
            .ok(&format!("adb -s {EP} get-state"), "device\n")
            .ok(&shell_cmd("getprop ro.product.model"), "LG-H910\n")
            .ok(&shell_cmd("getprop ro.product.manufacturer"), "LGE\n")
            .ok(&shell_cmd("getprop ro.build.version.release"), "8.0.0\n")
            .ok(&shell_cmd("getprop ro.serialno"), "LGH910abcdef\n")
            .ok(&shell_cmd("dumpsys battery"), DUMPSYS_BATTERY)
            .ok(&shell_cmd("df /data"), DF_DATA)
            .ok(&shell_cmd("ifconfig wlan0"), IFCONFIG_WLAN0)
            .ok(&shell_cmd("dumpsys wifi"), DUMPSYS_WIFI);

        let status = adapter(runner).fetch_status().await.unwrap();

        assert!(status.online);
        assert_eq!(status.id, "gibson-v20");
        assert_eq!(status.model.as_deref(), Some("LG-H910"));
        assert_eq!(status.manufacturer.as_deref(), Some("LGE"));
        assert_eq!(status.android_version.as_deref(), Some("8.0.0"));
        assert_eq!(status.ip.as_deref(), Some("10.144.180.80"));

        let battery = status.battery.unwrap();
        assert_eq!(battery.level, Some(85));
        assert_eq!(battery.status.as_deref(), Some("2"));
        assert_eq!(battery.temperature, Some(27.1));

        let storage = status.storage.unwrap();
        assert_eq!(storage.total, Some(57_614_284));
        assert_eq!(storage.percent, Some(86));

        let network = status.network.unwrap();
        assert_eq!(network.wifi_ip.as_deref(), Some("10.144.180.80"));
        assert_eq!(network.wifi_ssid.as_deref(), Some("gibznet"));
    }

    #[tokio::test]
    async fn failed_probe_is_unreachable() {
        let runner = FakeRunner::new().exit(
            &format!("adb -s {EP} get-state"),
            1,
            "error: device '10.144.180.80:5555' not found",
        );

        let err = adapter(runner).fetch_status().await.unwrap_err();
        assert!(matches!(err, FetchError::Unreachable(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn probe_timeout_bubbles_up() {
        let runner = FakeRunner::new().err(
            &format!("adb -s {EP} get-state"),
            FetchError::Timeout(ADB_TIMEOUT),
        );

        let err = adapter(runner).fetch_status().await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn detail_failures_degrade_to_absent_fields() {
        // Only the probe and the model lookup are scripted; every other
        // command fails.
        let runner = FakeRunner::new()
            .ok(&format!("adb -s {EP} get-state"), "device\n")
            .ok(&shell_cmd("getprop ro.product.model"), "LG-H910\n");

        let status = adapter(runner).fetch_status().await.unwrap();

        assert!(status.online);
        assert_eq!(status.model.as_deref(), Some("LG-H910"));
        assert!(status.manufacturer.is_none());
        assert!(status.battery.is_none());
        assert!(status.storage.is_none());
        assert!(status.network.is_none());
        assert!(status.ip.is_none());
    }

    #[tokio::test]
    async fn offline_record_has_no_detail_fields() {
        let status = adapter(FakeRunner::new()).offline_status();

        assert!(!status.online);
        assert_eq!(status.id, "gibson-v20");
        assert_eq!(status.name, "Gibson's V20");
        assert!(status.ip.is_none());
        assert!(status.model.is_none());
        assert!(status.battery.is_none());
        assert!(status.storage.is_none());
        assert!(status.network.is_none());
    }

    #[test]
    fn battery_parse_skips_garbage() {
        let info = parse_battery("no colons here\nlevel: not-a-number\nstatus:\n");
        assert!(info.level.is_none());
        assert!(info.status.is_none());
        assert!(info.temperature.is_none());
        assert!(info.health.is_none());
    }

    #[test]
    fn storage_parse_requires_a_data_row() {
        assert!(parse_storage("Filesystem 1K-blocks Used Available Use% Mounted on\n").is_none());
        assert!(parse_storage("").is_none());
        assert!(parse_storage("header\n/dev/block 123\n").is_none());
    }

    #[test]
    fn storage_parse_tolerates_bad_columns() {
        let storage = parse_storage("header\n/dev/block/dm-0 xyz 49423340 8190944 86% /data\n")
            .expect("row present");
        assert!(storage.total.is_none());
        assert_eq!(storage.used, Some(49_423_340));
        assert_eq!(storage.percent, Some(86));
    }

    #[test]
    fn wifi_ssid_parse_handles_unknown() {
        assert!(parse_wifi_ssid("mWifiInfo SSID: <unknown ssid>, BSSID: ...").is_none());
        assert!(parse_wifi_ssid("nothing relevant").is_none());
        assert_eq!(
            parse_wifi_ssid(DUMPSYS_WIFI).as_deref(),
            Some("gibznet"),
        );
    }

    #[test]
    fn wifi_ip_parse() {
        assert_eq!(
            parse_wifi_ip(IFCONFIG_WLAN0).as_deref(),
            Some("10.144.180.80")
        );
        assert!(parse_wifi_ip("wlan0: no address\n").is_none());
    }
}
