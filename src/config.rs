use serde::Deserialize;
use std::path::Path;

/// Root configuration loaded from `config.toml`. Every section carries
/// defaults matching the deployed setup, so the file may be partial or
/// missing entirely.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub poll: PollConfig,
    pub devices: Vec<DeviceConfig>,
    pub hosts: Vec<HostConfig>,
    pub exchange: ExchangeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            poll: PollConfig::default(),
            devices: vec![DeviceConfig::default()],
            hosts: vec![HostConfig::default()],
            exchange: ExchangeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between polling cycles.
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

/// One Android device reached over `adb -s host:port`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: "gibson-v20".into(),
            name: "Gibson's V20".into(),
            host: "10.144.180.80".into(),
            port: 5555,
        }
    }
}

/// One server reached over SSH.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub host: String,
    pub name: String,
    pub user: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host: "10.144.118.159".into(),
            name: "StackForge".into(),
            user: "gibz".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub api_url: String,
    pub address: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.hyperliquid.xyz".into(),
            address: "0x970d1e1756804cc1420e1202cd3833d83f2b93d5".into(),
        }
    }
}

impl AppConfig {
    /// Load and parse the config file. Falls back to `./config.toml` next to
    /// the executable if no explicit path is given, then the working
    /// directory; a missing file yields the built-in defaults.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => std::path::PathBuf::from(p),
            None => {
                // Look next to the executable first, then CWD
                let exe_dir = std::env::current_exe()
                    .ok()
                    .and_then(|p| p.parent().map(Path::to_path_buf));

                if let Some(dir) = exe_dir {
                    let candidate = dir.join("config.toml");
                    if candidate.exists() {
                        candidate
                    } else {
                        std::path::PathBuf::from("config.toml")
                    }
                } else {
                    std::path::PathBuf::from("config.toml")
                }
            }
        };

        if !path.exists() {
            return Ok(AppConfig::default());
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read config at {}: {e}", path.display()))?;

        let config: AppConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Apply environment overrides on top of the loaded file. They
    /// retarget the API port, the first configured device and host, and
    /// the exchange account.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(port) = get("PORT").and_then(|v| v.parse().ok()) {
            self.api.port = port;
        }

        if let Some(device) = self.devices.first_mut() {
            if let Some(host) = get("ADB_HOST") {
                device.host = host;
            }
            if let Some(port) = get("ADB_PORT").and_then(|v| v.parse().ok()) {
                device.port = port;
            }
        }

        if let Some(host) = self.hosts.first_mut() {
            if let Some(addr) = get("STACKFORGE_HOST") {
                host.host = addr;
            }
        }

        if let Some(address) = get("EXCHANGE_ADDRESS") {
            self.exchange.address = address;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn full_file_parses() {
        let raw = r#"
[api]
port = 8080

[poll]
interval_secs = 60

[[devices]]
id = "pixel"
name = "Pixel 7"
host = "192.168.1.50"
port = 5555

[[hosts]]
host = "192.168.1.10"
name = "Forge"
user = "ops"

[exchange]
api_url = "https://api.example.exchange"
address = "0xabc"
"#;
        let cfg: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.api.port, 8080);
        assert_eq!(cfg.poll.interval_secs, 60);
        assert_eq!(cfg.devices.len(), 1);
        assert_eq!(cfg.devices[0].id, "pixel");
        assert_eq!(cfg.hosts[0].user, "ops");
        assert_eq!(cfg.exchange.address, "0xabc");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: AppConfig = toml::from_str("[api]\nport = 4000\n").unwrap();
        assert_eq!(cfg.api.port, 4000);
        assert_eq!(cfg.poll.interval_secs, 300);
        assert_eq!(cfg.devices.len(), 1);
        assert_eq!(cfg.devices[0].id, "gibson-v20");
        assert_eq!(cfg.devices[0].port, 5555);
        assert_eq!(cfg.hosts[0].name, "StackForge");
        assert!(cfg.exchange.api_url.contains("hyperliquid"));
    }

    #[test]
    fn env_overrides_retarget_first_entries() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9000"),
            ("ADB_HOST", "10.0.0.9"),
            ("ADB_PORT", "5556"),
            ("STACKFORGE_HOST", "10.0.0.10"),
            ("EXCHANGE_ADDRESS", "0xfeed"),
        ]);

        let mut cfg = AppConfig::default();
        cfg.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.api.port, 9000);
        assert_eq!(cfg.devices[0].host, "10.0.0.9");
        assert_eq!(cfg.devices[0].port, 5556);
        assert_eq!(cfg.hosts[0].host, "10.0.0.10");
        assert_eq!(cfg.exchange.address, "0xfeed");
    }

    #[test]
    fn unparseable_override_is_ignored() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(|key| (key == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(cfg.api.port, 3000);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let cfg = AppConfig::load(Some("/nonexistent/homedash-config.toml")).unwrap();
        assert_eq!(cfg.api.port, 3000);
        assert_eq!(cfg.devices[0].id, "gibson-v20");
    }

    #[test]
    fn load_reads_explicit_path() {
        let path = std::env::temp_dir().join("homedash-config-test.toml");
        std::fs::write(&path, "[poll]\ninterval_secs = 42\n").unwrap();

        let cfg = AppConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.poll.interval_secs, 42);
        assert_eq!(cfg.api.port, 3000);
    }
}
