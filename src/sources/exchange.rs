use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ExchangeConfig;
use crate::error::FetchError;
use crate::models::PortfolioStatus;

const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Info-endpoint request body; the exchange tags requests by `type`.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum InfoRequest<'a> {
    #[serde(rename = "clearinghouseState")]
    ClearinghouseState { user: &'a str },
}

/// The slice of the clearinghouse state this dashboard uses. Amounts are
/// fixed-point integers scaled by 1e6, sometimes serialized as strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearinghouseState {
    #[serde(default)]
    withdrawable: Option<RawAmount>,
    #[serde(default)]
    total_pnl: Option<RawAmount>,
    #[serde(default)]
    margin_used: Option<RawAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    /// Scale a 1e6 fixed-point wire value down to units. Unparseable
    /// strings count as zero, like missing fields.
    fn to_units(&self) -> f64 {
        let raw = match self {
            RawAmount::Number(n) => *n,
            RawAmount::Text(s) => s.parse().unwrap_or(0.0),
        };
        raw / 1e6
    }
}

fn units(field: Option<RawAmount>) -> f64 {
    field.map(|v| v.to_units()).unwrap_or(0.0)
}

/// Fetches the portfolio state for one fixed account from the exchange's
/// public info endpoint.
pub struct ExchangeAdapter {
    cfg: ExchangeConfig,
    client: Client,
}

impl ExchangeAdapter {
    pub fn new(cfg: ExchangeConfig) -> Self {
        Self {
            cfg,
            client: Client::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.cfg.address
    }

    pub async fn fetch_status(&self) -> Result<PortfolioStatus, FetchError> {
        let url = format!("{}/info", self.cfg.api_url);
        let request = InfoRequest::ClearinghouseState {
            user: &self.cfg.address,
        };

        let response = self
            .client
            .post(&url)
            .timeout(EXCHANGE_TIMEOUT)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(e, EXCHANGE_TIMEOUT))?;

        let state: ClearinghouseState = response
            .json()
            .await
            .map_err(|e| FetchError::from_reqwest(e, EXCHANGE_TIMEOUT))?;

        Ok(PortfolioStatus {
            address: self.cfg.address.clone(),
            balance: units(state.withdrawable),
            pnl: units(state.total_pnl),
            margin_used: units(state.margin_used),
            timestamp: Utc::now(),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_shape() {
        let body = serde_json::to_value(InfoRequest::ClearinghouseState { user: "0xabc" })
            .unwrap();
        assert_eq!(body["type"], "clearinghouseState");
        assert_eq!(body["user"], "0xabc");
    }

    #[test]
    fn scaled_fields_parse_from_strings_and_numbers() {
        let state: ClearinghouseState = serde_json::from_str(
            r#"{"withdrawable":"150005000","totalPnl":2500000,"marginUsed":"0"}"#,
        )
        .unwrap();

        assert_eq!(units(state.withdrawable), 150.005);
        assert_eq!(units(state.total_pnl), 2.5);
        assert_eq!(units(state.margin_used), 0.0);
    }

    #[test]
    fn missing_and_garbage_fields_become_zero() {
        let state: ClearinghouseState =
            serde_json::from_str(r#"{"withdrawable":"not-a-number"}"#).unwrap();

        assert_eq!(units(state.withdrawable), 0.0);
        assert_eq!(units(state.total_pnl), 0.0);
        assert_eq!(units(state.margin_used), 0.0);
    }

    #[tokio::test]
    async fn refused_connection_is_a_fetch_error() {
        let adapter = ExchangeAdapter::new(ExchangeConfig {
            api_url: "http://127.0.0.1:1".into(),
            address: "0xabc".into(),
        });

        let err = adapter.fetch_status().await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Unreachable(_) | FetchError::Transport(_)
        ));
    }
}
