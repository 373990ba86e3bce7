//! Threshold rules over a snapshot. Pure functions: same snapshot in,
//! same events out, in source iteration order (devices first, then
//! hosts). A rule only fires when its input field is present; absent
//! values never trigger anything.

use crate::models::{
    ContainerReport, OpportunityEvent, OpportunityKind, Severity, Snapshot, ThreatEvent,
    ThreatKind,
};

const LOW_BATTERY_PERCENT: u8 = 20;
const STORAGE_FULL_PERCENT: u8 = 90;
const DEGRADED_RUNNING_RATIO: f64 = 0.5;

pub fn analyze(snapshot: &Snapshot) -> (Vec<ThreatEvent>, Vec<OpportunityEvent>) {
    (threats(snapshot), opportunities(snapshot))
}

pub fn threats(snapshot: &Snapshot) -> Vec<ThreatEvent> {
    let mut events = Vec::new();

    for device in &snapshot.devices {
        if !device.online {
            events.push(ThreatEvent {
                kind: ThreatKind::DeviceOffline,
                severity: Severity::High,
                message: format!("{} is offline", device.name),
                source: device.id.clone(),
            });
        }

        if let Some(level) = device.battery.as_ref().and_then(|b| b.level) {
            if level < LOW_BATTERY_PERCENT {
                events.push(ThreatEvent {
                    kind: ThreatKind::LowBattery,
                    severity: Severity::Medium,
                    message: format!("{} battery at {level}%", device.name),
                    source: device.id.clone(),
                });
            }
        }

        if let Some(percent) = device.storage.as_ref().and_then(|s| s.percent) {
            if percent > STORAGE_FULL_PERCENT {
                events.push(ThreatEvent {
                    kind: ThreatKind::StorageFull,
                    severity: Severity::High,
                    message: format!("{} storage at {percent}%", device.name),
                    source: device.id.clone(),
                });
            }
        }
    }

    for host in &snapshot.services {
        let source = host.name.to_lowercase();
        match &host.containers {
            ContainerReport::Unavailable { .. } => {
                events.push(ThreatEvent {
                    kind: ThreatKind::ServiceError,
                    severity: Severity::High,
                    message: format!("{} SSH failed", host.name),
                    source,
                });
            }
            ContainerReport::Summary(summary) => {
                // Strict: exactly half running is not degraded.
                if (summary.running as f64) < summary.total as f64 * DEGRADED_RUNNING_RATIO {
                    events.push(ThreatEvent {
                        kind: ThreatKind::ContainersDegraded,
                        severity: Severity::Medium,
                        message: format!(
                            "Only {}/{} containers running",
                            summary.running, summary.total
                        ),
                        source,
                    });
                }
            }
        }
    }

    events
}

pub fn opportunities(snapshot: &Snapshot) -> Vec<OpportunityEvent> {
    let mut events = Vec::new();

    if let Some(trading) = &snapshot.trading {
        if trading.error.is_none() && trading.pnl > 0.0 {
            events.push(OpportunityEvent {
                kind: OpportunityKind::Profit,
                source: "hyperliquid".into(),
                message: format!("Trading PnL: +${}", format_cents(trading.pnl)),
                priority: Severity::High,
            });
        }
    }

    events
}

/// Two decimals, half-up at the cent. The nudge keeps values like
/// 150.005, which sit a hair below the cent boundary as doubles, from
/// rounding down.
fn format_cents(value: f64) -> String {
    let cents = (value * 100.0 + 1e-6).round();
    format!("{:.2}", cents / 100.0)
}
