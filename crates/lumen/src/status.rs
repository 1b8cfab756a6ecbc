// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lumen status` command implementation.
//!
//! Queries the gateway health endpoint and reports provider state and
//! uptime. Falls back gracefully when the gateway is not running.

use std::io::IsTerminal;
use std::time::Duration;

use lumen_config::LumenConfig;
use lumen_core::LumenError;
use lumen_gateway::HealthResponse;
use lumen_lifecycle::GatewayClient;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub provider: Option<String>,
    pub version: Option<String>,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    pub gateway_url: String,
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn status_from(health: Option<HealthResponse>, gateway_url: &str) -> StatusResponse {
    match health {
        Some(health) => StatusResponse {
            running: true,
            uptime_human: Some(format_uptime(health.uptime_secs)),
            status: health.status,
            provider: Some(health.provider),
            version: Some(health.version),
            uptime_secs: Some(health.uptime_secs),
            gateway_url: gateway_url.to_string(),
        },
        None => StatusResponse {
            running: false,
            status: "not running".to_string(),
            provider: None,
            version: None,
            uptime_secs: None,
            uptime_human: None,
            gateway_url: gateway_url.to_string(),
        },
    }
}

/// Run the `lumen status` command.
///
/// `--json` prints structured output; `--plain` or a non-TTY stdout
/// disables colors.
pub async fn run_status(config: &LumenConfig, json: bool, plain: bool) -> Result<(), LumenError> {
    let client = GatewayClient::new(&config.client.gateway_url, Duration::from_secs(3))?;
    let health = match client.health().await {
        Ok(value) => serde_json::from_value::<HealthResponse>(value).ok(),
        Err(e) => {
            tracing::debug!(error = %e, "gateway health check failed");
            None
        }
    };
    let status = status_from(health, client.base_url());

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    if status.running {
        print_status_running(&status, use_color);
    } else {
        print_status_offline(&status.gateway_url, use_color);
    }
    Ok(())
}

fn print_status_running(status: &StatusResponse, use_color: bool) {
    let uptime = status.uptime_human.as_deref().unwrap_or("?");
    let provider = status.provider.as_deref().unwrap_or("unknown");

    println!();
    println!("  lumen status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        let state = if status.status == "healthy" {
            format!("{} {}", "✓".green(), status.status.green())
        } else {
            format!("{} {}", "!".yellow(), status.status.yellow())
        };
        println!("    State:    {state} (uptime: {uptime})");
    } else {
        let tag = if status.status == "healthy" { "[OK]" } else { "[WARN]" };
        println!("    State:    {tag} {} (uptime: {uptime})", status.status);
    }
    println!("    Provider: {provider}");
    println!("    Gateway:  {}", status.gateway_url);
    println!();
}

fn print_status_offline(gateway_url: &str, use_color: bool) {
    println!();
    println!("  lumen status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        println!("    State:    {} {}", "✗".red(), "not running".red());
    } else {
        println!("    State:    [FAIL] not running");
    }

    println!("    Endpoint: {gateway_url}/health");
    println!();
    println!("  Start with: lumen serve");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uptime_minutes() {
        assert_eq!(format_uptime(125), "2m");
    }

    #[test]
    fn format_uptime_hours() {
        assert_eq!(format_uptime(3_725), "1h 2m");
    }

    #[test]
    fn format_uptime_days() {
        assert_eq!(format_uptime(90_061), "1d 1h 1m");
    }

    #[test]
    fn running_status_carries_health() {
        let status = status_from(
            Some(HealthResponse {
                status: "degraded".into(),
                version: "0.1.0".into(),
                uptime_secs: 61,
                provider: "degraded".into(),
            }),
            "http://127.0.0.1:3000",
        );
        assert!(status.running);
        assert_eq!(status.uptime_human.as_deref(), Some("1m"));
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["provider"], "degraded");
    }

    #[test]
    fn offline_status_serializes() {
        let status = status_from(None, "http://127.0.0.1:3000");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["running"], false);
        assert_eq!(json["status"], "not running");
        assert!(json["uptime_secs"].is_null());
    }

    #[tokio::test]
    async fn status_against_missing_gateway_reports_offline() {
        let mut config = LumenConfig::default();
        config.client.gateway_url = "http://127.0.0.1:9".to_string();
        run_status(&config, true, true).await.unwrap();
    }
}
