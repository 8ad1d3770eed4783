//! Daemon status command

use anyhow::Result;
use serde_json::Value;

use super::http;

pub async fn run() -> Result<()> {
    println!("Surge Status");
    println!("============");

    let url = http::api_url("/api/v1/status");
    match http::get(&url).await {
        Ok(resp) if resp.status().is_success() => {
            let status: Value = resp.json().await?;
            println!("Daemon:          running ({})", http::daemon_url());
            println!("Version:         {}", status["version"].as_str().unwrap_or("unknown"));
            println!("Uptime:          {}s", status["uptime_seconds"]);
            println!("Policy:          {}", status["policy"].as_str().unwrap_or("unknown"));
            println!(
                "Policy source:   {}",
                status["policy_source"].as_str().unwrap_or("unknown")
            );
            println!(
                "Fare model:      {}",
                status["fare_model"]["mode"].as_str().unwrap_or("unknown")
            );
            println!("Quotes served:   {}", status["quotes_served"]);

            if status["policy_source"] == "fallback" {
                println!("\nWarning: serving from an untrained fallback policy table");
            }
        }
        Ok(resp) => {
            println!("Daemon: error (HTTP {})", resp.status());
        }
        Err(_) => {
            println!("Daemon: not running ({})", http::daemon_url());
        }
    }

    Ok(())
}
