/// Example HTTP client demonstrating how to call the EPS proxy API
///
/// Run the server first:
/// ```bash
/// cargo run
/// ```
///
/// Then run this example:
/// ```bash
/// cargo run --example api_client -- AWB123
/// ```

use serde::Deserialize;

#[derive(Deserialize, Debug)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    env_configured: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let awb = std::env::args().nth(1).unwrap_or_else(|| "AWB123".to_string());
    let client = reqwest::Client::new();

    // 1. Health Check
    println!("Checking proxy health...");
    let health: HealthResponse = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!(
        "  {} v{}: {} (env configured: {})\n",
        health.service, health.version, health.status, health.env_configured
    );

    // 2. Tracking lookup
    println!("Looking up AWB {}...", awb);
    let response = client.get(format!("{}/track/{}", base_url, awb)).send().await?;

    if response.status().is_success() {
        let data: serde_json::Value = response.json().await?;
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        let status = response.status();
        let body = response.text().await?;
        println!("  Lookup failed ({}): {}", status, body);
    }

    Ok(())
}
