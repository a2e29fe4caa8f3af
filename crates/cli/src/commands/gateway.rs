//! `mellivora gateway` — Start the honeypot HTTP server.

use mellivora_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🍯 Mellivora Gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "   Auth:       {}",
        if config.api_key.is_some() {
            "x-api-key required"
        } else {
            "DISABLED"
        }
    );
    println!(
        "   Collector:  {}",
        config.collector.url.as_deref().unwrap_or("(log only)")
    );

    mellivora_gateway::start(config).await?;

    Ok(())
}
