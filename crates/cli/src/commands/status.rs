//! `mellivora status` — Show configuration status.

use mellivora_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("🍯 Mellivora Status");
    println!("==================");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Model:          {}", config.provider.model);
    println!("  Provider URL:   {}", config.provider.base_url);
    println!(
        "  Provider key:   {}",
        if config.provider.api_key.is_some() { "configured" } else { "missing" }
    );
    println!(
        "  Inbound auth:   {}",
        if config.api_key.is_some() { "enabled" } else { "disabled" }
    );
    println!(
        "  Collector:      {}",
        config.collector.url.as_deref().unwrap_or("(log only)")
    );
    println!(
        "  Gateway:        {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!(
        "  Engagement:     threshold {:.2}, min {} msgs, cap {} msgs",
        config.engine.engage_threshold,
        config.engine.min_engagement_messages,
        config.engine.max_total_messages
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `mellivora onboard` first");
    }

    Ok(())
}
