//! `mellivora onboard` — First-time setup.

use mellivora_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🍯 Mellivora — First-Time Setup");
    println!("===============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    // Seed the config with a fresh inbound API key so the gateway is
    // never accidentally deployed unauthenticated.
    let mut config = AppConfig::default();
    let api_key = uuid::Uuid::new_v4().to_string();
    config.api_key = Some(api_key.clone());

    let toml = toml::to_string_pretty(&config)?;
    std::fs::write(&config_path, &toml)?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("✅ Generated inbound API key: {api_key}");

    println!("\n📝 Next steps:");
    println!("   1. Set GROQ_API_KEY (or provider.api_key in config.toml)");
    println!("   2. Set collector.url to your report collector endpoint");
    println!("   3. Run `mellivora gateway` to start the honeypot");

    Ok(())
}
