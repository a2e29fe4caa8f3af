//! `mellivora doctor` — Diagnose configuration health.

use mellivora_config::AppConfig;
use mellivora_providers::ChatClient;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Mellivora Doctor — Diagnostics");
    println!("=================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ❌ No config file — run `mellivora onboard`");
        issues += 1;
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");

            if config.api_key.is_some() {
                println!("  ✅ Inbound API key configured");
            } else {
                println!("  ⚠️  No inbound API key — /api routes will be unauthenticated");
                issues += 1;
            }

            match ChatClient::from_config(&config.provider) {
                Ok(_) => println!("  ✅ Provider configured ({})", config.provider.model),
                Err(e) => {
                    println!("  ❌ Provider unusable: {e}");
                    issues += 1;
                }
            }

            if config.collector.url.is_some() {
                println!("  ✅ Collector endpoint configured");
            } else {
                println!("  ⚠️  No collector URL — final reports will be logged only");
                issues += 1;
            }
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
