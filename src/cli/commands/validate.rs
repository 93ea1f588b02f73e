//! Validate configuration command.

use anyhow::Result;
use dca_config::load_config;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            let optimization = config.optimization.to_optimization_config()?;
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Data directory: {}", config.data.dir.display());
            println!("Preset: {}", config.optimization.preset);
            println!(
                "Basket: {}-{} assets",
                optimization.selector.min_assets, optimization.selector.max_assets
            );
            println!("Rebalance threshold: {:.1}%", config.rebalance.threshold * 100.0);
            println!(
                "Rebalance interval: {}-{} days",
                config.rebalance.min_interval_days, config.rebalance.max_interval_days
            );
            println!();
            println!("Effective configuration:");
            println!("{}", config.to_toml()?);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
