//! List presets command.

use anyhow::Result;
use dca_core::types::Factor;
use dca_portfolio::{PresetRegistry, DEFAULT_PRESET};

pub async fn run() -> Result<()> {
    let registry = PresetRegistry::new();

    println!("Available Presets");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        let marker = if info.name == DEFAULT_PRESET { " (default)" } else { "" };
        let selector = &info.config.selector;
        let allocator = &info.config.allocator;

        println!("  {}{}", info.name, marker);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        let weights: Vec<String> = Factor::ALL
            .iter()
            .map(|f| format!("{} {:.2}", f, selector.factor_weights.get(*f)))
            .collect();
        println!("  Factors:     {}", weights.join(", "));
        println!(
            "  Basket:      {}-{} assets, correlation cap {:.2}",
            selector.min_assets, selector.max_assets, selector.correlation_threshold
        );
        println!(
            "  Weights:     {:.0}%-{:.0}% per asset",
            allocator.min_weight_per_asset * 100.0,
            allocator.max_weight_per_asset * 100.0
        );
        println!();
    }

    println!("Use --preset <name> or optimization.preset to select a preset.");

    Ok(())
}
