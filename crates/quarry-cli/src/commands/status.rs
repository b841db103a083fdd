//! Status command - show index status and statistics.

use crate::app::App;
use quarry_core::{Config, Field};

/// Run the status command.
pub fn run(config: Config) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let stats = app.library.stats();

    println!("Quarry Index Status");
    println!("===================");
    println!();
    println!("Catalog: {}", app.catalog.path().display());
    println!();

    if !stats.valid {
        println!("Index is not built. The catalog may still be settling.");
        return Ok(());
    }

    println!("Summary:");
    println!("  Records:           {}", stats.record_count);
    for field in Field::ALL {
        println!(
            "  {:<18} {}",
            format!("{} nodes:", capitalize(field.as_str())),
            stats.nodes(field)
        );
    }
    println!("  Total nodes:       {}", stats.total_nodes());
    println!("  Generation:        {}", stats.generation);

    if let Some(built) = stats.last_built {
        println!("  Last built:        {}", built.format("%Y-%m-%d %H:%M:%S"));
    }

    println!();
    println!(
        "Search: up to {} results, debounce {}ms",
        app.library.options().max_results,
        app.config.search.debounce_ms
    );

    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
