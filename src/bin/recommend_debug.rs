//! Prints how an ingredient list is normalized and what it ranks.
//!
//! `cargo run --bin recommend_debug -- "1/2 Chicken, tomato, Basmati rice"`

use pantry_match::{telemetry::init_tracing, Engine, MatcherConfig};

const DEMO_INPUT: &str = "1/2 Chicken, tomato, onion, Basmati rice";
const SHOWN: usize = 5;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = if args.is_empty() {
        DEMO_INPUT.to_string()
    } else {
        args.join(", ")
    };

    let config = MatcherConfig::from_toml()?;
    let top_n = config.ranking.default_top_n;
    let engine = Engine::from_config(config);

    println!("corpus: {} recipes", engine.recipe_count());
    println!("input:  {input}");

    let trace = engine.trace(input.as_str());
    println!("\n--- normalization ---");
    for p in &trace.phrases {
        println!(
            "{:<30} -> {:<20} -> {}",
            p.raw,
            p.normalized,
            p.canonical.as_deref().unwrap_or("(dropped)")
        );
    }
    println!("user:      {:?}", trace.user);
    println!("available: {:?}", trace.available);

    let results = engine.recommend(input.as_str(), top_n);
    let cookable = results.iter().filter(|r| r.cookable).count();
    println!(
        "\n--- results: {} ({} cookable, {} near-miss) ---",
        results.len(),
        cookable,
        results.len() - cookable
    );
    for r in results.iter().take(SHOWN) {
        println!(
            "[{:>3}] {} (id {}){}",
            r.score,
            r.name,
            r.id,
            if r.cookable { "" } else { "  near-miss" }
        );
        println!("      matched: {:?}", r.matched);
        if !r.missing.is_empty() {
            println!("      missing: {:?}", r.missing);
        }
        if !r.warning.is_empty() {
            println!("      {}", r.warning);
        }
    }

    Ok(())
}
