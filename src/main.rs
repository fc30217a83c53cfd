use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use confluence_engine::config::Config;
use confluence_engine::feeds::QuietShockFeed;
use confluence_engine::scoring::{ScanInput, ScanPipeline};
use confluence_engine::store::{JsonFileStore, KvStore};

#[derive(Debug, Deserialize)]
struct ScanRequest {
    symbol: String,
    timeframes: Vec<ScanInput>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let request_path = std::env::args()
        .nth(1)
        .context("usage: confluence-engine <scan-request.json>")?;
    let request: ScanRequest = serde_json::from_str(
        &fs::read_to_string(&request_path)
            .with_context(|| format!("reading {request_path}"))?,
    )
    .context("parsing scan request")?;

    let store: Arc<dyn KvStore> = Arc::new(JsonFileStore::open(Path::new(&cfg.store_path))?);
    let pipeline = ScanPipeline::new(&cfg, store);

    let outcome = pipeline
        .scan_symbol(&request.symbol, request.timeframes, &QuietShockFeed)
        .await;

    let mut ranked = outcome.scored;
    ranked.sort_by(|a, b| {
        b.setup
            .edge_score
            .partial_cmp(&a.setup.edge_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for scored in &ranked {
        let setup = &scored.setup;
        let score = setup.edge_score.unwrap_or(0.0);
        let suppressed = if scored.credibility.is_suppressed {
            " [suppressed]"
        } else {
            ""
        };
        println!(
            "{} {} {} {} -> edge {:.1}{}",
            setup.symbol, setup.timeframe, setup.strategy, setup.direction, score, suppressed
        );
        if let Some(breakdown) = &setup.breakdown {
            for line in &breakdown.positives {
                println!("  + {line}");
            }
            for line in &breakdown.risks {
                println!("  - {line}");
            }
        }
        if let Some(sim) = &scored.simulation {
            println!(
                "  risk: ruin {:.1}% / success {:.1}% / safety {:.0}",
                sim.ruin_probability, sim.success_probability, sim.safety_score
            );
        }
    }

    match outcome.signal {
        Some(signal) => {
            println!(
                "\nSIGNAL {} {} @ {:.2} | stop {:.2} | targets {:?} | confluence {:.0} ({} timeframes)",
                signal.symbol,
                signal.direction,
                signal.entry.optimal,
                signal.stop,
                signal.targets,
                signal.confluence_score,
                signal.timeframes.len()
            );
            for line in &signal.breakdown {
                println!("  * {line}");
            }
        }
        None => println!("\nNo confluence signal."),
    }

    Ok(())
}
