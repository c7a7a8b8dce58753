//! Print the SQL preview of a transformation chain.
//!
//! Usage: `perseus-preview [CHAIN.json]`, reading stdin when no file is given.
//! The file holds a chain in list order, for example
//! `{"steps":[{"type":"TRIM"},{"type":"REPLACE","old":"-","new":""}]}`.

use std::io::Read;

use anyhow::{Context, Result};
use perseus::{ChainSpec, TransformationChain};
use perseus_shared::{ObservabilitySystem, PerseusConfig};
use tracing::info;

fn main() -> Result<()> {
    let config = PerseusConfig::load().context("loading configuration")?;
    ObservabilitySystem::init(&config.observability)?;

    let input = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading chain description from {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading chain description from stdin")?;
            buf
        }
    };

    let spec: ChainSpec = serde_json::from_str(&input).context("parsing chain description")?;
    let chain = TransformationChain::from_spec(&spec)?;
    info!(steps = chain.len(), "chain assembled");

    println!("{}", chain.preview());

    if let Some(metrics) = ObservabilitySystem::get()
        .and_then(ObservabilitySystem::render_metrics)
    {
        info!("{}", metrics);
    }
    Ok(())
}
