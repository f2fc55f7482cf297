//! Model artifact check
//!
//! Loads the configured classifier and runs the reference observation
//! through it twice, printing the outcome. Exits non-zero when the artifact
//! does not load or the two runs disagree.

use anyhow::{bail, Result};
use rainfall_predictor::{AppConfig, InferenceEngine, RenderedResult, WeatherForm};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rainfall_predictor=info".parse()?),
        )
        .init();

    let mut config = AppConfig::load()?;
    if let Some(path) = std::env::args().nth(1) {
        config.model.path = path.into();
    }

    let engine = InferenceEngine::new(&config)?;
    info!(model = %engine.model_name(), "Model loaded");

    // pressure=1012.0 dewpoint=15.0 humidity=60 cloud=50 sunshine=6 winddirection=90 windspeed=12.0
    let observation = WeatherForm::default().validate()?;

    let first = engine.predict(&observation)?;
    let second = engine.predict(&observation)?;
    if !first.same_output(&second) {
        bail!("non-deterministic output: {:?} vs {:?}", first, second);
    }

    for (name, value) in engine.model_input(&observation) {
        println!("{:>14}: {}", name, value);
    }

    let rendered = RenderedResult::from_prediction(&first);
    println!();
    println!("label:       {}", first.outcome.label());
    println!("probability: {}", rendered.probability);
    println!("message:     {}", rendered.message);

    Ok(())
}
