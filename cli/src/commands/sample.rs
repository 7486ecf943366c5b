//! Sampling command

use anyhow::{Context, Result};
use logitkit_core::Config;
use logitkit_sampling::{Logits, Pipeline, Sampled, Strategy};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn execute(
    logits: Vec<f64>,
    strategies: Vec<Strategy>,
    preset: Option<&str>,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let logits = if logits.is_empty() {
        read_stdin_logits()?
    } else {
        Logits::new(logits)
    };

    let (pipeline, seed) = if strategies.is_empty() {
        let config = Config::load()?;
        let profile = config.profile(preset)?;
        (profile.pipeline()?, seed.or(profile.seed))
    } else {
        (Pipeline::new(strategies), seed)
    };

    tracing::info!(
        tokens = logits.len(),
        stages = pipeline.strategies().len(),
        ?seed,
        "running pipeline"
    );

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sampled = pipeline.sample(logits, &mut rng)?;

    if json {
        println!("{}", serde_json::to_string(&sampled)?);
    } else {
        print!("{}", render(&sampled));
    }

    Ok(())
}

fn read_stdin_logits() -> Result<Logits> {
    let stdin = std::io::stdin();
    serde_json::from_reader(stdin.lock()).context("Expected a JSON array of scores on stdin")
}

fn render(sampled: &Sampled) -> String {
    match sampled {
        Sampled::Token(token) => format!("{}\n", token),
        Sampled::Logits(logits) => logits
            .iter()
            .enumerate()
            .map(|(i, score)| match score {
                Some(score) => format!("{}\t{}\n", i, score),
                None => format!("{}\texcluded\n", i),
            })
            .collect(),
    }
}
