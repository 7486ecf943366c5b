use anyhow::Result;
use logitkit_core::{Config, SamplingConfig};

pub fn execute(key: Option<&str>, value: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;

    match (key, value) {
        // Show all config
        (None, None) => {
            println!("Configuration file: {:?}\n", Config::config_path()?);
            println!("[sampling]");
            print_profile(&config.sampling);
            for (name, profile) in &config.presets {
                println!();
                println!("[presets.{}]", name);
                print_profile(profile);
            }
        }

        // Get a specific key
        (Some(key), None) => {
            let value = get_config_value(&config, key)?;
            println!("{}", value);
        }

        // Set a specific key
        (Some(key), Some(value)) => {
            set_config_value(&mut config, key, value)?;
            config.save()?;
            println!("Set {} = {}", key, value);
        }

        _ => unreachable!(),
    }

    Ok(())
}

fn print_profile(profile: &SamplingConfig) {
    for field in FIELDS {
        println!("  {} = {}", field, get_field(profile, field).unwrap_or_default());
    }
}

const FIELDS: [&str; 6] = ["temperature", "top_k", "top_p", "min_p", "greedy", "seed"];

/// Split `sampling.<field>` or `presets.<name>.<field>`.
fn split_key(key: &str) -> Result<(Option<&str>, &str)> {
    match key.split('.').collect::<Vec<_>>().as_slice() {
        ["sampling", field] => Ok((None, *field)),
        ["presets", name, field] => Ok((Some(*name), *field)),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
}

fn get_config_value(config: &Config, key: &str) -> Result<String> {
    let (preset, field) = split_key(key)?;
    get_field(config.profile(preset)?, field)
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let (preset, field) = split_key(key)?;
    let profile = match preset {
        None => &mut config.sampling,
        Some(name) => config.presets.entry(name.to_string()).or_default(),
    };
    set_field(profile, field, value)?;

    // reject values the sampler would refuse before they reach disk
    profile.pipeline()?;
    Ok(())
}

fn get_field(profile: &SamplingConfig, field: &str) -> Result<String> {
    fn opt<T: ToString>(v: Option<T>) -> String {
        v.map(|v| v.to_string()).unwrap_or_default()
    }

    match field {
        "temperature" => Ok(profile.temperature.to_string()),
        "top_k" => Ok(opt(profile.top_k)),
        "top_p" => Ok(opt(profile.top_p)),
        "min_p" => Ok(opt(profile.min_p)),
        "greedy" => Ok(profile.greedy.to_string()),
        "seed" => Ok(opt(profile.seed)),
        _ => anyhow::bail!("Unknown config field: {}", field),
    }
}

fn set_field(profile: &mut SamplingConfig, field: &str, value: &str) -> Result<()> {
    fn opt<T: std::str::FromStr>(value: &str) -> Result<Option<T>>
    where
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value.parse()?))
        }
    }

    match field {
        "temperature" => profile.temperature = value.parse()?,
        "top_k" => profile.top_k = opt(value)?,
        "top_p" => profile.top_p = opt(value)?,
        "min_p" => profile.min_p = opt(value)?,
        "greedy" => profile.greedy = value.parse()?,
        "seed" => profile.seed = opt(value)?,
        _ => anyhow::bail!("Unknown config field: {}", field),
    }
    Ok(())
}
