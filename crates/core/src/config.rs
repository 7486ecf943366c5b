use anyhow::Result;
use logitkit_sampling::{Pipeline, SampleError, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default sampling profile
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Named sampling profiles
    #[serde(default = "default_presets")]
    pub presets: BTreeMap<String, SamplingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Temperature in [0, 2]; 0 means greedy
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Keep only the k highest scores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,

    /// Nucleus threshold in (0, 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    /// Min-p threshold in (0, 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f64>,

    /// Pick the argmax instead of drawing at random
    #[serde(default)]
    pub greedy: bool,

    /// Seed for reproducible draws
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_presets() -> BTreeMap<String, SamplingConfig> {
    let mut presets = BTreeMap::new();
    presets.insert(
        "greedy".to_string(),
        SamplingConfig {
            temperature: 0.0,
            ..SamplingConfig::default()
        },
    );
    presets.insert(
        "nucleus".to_string(),
        SamplingConfig {
            top_p: Some(0.9),
            ..SamplingConfig::default()
        },
    );
    presets.insert(
        "creative".to_string(),
        SamplingConfig {
            temperature: 1.2,
            min_p: Some(0.05),
            ..SamplingConfig::default()
        },
    );
    presets
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            presets: default_presets(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_k: None,
            top_p: None,
            min_p: None,
            greedy: false,
            seed: None,
        }
    }
}

impl SamplingConfig {
    /// Strategies in the conventional order: temperature, top-k, top-p,
    /// min-p, then the selector.
    pub fn strategies(&self) -> Vec<Strategy> {
        let mut strategies = vec![Strategy::Temperature(self.temperature)];
        strategies.extend(self.top_k.map(Strategy::TopK));
        strategies.extend(self.top_p.map(Strategy::TopP));
        strategies.extend(self.min_p.map(Strategy::MinP));
        strategies.push(if self.greedy {
            Strategy::Greedy
        } else {
            Strategy::Weighted
        });
        strategies
    }

    /// Build a pipeline, rejecting out-of-range parameters up front.
    pub fn pipeline(&self) -> std::result::Result<Pipeline, SampleError> {
        let pipeline = Pipeline::new(self.strategies());
        pipeline.validate()?;
        Ok(pipeline)
    }
}

impl Config {
    /// Get the base directory: ~/.config/logitkit/
    pub fn base_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("USERPROFILE").map(PathBuf::from))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".config").join("logitkit"))
    }

    /// Get the config file path: ~/.config/logitkit/config.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// The default profile, or the named preset
    pub fn profile(&self, preset: Option<&str>) -> Result<&SamplingConfig> {
        match preset {
            None => Ok(&self.sampling),
            Some(name) => self
                .presets
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown preset: {}", name)),
        }
    }

    /// Build a validated pipeline for the default profile or a preset
    pub fn pipeline(&self, preset: Option<&str>) -> Result<Pipeline> {
        Ok(self.profile(preset)?.pipeline()?)
    }
}
