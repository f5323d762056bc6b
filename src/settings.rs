use std::path::PathBuf;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://aslfont.github.io/Symbol-Font-For-ASL/";
pub const DEFAULT_DICTIONARY_URL: &str = "https://www.signasl.org/sign/";

/// Runtime settings: built-in defaults, then `asl_lexicon.toml` in the working
/// directory if present, then `ASL_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub translations_path: PathBuf,
    pub template_path: PathBuf,
    pub output_path: PathBuf,
    pub dictionary_url: String,
    pub section_id: String,
    pub delay_min: f64,
    pub delay_max: f64,
    pub test_budget: usize,
    /// 0 disables checkpointing
    pub checkpoint_every: usize,
    pub normalize_meanings: bool,
    /// 0 keeps the HTTP client default
    pub timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name("asl_lexicon.toml").required(false))
            .add_source(Environment::with_prefix("ASL").try_parsing(true));
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = with_defaults(builder)?
            .build()
            .context("Failed to assemble settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings)
    }
}

fn with_defaults(builder: ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>> {
    Ok(builder
        .set_default("base_url", DEFAULT_BASE_URL)?
        .set_default("translations_path", "translations.json")?
        .set_default("template_path", "base.html")?
        .set_default("output_path", "index.html")?
        .set_default("dictionary_url", DEFAULT_DICTIONARY_URL)?
        .set_default("section_id", "sections")?
        .set_default("delay_min", 1.0)?
        .set_default("delay_max", 3.0)?
        .set_default("test_budget", 20i64)?
        .set_default("checkpoint_every", 0i64)?
        .set_default("normalize_meanings", true)?
        .set_default("timeout_secs", 0i64)?)
}
