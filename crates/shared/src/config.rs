use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "facebook/bart-large-cnn";

const SETUP_HELP: &str = "To fix this, create config.json in the current directory with:\n  \
    {\n    \
    \"PIAZZA_EMAIL\": \"you@school.edu\",\n    \
    \"PIAZZA_PASSWORD\": \"your_password\",\n    \
    \"PIAZZA_CLASSCODE\": \"your_class_network_id\"\n  \
    }\n\n\
    or set the same keys in ~/.config/piazza-summary/.env";

#[derive(Debug, Clone)]
pub struct Config {
    pub email: String,
    pub password: String,
    pub class_code: String,
    pub hf_api_token: Option<String>,
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "PIAZZA_EMAIL")]
    email: String,
    #[serde(rename = "PIAZZA_PASSWORD")]
    password: String,
    #[serde(rename = "PIAZZA_CLASSCODE")]
    class_code: String,
    #[serde(rename = "HF_API_TOKEN", default)]
    hf_api_token: Option<String>,
    #[serde(rename = "SUMMARY_MODEL", default)]
    model: Option<String>,
}

impl Config {
    /// Load from an explicit JSON file, `./config.json`, or the environment, in that order
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let local = PathBuf::from("config.json");
        if local.exists() {
            return Self::from_file(&local);
        }

        Self::from_env()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Invalid config file {}.\n\n{}", path.display(), SETUP_HELP))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(content).context("Failed to parse config JSON")?;

        Ok(Self {
            email: file.email,
            password: file.password,
            class_code: file.class_code,
            hf_api_token: file.hf_api_token.filter(|t| !t.is_empty()),
            model: file.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::try_load_dotenv();

        let email = env::var("PIAZZA_EMAIL")
            .with_context(|| format!("PIAZZA_EMAIL not found.\n\n{}", SETUP_HELP))?;
        let password = env::var("PIAZZA_PASSWORD")
            .with_context(|| format!("PIAZZA_PASSWORD not found.\n\n{}", SETUP_HELP))?;
        let class_code = env::var("PIAZZA_CLASSCODE")
            .with_context(|| format!("PIAZZA_CLASSCODE not found.\n\n{}", SETUP_HELP))?;

        Ok(Self {
            email,
            password,
            class_code,
            hf_api_token: env::var("HF_API_TOKEN").ok().filter(|t| !t.is_empty()),
            model: env::var("SUMMARY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }

    fn try_load_dotenv() {
        // 1. Current directory
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/piazza-summary/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("piazza-summary").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}
