use std::path::Path;

use serde::Deserialize;

use crate::structs::quiz_type::{Seconds, SqlFile};
use crate::timer::DEFAULT_DURATION;
use crate::utils::read_file;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Seconds allowed per question
    pub question_duration: Seconds,
    /// Reporting endpoint URL. Reports are only logged locally when unset
    pub report_url: Option<String>,
    /// Host the SQLite-backed reporting endpoint at /exec
    pub serve_report_endpoint: bool,
    pub sheet_database: SqlFile,
    /// JSON question bank, the built-in science bank is used when unset
    pub question_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: "127.0.0.1:8081".to_string(),
            question_duration: DEFAULT_DURATION,
            report_url: None,
            serve_report_endpoint: true,
            sheet_database: "sheets.db".to_string(),
            question_file: None,
        }
    }
}

pub fn load_config(file_path: &str) -> Config {
    if !Path::new(file_path).exists() {
        log::warn!("Config file {} not found, using defaults", file_path);
        return Config::default();
    }
    let contents = match read_file(file_path) {
        Ok(contents) => contents,
        Err(e) => {
            log::error!("Failed to read config file {}: {}", file_path, e);
            return Config::default();
        }
    };
    let mut config = match toml::from_str::<Config>(&contents) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to parse config file {}: {}", file_path, e);
            return Config::default();
        }
    };
    // a zero-second question would expire before it is shown
    if config.question_duration == 0 {
        log::warn!("question_duration must be at least 1, using {}", DEFAULT_DURATION);
        config.question_duration = DEFAULT_DURATION;
    }
    config
}
