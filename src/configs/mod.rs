//! # Declarative Configuration
//!
//! [`LoggerOptions`] describes a logger in data: level, format, caller
//! reporting, and outputs. Options are read with `figment` from a JSON or TOML
//! file and then overridden by `RS_LOG_` environment variables, where `__`
//! separates nested keys (`RS_LOG_LEVEL=debug`, `RS_LOG_FILE__MAX_SIZE=1048576`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::core::error::LogError;
use crate::loggers::caller::CallerReporter;
use crate::loggers::formatter::Formatter;
use crate::loggers::json::JsonFormatter;
use crate::loggers::level::Level;
use crate::loggers::text::{ConsoleFormatter, TextFormatter};
use crate::loggers::{Logger, LoggerBuilder};
use crate::writers::{self, FileWriter, MultiWriter, SharedWriter};

/// Environment variable prefix read by [`LoggerOptions::load`].
pub const ENV_PREFIX: &str = "RS_LOG_";

/// Template used by the text format when none is configured.
pub const DEFAULT_TEXT_TEMPLATE: &str = "{time} {level@sc} {message} {caller} {fields}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
    Console,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    pub path: PathBuf,
    /// Rotation threshold in bytes, 0 disables rotation.
    pub max_size: u64,
    /// Backups to keep, 0 keeps all.
    pub max_backups: u32,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("app.log"),
            max_size: 0,
            max_backups: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    pub name: String,
    pub level: Level,
    pub format: OutputFormat,
    /// Renamed JSON keys, see [`JsonFormatter::new`].
    pub json_keys: HashMap<String, String>,
    pub json_full: bool,
    pub text_template: Option<String>,
    pub text_quote: bool,
    /// Default time layout; an empty string omits the time.
    pub time_layout: Option<String>,
    /// Caller reporting, as frames to skip above the call site.
    pub caller: Option<usize>,
    pub long_caller: bool,
    pub stack_prefixes: Vec<String>,
    pub file: Option<FileOptions>,
    /// Also write to stdout when a file is configured.
    pub stdout: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: Level::INFO,
            format: OutputFormat::Json,
            json_keys: HashMap::new(),
            json_full: false,
            text_template: None,
            text_quote: false,
            time_layout: None,
            caller: None,
            long_caller: false,
            stack_prefixes: Vec::new(),
            file: None,
            stdout: false,
        }
    }
}

impl LoggerOptions {
    /// Loads a JSON or TOML file (picked by extension) merged with the
    /// `RS_LOG_` environment. Fails if the file is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LogError::ConfigError(format!(
                "Local file not found: {}",
                path.display()
            )));
        }
        let figment = Figment::from(Serialized::defaults(LoggerOptions::default()));
        let figment = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => figment.merge(Toml::file(path)),
            _ => figment.merge(Json::file(path)),
        };
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Reads options from the `RS_LOG_` environment only.
    pub fn from_env() -> Result<Self, LogError> {
        Self::extract(
            Figment::from(Serialized::defaults(LoggerOptions::default()))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn extract(figment: Figment) -> Result<Self, LogError> {
        figment
            .extract()
            .map_err(|e| LogError::ConfigError(e.to_string()))
    }

    fn formatter(&self) -> Result<Arc<dyn Formatter>, LogError> {
        Ok(match self.format {
            OutputFormat::Json => Arc::new(JsonFormatter::new(&self.json_keys, self.json_full)?),
            OutputFormat::Text => Arc::new(TextFormatter::new(
                self.text_template.as_deref().unwrap_or(DEFAULT_TEXT_TEMPLATE),
                self.text_quote,
            )?),
            OutputFormat::Console => Arc::new(ConsoleFormatter),
        })
    }

    fn output(&self) -> Result<SharedWriter, LogError> {
        let Some(file) = &self.file else {
            return Ok(writers::stdout());
        };
        let file = FileWriter::open(&file.path, file.max_size, file.max_backups)?.into_shared();
        if self.stdout {
            Ok(MultiWriter::new([file, writers::stdout()]).into_shared())
        } else {
            Ok(file)
        }
    }

    /// Creates a ready logger from these options.
    pub fn build(&self) -> Result<Logger, LogError> {
        let formatter = self.formatter()?;
        let mut builder = LoggerBuilder::new(&self.name)
            .with_level(self.level)
            .with_output(self.output()?)
            .with_stack_prefixes(self.stack_prefixes.iter().cloned());
        if let Some(layout) = &self.time_layout {
            builder = builder.with_time_layout(layout);
        }
        if let Some(skip) = self.caller {
            builder = builder.with_caller(if self.long_caller {
                CallerReporter::long(skip)
            } else {
                CallerReporter::new(skip)
            });
        }
        let logger = builder.build()?;
        logger.set_formatter(Some(formatter));
        Ok(logger)
    }
}
