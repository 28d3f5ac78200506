//! Suite configuration.
//!
//! Sources, later ones winning: built-in defaults, `vitrine.yaml` (or an
//! explicit file), `VITRINE_*` environment variables, then CLI flags applied
//! by the caller through the builder methods.

use crate::result::{VitrineError, VitrineResult};
use crate::wait::Timeouts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "vitrine.yaml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "VITRINE_";

/// Browser window size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Base URLs of the public REST APIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpoints {
    /// Cat Fact API
    pub cat_fact: String,
    /// Wizard World API
    pub wizard_world: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            cat_fact: "https://catfact.ninja".to_string(),
            wizard_world: "https://wizard-world-api.herokuapp.com".to_string(),
        }
    }
}

/// Reference screenshots and how strictly captures are compared with them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotSettings {
    /// Directory holding the reference PNGs
    pub dir: PathBuf,
    /// Pixels allowed to differ before a capture fails
    pub max_diff_pixels: usize,
    /// Summed RGB distance under which two pixels count as equal
    pub color_threshold: u8,
    /// Overwrite references with the capture instead of failing
    pub update: bool,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./screenshots"),
            max_diff_pixels: 0,
            color_threshold: 30,
            update: false,
        }
    }
}

/// Everything a run needs to know about its environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Run the browser without a window
    pub headless: bool,
    /// Window size
    pub viewport: Viewport,
    /// Chromium executable; auto-detected when unset
    pub chromium_path: Option<PathBuf>,
    /// Keep the Chromium sandbox enabled
    pub sandbox: bool,
    /// Deadlines for navigation, actions and expectations
    pub timeouts: Timeouts,
    /// Per-test deadline in milliseconds
    pub test_timeout_ms: u64,
    /// Where downloads are saved
    pub download_dir: PathBuf,
    /// Concurrently running tests
    pub workers: usize,
    /// REST API base URLs
    pub api: ApiEndpoints,
    /// Screenshot comparison
    pub screenshots: ScreenshotSettings,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            chromium_path: None,
            sandbox: true,
            timeouts: Timeouts::default(),
            test_timeout_ms: 60_000,
            download_dir: PathBuf::from(crate::page::DEFAULT_DOWNLOAD_DIR),
            workers: crate::harness::DEFAULT_WORKERS,
            api: ApiEndpoints::default(),
            screenshots: ScreenshotSettings::default(),
        }
    }
}

impl SuiteConfig {
    /// Parse YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> VitrineResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from `path`, or from `vitrine.yaml` when it exists, then apply the environment
    pub fn load(path: Option<&Path>) -> VitrineResult<Self> {
        let mut config = match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path).map_err(|err| {
                    VitrineError::config(format!("cannot read {}: {err}", path.display()))
                })?;
                Self::from_yaml_str(&yaml)?
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_yaml_str(&std::fs::read_to_string(DEFAULT_CONFIG_FILE)?)?
            }
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `VITRINE_*` variables
    pub fn apply_env<I>(&mut self, vars: I) -> VitrineResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "HEADLESS" => self.headless = parse_bool(&key, &value)?,
                "SANDBOX" => self.sandbox = parse_bool(&key, &value)?,
                "CHROMIUM_PATH" => self.chromium_path = Some(PathBuf::from(value)),
                "DOWNLOAD_DIR" => self.download_dir = PathBuf::from(value),
                "WORKERS" => self.workers = parse_num(&key, &value)?,
                "TEST_TIMEOUT_MS" => self.test_timeout_ms = parse_num(&key, &value)?,
                "NAVIGATION_TIMEOUT_MS" => {
                    self.timeouts.navigation = Duration::from_millis(parse_num(&key, &value)?);
                }
                "ACTION_TIMEOUT_MS" => {
                    self.timeouts.action = Duration::from_millis(parse_num(&key, &value)?);
                }
                "EXPECT_TIMEOUT_MS" => {
                    self.timeouts.expect = Duration::from_millis(parse_num(&key, &value)?);
                }
                "SCREENSHOT_DIR" => self.screenshots.dir = PathBuf::from(value),
                "UPDATE_SCREENSHOTS" => self.screenshots.update = parse_bool(&key, &value)?,
                "CAT_FACT_URL" => self.api.cat_fact = value,
                "WIZARD_WORLD_URL" => self.api.wizard_world = value,
                _ => tracing::debug!(variable = %key, "ignoring unknown variable"),
            }
        }
        Ok(())
    }

    /// Reject values no run can use
    pub fn validate(&self) -> VitrineResult<()> {
        if self.workers == 0 {
            return Err(VitrineError::config("workers must be at least 1"));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(VitrineError::config("viewport must be non-empty"));
        }
        if self.timeouts.poll_interval.is_zero() {
            return Err(VitrineError::config("poll interval must be positive"));
        }
        Ok(())
    }

    /// Per-test deadline
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the worker count
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the download directory
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Set the Chromium executable
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> VitrineResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

fn parse_bool(key: &str, value: &str) -> VitrineResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(VitrineError::config(format!("{key}: expected a boolean, got {value:?}"))),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> VitrineResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| VitrineError::config(format!("{key}: expected a number, got {value:?}")))
}
