//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/coursecal/config.toml` by default. Command-line flags override
//! these values.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use coursecal_core::{DEFAULT_LEAD_MINUTES, OptimizeOptions, ParseOptions, RenderOptions};
use coursecal_core::codec::DEFAULT_PROD_ID;

use crate::error::{ClientError, ClientResult};

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the coursecal client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Settings for reading calendar files.
    pub import: ImportSettings,

    /// Settings for writing calendar files.
    pub export: ExportSettings,

    /// Series optimizer settings.
    pub optimize: OptimizeSettings,

    /// Time zone correction applied by `convert`.
    pub zone: ZoneSettings,
}

/// Settings for reading calendar files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Read `RRULE`/`EXDATE` lines into recurrences.
    pub import_recurrence: bool,

    /// Read `VALARM` blocks into alarms.
    pub import_alarms: bool,

    /// Continue with an empty calendar when a file fails to parse.
    pub lenient: bool,

    /// Offset east of UTC, in minutes, for timestamps without a `Z` suffix.
    pub zone_offset_minutes: i32,
}

/// Settings for writing calendar files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Value of the `PRODID:` header line.
    pub prod_id: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            prod_id: DEFAULT_PROD_ID.to_string(),
        }
    }
}

/// Series optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeSettings {
    /// Lead time of alarms added to new series.
    pub alarm_lead_minutes: u32,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            alarm_lead_minutes: DEFAULT_LEAD_MINUTES,
        }
    }
}

/// Daylight saving adjustment applied to every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DstMode {
    #[default]
    None,
    /// DST wall clock to a zone without DST.
    Fix,
    /// Wall clock without DST to DST.
    Set,
}

/// Time zone correction applied by `convert`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettings {
    /// Offset the calendar was written for, in minutes east of UTC.
    pub source_offset_minutes: Option<i64>,

    /// Offset to re-base the calendar onto, in minutes east of UTC.
    pub dest_offset_minutes: Option<i64>,

    pub dst: DstMode,
}

impl ZoneSettings {
    /// Returns the `(source, dest)` offsets in minutes when both are set.
    pub fn shift_minutes(&self) -> Option<(i64, i64)> {
        self.source_offset_minutes.zip(self.dest_offset_minutes)
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coursecal")
    }

    /// Builds parser options from the `[import]` section.
    pub fn parse_options(&self) -> ClientResult<ParseOptions> {
        let minutes = self.import.zone_offset_minutes;
        let zone = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ClientError::Config(format!("zone_offset_minutes {minutes} is out of range"))
            })?;

        Ok(ParseOptions::default()
            .with_zone(zone)
            .with_recurrence_import(self.import.import_recurrence)
            .with_alarm_import(self.import.import_alarms))
    }

    /// Builds render options from the `[export]` section.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::default().with_prod_id(self.export.prod_id.clone())
    }

    /// Builds optimizer options from the `[optimize]` section.
    pub fn optimize_options(&self) -> OptimizeOptions {
        OptimizeOptions {
            alarm_lead_minutes: self.optimize.alarm_lead_minutes,
        }
    }
}
