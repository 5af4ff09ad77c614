//! Simulation settings
//!
//! Read from either a JSON object or the legacy `KEY=VALUE` config file.
//! Every field falls back to its default on its own: absent fields quietly,
//! malformed ones with a warning. Only a file that cannot be read at all, or
//! JSON that is not an object, is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::consts::{DEFAULT_SPEED_MULTIPLIER, DEFAULT_STEP_MS};
use crate::sim::broad_phase::{AxisSweep, BroadPhase, BruteForce};

/// Error type for loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The text is not JSON at all.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON parsed but is not an object.
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Broad-phase strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BroadPhaseKind {
    BruteForce,
    #[default]
    AxisSweep,
}

impl BroadPhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadPhaseKind::BruteForce => "brute_force",
            BroadPhaseKind::AxisSweep => "axis_sweep",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "brute_force" | "simple" | "brute" => Some(BroadPhaseKind::BruteForce),
            "axis_sweep" | "sweep" | "aabb" => Some(BroadPhaseKind::AxisSweep),
            _ => None,
        }
    }

    /// A fresh strategy instance
    pub fn build(&self) -> Box<dyn BroadPhase> {
        match self {
            BroadPhaseKind::BruteForce => Box::new(BruteForce),
            BroadPhaseKind::AxisSweep => Box::new(AxisSweep),
        }
    }
}

/// Settings handed to the physics driver at construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Simulated milliseconds per frame
    pub step_ms: u64,
    /// Ratio of simulated to wall-clock time
    pub speed_multiplier: f64,
    pub broad_phase: BroadPhaseKind,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            step_ms: DEFAULT_STEP_MS,
            speed_multiplier: DEFAULT_SPEED_MULTIPLIER,
            broad_phase: BroadPhaseKind::default(),
        }
    }
}

/// A raw setting, before validation
enum Raw<'a> {
    Json(&'a Value),
    Text(&'a str),
}

impl Raw<'_> {
    fn step_ms(&self) -> Option<u64> {
        let ms: Option<u64> = match self {
            Raw::Json(value) => value.as_u64(),
            Raw::Text(text) => text.trim().parse().ok(),
        };
        ms.filter(|&ms| ms > 0)
    }

    fn multiplier(&self) -> Option<f64> {
        let multiplier: Option<f64> = match self {
            Raw::Json(value) => value.as_f64(),
            Raw::Text(text) => text.trim().parse().ok(),
        };
        multiplier.filter(|m| m.is_finite() && *m > 0.0)
    }

    fn broad_phase(&self) -> Option<BroadPhaseKind> {
        match self {
            Raw::Json(value) => value.as_str().and_then(BroadPhaseKind::from_str),
            Raw::Text(text) => BroadPhaseKind::from_str(text),
        }
    }

    fn describe(&self) -> String {
        match self {
            Raw::Json(value) => value.to_string(),
            Raw::Text(text) => format!("{:?}", text.trim()),
        }
    }
}

/// Validated value, or the default with a warning
fn field<'a, T>(
    key: &str,
    raw: Option<Raw<'a>>,
    parse: impl Fn(&Raw<'a>) -> Option<T>,
    default: T,
) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match parse(&raw) {
        Some(value) => value,
        None => {
            log::warn!("invalid value {} for {key}, using the default", raw.describe());
            default
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl SimConfig {
    /// Read settings from a JSON object with keys `step_ms`,
    /// `speed_multiplier` and `broad_phase`. Unknown keys are ignored.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(map) = &value else {
            return Err(ConfigError::NotAnObject(json_type(&value)));
        };
        Ok(Self::from_map(map))
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| map.get(key).map(Raw::Json);
        Self {
            step_ms: field("step_ms", get("step_ms"), Raw::step_ms, defaults.step_ms),
            speed_multiplier: field(
                "speed_multiplier",
                get("speed_multiplier"),
                Raw::multiplier,
                defaults.speed_multiplier,
            ),
            broad_phase: field(
                "broad_phase",
                get("broad_phase"),
                Raw::broad_phase,
                defaults.broad_phase,
            ),
        }
    }

    /// Read settings from `KEY=VALUE` lines (`PHYSICS_DT`,
    /// `PHYSICS_MULTIPLIER`, `BROAD_PHASE`). Blank lines and lines starting
    /// with `//` are skipped; later keys override earlier ones.
    pub fn from_conf(text: &str) -> Self {
        let mut step_ms = None;
        let mut multiplier = None;
        let mut broad_phase = None;

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("config line {} has no '=': {line:?}", number + 1);
                continue;
            };
            match key.trim() {
                "PHYSICS_DT" => step_ms = Some(value),
                "PHYSICS_MULTIPLIER" => multiplier = Some(value),
                "BROAD_PHASE" => broad_phase = Some(value),
                other => log::debug!("ignoring config key {other}"),
            }
        }

        let defaults = Self::default();
        Self {
            step_ms: field("PHYSICS_DT", step_ms.map(Raw::Text), Raw::step_ms, defaults.step_ms),
            speed_multiplier: field(
                "PHYSICS_MULTIPLIER",
                multiplier.map(Raw::Text),
                Raw::multiplier,
                defaults.speed_multiplier,
            ),
            broad_phase: field(
                "BROAD_PHASE",
                broad_phase.map(Raw::Text),
                Raw::broad_phase,
                defaults.broad_phase,
            ),
        }
    }

    /// Load from a file: JSON when the extension is `.json`, otherwise the
    /// `KEY=VALUE` format. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::warn!("config file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json(&text)?
        } else {
            Self::from_conf(&text)
        };
        log::info!("loaded settings from {}", path.display());
        Ok(config)
    }
}
