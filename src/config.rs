//! Board configuration parsed from JSON files and environment variables.
//!
//! All sources start from [`BoardConfig::default`]; JSON fields and
//! environment variables override individual values. Call
//! [`BoardConfig::normalized`] before use to clamp numerics into range.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::{
    DEFAULT_ERASER_RADIUS, DEFAULT_HISTORY_CAPACITY, DEFAULT_PADDING_PX, MIN_DEVICE_PIXEL_RATIO, MIN_ERASER_RADIUS,
    PEN_MIN_DISTANCE,
};
use crate::render::RenderStyle;
use crate::tools::{ToolId, ToolSettings};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },
}

/// Settings for each built-in tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub select: ToolSettings,
    pub line: ToolSettings,
    pub pen: ToolSettings,
    pub arrow: ToolSettings,
    pub cone: ToolSettings,
    pub eraser: ToolSettings,
}

impl ToolConfig {
    #[must_use]
    pub fn get(&self, id: ToolId) -> &ToolSettings {
        match id {
            ToolId::Select => &self.select,
            ToolId::Line => &self.line,
            ToolId::Pen => &self.pen,
            ToolId::Arrow => &self.arrow,
            ToolId::Cone => &self.cone,
            ToolId::Eraser => &self.eraser,
        }
    }

    pub fn get_mut(&mut self, id: ToolId) -> &mut ToolSettings {
        match id {
            ToolId::Select => &mut self.select,
            ToolId::Line => &mut self.line,
            ToolId::Pen => &mut self.pen,
            ToolId::Arrow => &mut self.arrow,
            ToolId::Cone => &mut self.cone,
            ToolId::Eraser => &mut self.eraser,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    /// Fit padding in CSS pixels.
    pub padding: f64,
    pub history_capacity: usize,
    pub device_pixel_ratio: f64,
    pub tools: ToolConfig,
    pub style: RenderStyle,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING_PX,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            device_pixel_ratio: 1.0,
            tools: ToolConfig::default(),
            style: RenderStyle::default(),
        }
    }
}

impl BoardConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed input.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if it does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
    }

    /// Defaults overlaid with environment variables.
    ///
    /// Optional:
    /// - `FIELDBOARD_PADDING`: fit padding in CSS pixels
    /// - `FIELDBOARD_HISTORY_CAPACITY`: undo/redo depth
    /// - `FIELDBOARD_DPR`: device pixel ratio
    /// - `FIELDBOARD_ERASER_RADIUS`: eraser radius in field units
    /// - `FIELDBOARD_PEN_MIN_DISTANCE`: pen decimation threshold in field units
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// Overlay the `FIELDBOARD_*` environment variables onto `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a set variable does not parse.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(env_var)
    }

    /// Overlay values found through `lookup` (an environment-like getter).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a present value does not parse.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(padding) = parse_var(&lookup, "FIELDBOARD_PADDING")? {
            self.padding = padding;
        }
        if let Some(capacity) = parse_var(&lookup, "FIELDBOARD_HISTORY_CAPACITY")? {
            self.history_capacity = capacity;
        }
        if let Some(dpr) = parse_var(&lookup, "FIELDBOARD_DPR")? {
            self.device_pixel_ratio = dpr;
        }
        if let Some(radius) = parse_var(&lookup, "FIELDBOARD_ERASER_RADIUS")? {
            self.tools.eraser.radius = Some(radius);
        }
        if let Some(min_distance) = parse_var(&lookup, "FIELDBOARD_PEN_MIN_DISTANCE")? {
            self.tools.pen.min_distance = Some(min_distance);
        }
        Ok(self)
    }

    /// Clamp every numeric into a usable range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if !self.padding.is_finite() || self.padding < 0.0 {
            warn!(padding = self.padding, "invalid padding; using default");
            self.padding = DEFAULT_PADDING_PX;
        }
        self.history_capacity = self.history_capacity.max(1);
        if !self.device_pixel_ratio.is_finite() || self.device_pixel_ratio < MIN_DEVICE_PIXEL_RATIO {
            warn!(dpr = self.device_pixel_ratio, "invalid device pixel ratio; using 1");
            self.device_pixel_ratio = 1.0;
        }
        if let Some(radius) = self.tools.eraser.radius {
            self.tools.eraser.radius =
                Some(if radius.is_finite() { radius.max(MIN_ERASER_RADIUS) } else { DEFAULT_ERASER_RADIUS });
        }
        if let Some(min_distance) = self.tools.pen.min_distance {
            self.tools.pen.min_distance =
                Some(if min_distance.is_finite() && min_distance >= 0.0 { min_distance } else { PEN_MIN_DISTANCE });
        }
        self.style = self.style.normalized();
        self
    }
}

fn env_var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv { var: var.to_string(), value: raw })
}
