use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    /// Inline `<svg>` markup.
    #[default]
    Svg,
    /// PNG embedded as a base64 data URI.
    Png,
}

/// Chart settings read from the options file.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ChartOptions {
    #[serde(deserialize_with = "flexible_u32")]
    pub chart_width: u32,

    #[serde(deserialize_with = "flexible_u32")]
    pub chart_height: u32,

    pub chart_format: ChartFormat,

    /// Axis and legend labels longer than this are cut with an ellipsis.
    #[serde(deserialize_with = "flexible_usize")]
    pub max_label_len: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            chart_width: 1000,
            chart_height: 500,
            chart_format: ChartFormat::Svg,
            max_label_len: 24,
        }
    }
}

impl ChartOptions {
    /// A missing file is not an error: defaults are used.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Options file {:?} not found, using default chart options.", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file: {:?}", path))?;

        let options: ChartOptions = serde_json::from_str(&content)
            .context("JSON schema mismatch in options file")?;

        ensure!(
            (200..=4000).contains(&options.chart_width) && (150..=4000).contains(&options.chart_height),
            "chart size {}x{} is out of range",
            options.chart_width,
            options.chart_height
        );
        ensure!(options.max_label_len >= 4, "max_label_len must be at least 4");

        Ok(options)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrInt {
    Str(String),
    Int(u64),
}

/// Accepts both `800` and `"800"`.
fn flexible_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = flexible_u64(deserializer)?;
    u32::try_from(v).map_err(serde::de::Error::custom)
}

fn flexible_usize<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let v = flexible_u64(deserializer)?;
    usize::try_from(v).map_err(serde::de::Error::custom)
}

fn flexible_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::Int(i) => Ok(i),
        StringOrInt::Str(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom),
    }
}
