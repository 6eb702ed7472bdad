//! CLI command implementations
//!
//! Each command returns the JSON value to print; `main` owns the output.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use mantic_detect::{DetectionRequest, Detector, PresetOptions, PRESETS};
use mantic_kernel::{temporal_multiplier, TemporalKernel, TemporalParams};
use serde_json::{json, Value};
use tracing::debug;

/// Read a file, or stdin for `-`.
fn read_source(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading request from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {source}"))
    }
}

pub fn detect(detector: &Detector, source: &str) -> anyhow::Result<Value> {
    let text = read_source(source)?;
    let request: DetectionRequest =
        serde_json::from_str(&text).context("parsing detection request")?;
    debug!(domain = %request.domain_name, mode = %request.mode, "Request parsed");

    let result = detector.detect(&request)?;
    serde_json::to_value(&result).context("serializing detection result")
}

/// Parse `--values`; `null` (or `none`) marks a missing layer.
pub fn parse_values(raw: &[String]) -> anyhow::Result<Vec<Option<f64>>> {
    raw.iter()
        .enumerate()
        .map(|(i, s)| {
            let s = s.trim();
            if s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("none") {
                return Ok(None);
            }
            s.parse::<f64>()
                .map(Some)
                .with_context(|| format!("value {i} ('{s}') is not a number or null"))
        })
        .collect()
}

pub fn preset(
    detector: &Detector,
    name: &str,
    values: &[String],
    options: Option<&Path>,
) -> anyhow::Result<Value> {
    if values.is_empty() {
        bail!("--values is required, e.g. --values 0.8,0.3,null,0.7");
    }
    let layer_values = parse_values(values)?;

    let options = match options {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<PresetOptions>(&text).context("parsing preset options")?
        }
        None => PresetOptions::default(),
    };

    let result = detector.detect_preset(name, &layer_values, &options)?;
    serde_json::to_value(&result).context("serializing detection result")
}

pub fn presets() -> anyhow::Result<Value> {
    serde_json::to_value(PRESETS).context("serializing presets")
}

pub fn kernels(t: f64, alpha: Option<f64>, n: Option<f64>) -> anyhow::Result<Value> {
    let defaults = TemporalParams::default();
    let params = TemporalParams {
        t,
        alpha: alpha.unwrap_or(defaults.alpha),
        n: n.unwrap_or(defaults.n),
        ..defaults
    };

    let multipliers: BTreeMap<&str, f64> = TemporalKernel::ALL
        .into_iter()
        .map(|k| (k.as_str(), temporal_multiplier(k, &params)))
        .collect();

    Ok(json!({
        "params": params,
        "multipliers": multipliers,
    }))
}
