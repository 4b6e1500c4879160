/**
 * Preflight checks for datasets, models and audio devices
 *
 * Tells the user up front which parts of the toolbox will be unavailable.
 * Emits events for UI feedback and returns structured report.
 */
use serde::{Deserialize, Serialize};
use std::path::Path;
use tauri::{AppHandle, Emitter};

use crate::audio::AudioDevices;
use crate::browser;
use crate::config::ToolboxConfig;
use crate::models;

/// Status of an individual preflight check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Individual preflight check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightItem {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub fix_hint: Option<String>,
}

impl PreflightItem {
    fn pass(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            message,
            fix_hint: None,
        }
    }

    fn flag(name: &str, status: CheckStatus, message: String, fix_hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
            fix_hint: Some(fix_hint.to_string()),
        }
    }
}

/// Complete preflight report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightReport {
    pub items: Vec<PreflightItem>,
    pub overall: CheckStatus,
    pub can_proceed: bool,
}

impl PreflightReport {
    fn from_items(items: Vec<PreflightItem>) -> Self {
        let overall = if items.iter().any(|i| i.status == CheckStatus::Fail) {
            CheckStatus::Fail
        } else if items.iter().any(|i| i.status == CheckStatus::Warn) {
            CheckStatus::Warn
        } else {
            CheckStatus::Pass
        };
        let can_proceed = overall != CheckStatus::Fail;

        Self {
            items,
            overall,
            can_proceed,
        }
    }
}

/// Run all checks without touching the UI
pub fn collect_checks(toolbox: &ToolboxConfig, devices: &AudioDevices) -> Vec<PreflightItem> {
    let mut items = vec![check_datasets_root(toolbox.datasets_root.as_deref())];
    if let Some(root) = toolbox.datasets_root.as_deref() {
        items.push(check_recognized_datasets(root, &toolbox.recognized_datasets));
    }
    items.push(check_models(&toolbox.run_id, &toolbox.models_dir));
    items.push(check_input_device(devices));
    items.push(check_output_device(devices));
    items
}

/// Run all preflight checks and emit events
pub fn run_preflight(
    app: &AppHandle,
    toolbox: &ToolboxConfig,
    devices: &AudioDevices,
) -> PreflightReport {
    log::info!("Starting preflight checks...");

    let _ = app.emit("preflight:started", ());

    let items = collect_checks(toolbox, devices);
    for item in &items {
        let _ = app.emit("preflight:item", item);
    }

    let report = PreflightReport::from_items(items);
    let _ = app.emit("preflight:done", &report);

    log::info!("Preflight complete: {:?}", report.overall);
    report
}

fn check_datasets_root(root: Option<&Path>) -> PreflightItem {
    match root {
        Some(root) if root.is_dir() => {
            PreflightItem::pass("datasets_root", format!("Datasets root: {}", root.display()))
        }
        Some(root) => PreflightItem::flag(
            "datasets_root",
            CheckStatus::Warn,
            format!("Datasets root does not exist: {}", root.display()),
            "Set toolbox.datasets_root in config.toml to the directory holding your datasets",
        ),
        None => PreflightItem::flag(
            "datasets_root",
            CheckStatus::Warn,
            "No datasets root configured, the browser is disabled".to_string(),
            "Set toolbox.datasets_root in config.toml, or record samples yourself",
        ),
    }
}

fn check_recognized_datasets(root: &Path, recognized: &[String]) -> PreflightItem {
    let found = browser::list_datasets(root, recognized);
    if found.is_empty() {
        PreflightItem::flag(
            "datasets",
            CheckStatus::Warn,
            format!("None of the recognized datasets were found in {}", root.display()),
            "Extract e.g. LibriSpeech/dev-clean or VCTK-Corpus/wav48 under the datasets root",
        )
    } else {
        PreflightItem::pass(
            "datasets",
            format!("{} recognized dataset(s) found", found.len()),
        )
    }
}

fn check_models(run_id: &str, models_dir: &Path) -> PreflightItem {
    match models::discover(run_id, models_dir) {
        Ok(catalog) => PreflightItem::pass(
            "models",
            format!(
                "Run '{}': {} vocoder option(s)",
                run_id,
                catalog.vocoders.len()
            ),
        ),
        Err(e) => PreflightItem::flag(
            "models",
            CheckStatus::Fail,
            e.to_string(),
            "Place encoder.pt, synthesizer.pt and the emotion encoder .hdf5 under <models_dir>/<run_id>/",
        ),
    }
}

fn check_input_device(devices: &AudioDevices) -> PreflightItem {
    match devices.input_device() {
        Some(name) => PreflightItem::pass("input_device", format!("Recording through {}", name)),
        None => PreflightItem::flag(
            "input_device",
            CheckStatus::Warn,
            "No audio input device detected. Recording may not work.".to_string(),
            "Your device must be connected before you start the toolbox.",
        ),
    }
}

fn check_output_device(devices: &AudioDevices) -> PreflightItem {
    if devices.outputs.is_empty() {
        PreflightItem::flag(
            "output_device",
            CheckStatus::Warn,
            format!(
                "No output device supports {} Hz. Audio output may not work.",
                devices.sample_rate
            ),
            "Connect headphones or speakers, then restart the toolbox",
        )
    } else {
        PreflightItem::pass(
            "output_device",
            format!("{} output device(s) available", devices.outputs.len()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixtures::DatasetTree;

    fn devices(inputs: &[&str], outputs: &[&str]) -> AudioDevices {
        AudioDevices {
            sample_rate: 16000,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_no_root_warns_and_skips_dataset_check() {
        let toolbox = ToolboxConfig::default();
        let items = collect_checks(&toolbox, &devices(&["mic"], &["speakers"]));

        assert_eq!(items[0].name, "datasets_root");
        assert_eq!(items[0].status, CheckStatus::Warn);
        assert!(items.iter().all(|i| i.name != "datasets"));
    }

    #[test]
    fn test_full_setup_passes() {
        let data = DatasetTree::new("preflight-data");
        data.file("LJSpeech-1.1/wavs/LJ001-0001.wav");
        let models = DatasetTree::new("preflight-models");
        models
            .file("default/encoder.pt")
            .file("default/e/w.hdf5")
            .file("default/synthesizer.pt");

        let toolbox = ToolboxConfig {
            datasets_root: Some(data.path().to_path_buf()),
            models_dir: models.path().to_path_buf(),
            ..ToolboxConfig::default()
        };
        let report = PreflightReport::from_items(collect_checks(
            &toolbox,
            &devices(&["mic"], &["speakers"]),
        ));

        assert_eq!(report.items.len(), 5);
        assert_eq!(report.overall, CheckStatus::Pass);
        assert!(report.can_proceed);
    }

    #[test]
    fn test_missing_models_fail() {
        let models = DatasetTree::new("preflight-nomodels");
        let toolbox = ToolboxConfig {
            models_dir: models.path().to_path_buf(),
            ..ToolboxConfig::default()
        };
        let report =
            PreflightReport::from_items(collect_checks(&toolbox, &devices(&[], &[])));

        assert_eq!(report.overall, CheckStatus::Fail);
        assert!(!report.can_proceed);
        let inputs = report.items.iter().find(|i| i.name == "input_device").unwrap();
        assert_eq!(inputs.status, CheckStatus::Warn);
    }
}
