// Library exports for Tauri
// Shared by the `toolbox` binary and the unit tests

pub mod audio;
pub mod browser;
pub mod config;
pub mod models;
pub mod panel;
pub mod paths;
pub mod plots;
pub mod preflight;
pub mod projection;
pub mod utterance;
pub mod validation;
