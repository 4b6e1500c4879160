//! Enable/label state of the panel's buttons and checkboxes

use serde::Serialize;

pub const RECORD_LABEL: &str = "Record";
pub const RECORDING_LABEL: &str = "Recording...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub label: String,
    pub enabled: bool,
}

impl Button {
    fn new(label: &str, enabled: bool) -> Self {
        Self {
            label: label.to_string(),
            enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkbox {
    pub checked: bool,
    pub enabled: bool,
}

/// Seed, trimming and vocoder options under the text prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenOptions {
    /// Checked means the seed in `seed_text` is used (deterministic output)
    pub random_seed: bool,
    pub seed_text: String,
    pub seed_editable: bool,
    pub trim_silences: Checkbox,
    pub griffin_lim: bool,
    pub text_prompt: String,
}

impl GenOptions {
    pub fn new(text_prompt: &str) -> Self {
        Self {
            random_seed: false,
            seed_text: String::new(),
            seed_editable: false,
            trim_silences: Checkbox {
                checked: false,
                enabled: true,
            },
            griffin_lim: false,
            text_prompt: text_prompt.to_string(),
        }
    }
}

/// Progress bar; both fields are the caller's values scaled by 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadingBar {
    pub value: u64,
    pub maximum: u64,
    pub text_visible: bool,
}

impl Default for LoadingBar {
    fn default() -> Self {
        Self {
            value: 0,
            maximum: 100,
            text_visible: false,
        }
    }
}

impl LoadingBar {
    pub fn set(&mut self, value: f32, maximum: f32) {
        self.value = scale(value);
        self.maximum = scale(maximum);
        self.text_visible = value != 0.0;
    }
}

fn scale(v: f32) -> u64 {
    (v.max(0.0) * 100.0).round() as u64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlsState {
    pub browser_load: Button,
    pub random_dataset: Button,
    pub random_speaker: Button,
    pub random_utterance: Button,
    pub auto_next: Checkbox,
    pub browse: Button,
    pub record: Button,
    pub play: Button,
    pub stop: Button,
    pub generate: Button,
    pub synthesize: Button,
    pub vocode: Button,
    pub replay: Button,
    pub export: Button,
    pub clear: Button,
    pub gen: GenOptions,
    pub loading: LoadingBar,
}

impl ControlsState {
    pub fn new(text_prompt: &str, auto_next: bool) -> Self {
        Self {
            browser_load: Button::new("Load", true),
            random_dataset: Button::new("Random", true),
            random_speaker: Button::new("Random", true),
            random_utterance: Button::new("Random", true),
            auto_next: Checkbox {
                checked: auto_next,
                enabled: true,
            },
            browse: Button::new("Browse", true),
            record: Button::new(RECORD_LABEL, true),
            play: Button::new("Play", false),
            stop: Button::new("Stop", true),
            generate: Button::new("Synthesize and vocode", false),
            synthesize: Button::new("Synthesize only", false),
            vocode: Button::new("Vocode only", false),
            replay: Button::new("Replay", false),
            export: Button::new("Export", false),
            clear: Button::new("Clear", true),
            gen: GenOptions::new(text_prompt),
            loading: LoadingBar::default(),
        }
    }

    /// Everything that needs a dataset tree
    pub fn set_browser_enabled(&mut self, enabled: bool) {
        self.random_dataset.enabled = enabled;
        self.random_speaker.enabled = enabled;
        self.random_utterance.enabled = enabled;
        self.browser_load.enabled = enabled;
        self.auto_next.enabled = enabled;
    }

    /// Everything that needs a registered utterance
    pub fn set_utterance_actions_enabled(&mut self, enabled: bool) {
        self.play.enabled = enabled;
        self.generate.enabled = enabled;
        self.synthesize.enabled = enabled;
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.record.label = if recording {
            RECORDING_LABEL
        } else {
            RECORD_LABEL
        }
        .to_string();
        self.record.enabled = !recording;
    }
}
