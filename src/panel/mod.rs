//! Presentation model of the toolbox window
//!
//! `ControlPanel` owns every piece of UI state (selection boxes, histories,
//! log, loading bar, button states) and pushes each change to the view through
//! a `PanelSink`. Orchestration code calls the `draw_*` operations after
//! inference to refresh the plots.

pub mod controls;
pub mod history;
pub mod log;
pub mod selection;

use anyhow::Result;
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::{AudioConfig, AudioDevices};
use crate::browser;
use crate::config::{ToolboxConfig, UiConfig};
use crate::models::{self, ModelError};
use crate::plots::{
    self, Marker, PlotUpdate, ProjectedPoint, ProjectionPlot, Which, EMOTION_EMBED_SHAPE,
};
use crate::projection::{CosinePca, ProjectionParams, Projector};
use crate::utterance::{Matrix, Utterance};
use crate::validation::{self, ValidationError};

use self::controls::{ControlsState, LoadingBar};
use self::history::MruList;
use self::log::{LogBuffer, LogMode, MAX_LOG_LINES};
use self::selection::{BoxSnapshot, SelectionBox, SelectionItem};

/// Fewest points the projection plots need
pub const MIN_PROJECTION_POINTS: usize = 4;

pub const NO_OUTPUT_DEVICE: &str = "None";

const FIRST_PROJECTION_NOTICE: &str =
    "Drawing UMAP projections for the first time, this will take a few seconds.";
const DEVICE_CONNECTED_HINT: &str = "Your device must be connected before you start the toolbox.";

/// One state change pushed to the view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PanelEvent {
    Log { text: String },
    Loading(LoadingBar),
    Controls(ControlsState),
    Boxes(BoxesSnapshot),
    Plot(PlotUpdate),
}

impl PanelEvent {
    pub fn channel(&self) -> &'static str {
        match self {
            PanelEvent::Log { .. } => "toolbox:log",
            PanelEvent::Loading(_) => "toolbox:loading",
            PanelEvent::Controls(_) => "toolbox:controls",
            PanelEvent::Boxes(_) => "toolbox:boxes",
            PanelEvent::Plot(_) => "toolbox:plot",
        }
    }
}

/// Where panel updates go (the webview in the app, a recorder in tests)
pub trait PanelSink: Send {
    fn emit(&self, event: PanelEvent);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxesSnapshot {
    pub dataset: BoxSnapshot,
    pub speaker: BoxSnapshot,
    pub utterance: BoxSnapshot,
    pub speaker_encoder: BoxSnapshot,
    pub emotion_encoder: BoxSnapshot,
    pub synthesizer: BoxSnapshot,
    pub vocoder: BoxSnapshot,
    pub audio_out: BoxSnapshot,
    pub utterance_history: BoxSnapshot,
    pub waves: BoxSnapshot,
}

/// Full panel state, sent once when the view attaches
#[derive(Debug, Clone, Serialize)]
pub struct PanelSnapshot {
    pub log: String,
    pub controls: ControlsState,
    pub boxes: BoxesSnapshot,
}

/// A vocoder output kept for replay and export
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWave {
    pub name: String,
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
}

pub struct ControlPanel<S: PanelSink, R: RngCore + Send = OsRng> {
    sink: S,
    rng: R,
    projector: Box<dyn Projector>,

    log: LogBuffer,
    controls: ControlsState,

    datasets_root: Option<PathBuf>,
    recognized_datasets: Vec<String>,
    dataset_box: SelectionBox<PathBuf>,
    speaker_box: SelectionBox<()>,
    utterance_box: SelectionBox<PathBuf>,

    speaker_encoder_box: SelectionBox<PathBuf>,
    emotion_encoder_box: SelectionBox<PathBuf>,
    synthesizer_box: SelectionBox<PathBuf>,
    vocoder_box: SelectionBox<Option<PathBuf>>,

    audio_in_device: Option<String>,
    audio_out_box: SelectionBox<Option<String>>,

    utterance_history: MruList<Arc<Utterance>>,
    waves: MruList<GeneratedWave>,
    waves_count: usize,

    umap_hot: bool,
}

impl<S: PanelSink> ControlPanel<S, OsRng> {
    pub fn new(sink: S, toolbox: &ToolboxConfig, ui: &UiConfig) -> Self {
        Self::with_rng(sink, OsRng, toolbox, ui)
    }
}

impl<S: PanelSink, R: RngCore + Send> ControlPanel<S, R> {
    pub fn with_rng(sink: S, rng: R, toolbox: &ToolboxConfig, ui: &UiConfig) -> Self {
        Self {
            sink,
            rng,
            projector: Box::new(CosinePca::default()),
            log: LogBuffer::default(),
            controls: ControlsState::new(&ui.default_text, ui.auto_next),
            datasets_root: None,
            recognized_datasets: toolbox.recognized_datasets.clone(),
            dataset_box: SelectionBox::default(),
            speaker_box: SelectionBox::default(),
            utterance_box: SelectionBox::default(),
            speaker_encoder_box: SelectionBox::default(),
            emotion_encoder_box: SelectionBox::default(),
            synthesizer_box: SelectionBox::default(),
            vocoder_box: SelectionBox::default(),
            audio_in_device: None,
            audio_out_box: SelectionBox::default(),
            utterance_history: MruList::new(toolbox.max_saved_utterances),
            waves: MruList::new(toolbox.max_saved_waves),
            waves_count: 0,
            umap_hot: false,
        }
    }

    pub fn set_projector(&mut self, projector: Box<dyn Projector>) {
        self.projector = projector;
    }

    // ========== Browser ==========

    /// Refill the browser boxes from `level` down (0 datasets, 1 speakers, 2 utterances)
    pub fn populate_browser(
        &mut self,
        datasets_root: Option<&Path>,
        recognized_datasets: &[String],
        level: u8,
        random: bool,
    ) -> Result<()> {
        self.datasets_root = datasets_root.map(Path::to_path_buf);
        self.recognized_datasets = recognized_datasets.to_vec();

        if level == 0 {
            let datasets = datasets_root
                .map(|root| browser::list_datasets(root, recognized_datasets))
                .unwrap_or_default();

            if datasets.is_empty() {
                self.disable_browser(datasets_root, recognized_datasets);
                return Ok(());
            }

            self.controls.set_browser_enabled(true);
            let items = datasets
                .into_iter()
                .map(|d| SelectionItem::new(d.to_string_lossy().into_owned(), d))
                .collect();
            self.dataset_box.repopulate(items, random, &mut self.rng);
        }

        let Some(root) = datasets_root else {
            return Ok(());
        };

        if level <= 1 {
            let speakers = match self.dataset_box.current_text() {
                "" => Vec::new(),
                dataset => browser::list_speakers(root, dataset)?,
            };
            let items = speakers.into_iter().map(|s| SelectionItem::new(s, ())).collect();
            self.speaker_box.repopulate(items, random, &mut self.rng);
        }

        if level <= 2 {
            let utterances = match (
                self.dataset_box.current_text(),
                self.speaker_box.current_text(),
            ) {
                ("", _) | (_, "") => Vec::new(),
                (dataset, speaker) => browser::list_utterances(root, dataset, speaker)?,
            };
            let items = utterances
                .into_iter()
                .map(|u| SelectionItem::new(u.to_string_lossy().into_owned(), u))
                .collect();
            self.utterance_box.repopulate(items, random, &mut self.rng);
        }

        self.emit_boxes();
        self.emit_controls();
        Ok(())
    }

    fn disable_browser(&mut self, datasets_root: Option<&Path>, recognized_datasets: &[String]) {
        let msg = match datasets_root {
            None => "Warning: you did not pass a root directory for datasets as argument".to_string(),
            Some(root) => format!(
                "Warning: you do not have any of the recognized datasets in {}",
                root.display()
            ),
        };
        self.log(&msg, LogMode::Newline);
        ::log::warn!(
            "{}.\nThe recognized datasets are:\n\t{}\nFeel free to add your own. You can still use the toolbox by recording samples yourself.",
            msg,
            recognized_datasets.join("\n\t")
        );

        // Empty boxes are disabled by repopulate
        self.controls.set_browser_enabled(false);
        self.dataset_box.repopulate(Vec::new(), false, &mut self.rng);
        self.speaker_box.repopulate(Vec::new(), false, &mut self.rng);
        self.utterance_box.repopulate(Vec::new(), false, &mut self.rng);
        self.emit_boxes();
        self.emit_controls();
    }

    /// Pick a dataset and cascade a random speaker and utterance under it
    pub fn select_dataset(&mut self, index: usize) -> Result<()> {
        if self.dataset_box.set_current(index) {
            self.randomize(1)?;
        }
        Ok(())
    }

    pub fn select_speaker(&mut self, index: usize) -> Result<()> {
        if self.speaker_box.set_current(index) {
            self.randomize(2)?;
        }
        Ok(())
    }

    pub fn select_utterance(&mut self, index: usize) {
        if self.utterance_box.set_current(index) {
            self.emit_boxes();
        }
    }

    /// "Random" buttons: redraw from `level` with random picks
    pub fn randomize(&mut self, level: u8) -> Result<()> {
        let root = self.datasets_root.clone();
        let recognized = self.recognized_datasets.clone();
        self.populate_browser(root.as_deref(), &recognized, level, true)
    }

    pub fn browser_select_next(&mut self) {
        if self.utterance_box.select_next().is_some() {
            self.emit_boxes();
        }
    }

    pub fn current_dataset_name(&self) -> &str {
        self.dataset_box.current_text()
    }

    pub fn current_speaker_name(&self) -> &str {
        self.speaker_box.current_text()
    }

    pub fn current_utterance_name(&self) -> &str {
        self.utterance_box.current_text()
    }

    /// Absolute path of the utterance selected in the browser
    pub fn current_utterance_fpath(&self) -> Option<PathBuf> {
        let root = self.datasets_root.as_ref()?;
        let relative = self.utterance_box.current_data()?;
        Some(
            root.join(self.current_dataset_name())
                .join(self.current_speaker_name())
                .join(relative),
        )
    }

    pub fn auto_next(&self) -> bool {
        self.controls.auto_next.checked && self.controls.auto_next.enabled
    }

    // ========== Models ==========

    pub fn populate_models(&mut self, run_id: &str, models_dir: &Path) -> Result<(), ModelError> {
        let catalog = models::discover(run_id, models_dir)?;

        let files = |files: Vec<models::ModelFile>| {
            files
                .into_iter()
                .map(|f| SelectionItem::new(f.label, f.path))
                .collect::<Vec<_>>()
        };
        self.speaker_encoder_box
            .repopulate(files(catalog.speaker_encoders), false, &mut self.rng);
        self.emotion_encoder_box
            .repopulate(files(catalog.emotion_encoders), false, &mut self.rng);
        self.synthesizer_box
            .repopulate(files(catalog.synthesizers), false, &mut self.rng);
        let vocoders = catalog
            .vocoders
            .into_iter()
            .map(|(label, path)| SelectionItem::new(label, path))
            .collect();
        self.vocoder_box.repopulate(vocoders, false, &mut self.rng);

        self.emit_boxes();
        Ok(())
    }

    pub fn select_model(&mut self, kind: ModelKind, index: usize) -> bool {
        let changed = match kind {
            ModelKind::SpeakerEncoder => self.speaker_encoder_box.set_current(index),
            ModelKind::EmotionEncoder => self.emotion_encoder_box.set_current(index),
            ModelKind::Synthesizer => self.synthesizer_box.set_current(index),
            ModelKind::Vocoder => self.vocoder_box.set_current(index),
        };
        if changed {
            self.emit_boxes();
        }
        changed
    }

    pub fn current_speaker_encoder_fpath(&self) -> Option<&Path> {
        self.speaker_encoder_box.current_data().map(PathBuf::as_path)
    }

    pub fn current_emotion_encoder_fpath(&self) -> Option<&Path> {
        self.emotion_encoder_box.current_data().map(PathBuf::as_path)
    }

    pub fn current_synthesizer_fpath(&self) -> Option<&Path> {
        self.synthesizer_box.current_data().map(PathBuf::as_path)
    }

    /// None for Griffin-Lim
    pub fn current_vocoder_fpath(&self) -> Option<&Path> {
        self.vocoder_box.current_data().and_then(|p| p.as_deref())
    }

    // ========== Utterance history ==========

    pub fn register_utterance(&mut self, utterance: Arc<Utterance>) {
        if let Some(evicted) = self.utterance_history.push_front(utterance) {
            ::log::debug!("Utterance '{}' dropped from history", evicted.name);
        }

        self.controls.set_utterance_actions_enabled(true);
        self.emit_boxes();
        self.emit_controls();
    }

    pub fn selected_utterance(&self) -> Option<Arc<Utterance>> {
        self.utterance_history.current().cloned()
    }

    pub fn select_history(&mut self, index: usize) -> Option<Arc<Utterance>> {
        let selected = self.utterance_history.select(index).cloned();
        self.emit_boxes();
        selected
    }

    // ========== Log and loading bar ==========

    pub fn log(&mut self, line: &str, mode: LogMode) {
        if !line.is_empty() {
            ::log::info!("{}", line);
        }
        self.log.log(line, mode);
        self.sink.emit(PanelEvent::Log {
            text: self.log.text(),
        });
    }

    pub fn set_loading(&mut self, value: f32, maximum: f32) {
        self.controls.loading.set(value, maximum);
        self.sink.emit(PanelEvent::Loading(self.controls.loading));
    }

    // ========== Plots ==========

    pub fn draw_utterance(&mut self, utterance: &Utterance, which: Which) {
        self.draw_spec(Some(&utterance.spec), which);
        self.draw_embed(
            Some(&utterance.speaker_embed),
            utterance.emotion_embed.as_deref(),
            &utterance.name,
            which,
        );
    }

    pub fn draw_embed(
        &mut self,
        speaker_embed: Option<&[f32]>,
        emotion_embed: Option<&[f32]>,
        name: &str,
        which: Which,
    ) {
        let suptitle = |embed: Option<&[f32]>| {
            if embed.is_some() {
                name.to_string()
            } else {
                String::new()
            }
        };

        let heatmap = speaker_embed.and_then(|e| self.try_heatmap(e, None, "speaker embed"));
        self.sink.emit(PanelEvent::Plot(PlotUpdate::SpeakerEmbed {
            which,
            suptitle: suptitle(speaker_embed),
            heatmap,
        }));

        let heatmap = emotion_embed
            .and_then(|e| self.try_heatmap(e, Some(EMOTION_EMBED_SHAPE), "emotion embed"));
        self.sink.emit(PanelEvent::Plot(PlotUpdate::EmotionEmbed {
            which,
            suptitle: suptitle(emotion_embed),
            heatmap,
        }));
    }

    fn try_heatmap(
        &mut self,
        embed: &[f32],
        shape: Option<(usize, usize)>,
        title: &str,
    ) -> Option<plots::HeatmapPlot> {
        match plots::heatmap(embed, shape, title) {
            Ok(plot) => Some(plot),
            Err(e) => {
                self.log(&format!("Cannot draw {}: {}", title, e), LogMode::Newline);
                None
            }
        }
    }

    pub fn draw_spec(&mut self, spec: Option<&Matrix>, which: Which) {
        self.sink.emit(PanelEvent::Plot(PlotUpdate::Spectrogram {
            which,
            spectrogram: spec.map(|s| plots::spectrogram(s, "mel spectrogram")),
        }));

        if which == Which::Generated {
            self.controls.vocode.enabled = spec.is_some();
            self.emit_controls();
        }
    }

    pub fn draw_umap_projections(&mut self, utterances: &[Arc<Utterance>]) {
        // Colours follow the speaker's rank among every utterance drawn
        let speakers: Vec<&str> = utterances
            .iter()
            .map(|u| u.speaker_name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let speaker_points: Vec<(&Utterance, &[f32])> = utterances
            .iter()
            .map(|u| (u.as_ref(), u.speaker_embed.as_slice()))
            .collect();
        let projection = self.projection_plot(&speaker_points, &speakers, "Speaker Embedding UMAP");
        self.sink
            .emit(PanelEvent::Plot(PlotUpdate::SpeakerProjection { projection }));

        let emotion_points: Vec<(&Utterance, &[f32])> = utterances
            .iter()
            .filter_map(|u| u.emotion_embed.as_deref().map(|e| (u.as_ref(), e)))
            .collect();
        let projection = self.projection_plot(&emotion_points, &speakers, "Emotion Embedding UMAP");
        self.sink
            .emit(PanelEvent::Plot(PlotUpdate::EmotionProjection { projection }));
    }

    fn projection_plot(
        &mut self,
        points: &[(&Utterance, &[f32])],
        speakers: &[&str],
        title: &str,
    ) -> ProjectionPlot {
        if points.len() < MIN_PROJECTION_POINTS {
            return ProjectionPlot::Placeholder {
                message: plots::placeholder_message(MIN_PROJECTION_POINTS - points.len()),
            };
        }

        if !self.umap_hot {
            self.log(FIRST_PROJECTION_NOTICE, LogMode::Newline);
            self.umap_hot = true;
        }

        let embeds: Vec<&[f32]> = points.iter().map(|(_, e)| *e).collect();
        let projections = match self
            .projector
            .project(&embeds, ProjectionParams::for_points(embeds.len()))
        {
            Ok(projections) => projections,
            Err(e) => {
                self.log(&format!("Cannot draw {}: {}", title, e), LogMode::Newline);
                return ProjectionPlot::Empty;
            }
        };

        let total = projections.len();
        let mut plotted = Vec::with_capacity(total);
        for (i, ((utterance, _), [x, y])) in points.iter().zip(projections).enumerate() {
            let rank = speakers
                .iter()
                .position(|s| *s == utterance.speaker_name)
                .unwrap_or(0);
            plotted.push(ProjectedPoint {
                x,
                y,
                color: plots::speaker_color(rank),
                marker: if utterance.is_generated() {
                    Marker::Cross
                } else {
                    Marker::Circle
                },
                label: utterance.name.clone(),
            });
            self.set_loading((i + 1) as f32, total as f32);
        }
        self.set_loading(0.0, 1.0);

        ProjectionPlot::Points {
            title: title.to_string(),
            points: plotted,
        }
    }

    // ========== Generation options ==========

    pub fn populate_gen_options(&mut self, seed: Option<u64>, trim_silences: bool) {
        let opts = &mut self.controls.gen;
        match seed {
            Some(seed) => {
                opts.random_seed = true;
                opts.seed_text = seed.to_string();
                opts.seed_editable = true;
            }
            None => {
                opts.random_seed = false;
                opts.seed_text = "0".to_string();
                opts.seed_editable = false;
            }
        }

        if !trim_silences {
            opts.trim_silences.checked = false;
            opts.trim_silences.enabled = false;
        }
        self.emit_controls();
    }

    /// The seed box is editable only while "Random seed" is checked
    pub fn update_seed_textbox(&mut self, checked: bool) {
        self.controls.gen.random_seed = checked;
        self.controls.gen.seed_editable = checked;
        self.emit_controls();
    }

    pub fn set_seed_text(&mut self, text: &str) {
        self.controls.gen.seed_text = text.to_string();
    }

    /// Seed to run the synthesizer and vocoder with, None for nondeterministic runs
    pub fn current_seed(&self) -> Result<Option<u64>, ValidationError> {
        if !self.controls.gen.random_seed {
            return Ok(None);
        }
        validation::validate_seed(&self.controls.gen.seed_text).map(Some)
    }

    pub fn set_griffin_lim(&mut self, checked: bool) {
        self.controls.gen.griffin_lim = checked;
        self.emit_controls();
    }

    /// Ignored while the checkbox is disabled
    pub fn set_trim_silences(&mut self, checked: bool) {
        if self.controls.gen.trim_silences.enabled {
            self.controls.gen.trim_silences.checked = checked;
            self.emit_controls();
        }
    }

    pub fn set_auto_next(&mut self, checked: bool) {
        self.controls.auto_next.checked = checked;
        self.emit_controls();
    }

    pub fn set_text_prompt(&mut self, text: &str) {
        self.controls.gen.text_prompt = text.to_string();
    }

    pub fn text_prompt(&self) -> &str {
        &self.controls.gen.text_prompt
    }

    pub fn griffin_lim(&self) -> bool {
        self.controls.gen.griffin_lim
    }

    pub fn trim_silences(&self) -> bool {
        self.controls.gen.trim_silences.checked
    }

    // ========== Reset ==========

    pub fn reset_interface(&mut self) {
        self.draw_embed(None, None, "", Which::Current);
        self.draw_embed(None, None, "", Which::Generated);
        self.draw_spec(None, Which::Current);
        self.draw_spec(None, Which::Generated);
        self.draw_umap_projections(&[]);
        self.set_loading(0.0, 1.0);

        let c = &mut self.controls;
        c.set_utterance_actions_enabled(false);
        c.vocode.enabled = false;
        c.replay.enabled = false;
        c.export.enabled = false;
        self.emit_controls();

        for _ in 0..MAX_LOG_LINES {
            self.log("", LogMode::Newline);
        }
    }

    /// "Clear" button: forget every registered utterance
    pub fn clear_utterances(&mut self) {
        self.utterance_history.clear();
        self.controls.set_utterance_actions_enabled(false);
        self.draw_umap_projections(&[]);
        self.emit_boxes();
        self.emit_controls();
    }

    // ========== Generated waves ==========

    pub fn add_generated_wave(&mut self, samples: Vec<f32>, sample_rate: u32) -> String {
        self.waves_count += 1;
        let name = format!("gen_wav_{}", self.waves_count);
        self.waves.push_front(GeneratedWave {
            name: name.clone(),
            samples: Arc::new(samples),
            sample_rate,
        });

        self.controls.replay.enabled = true;
        self.controls.export.enabled = true;
        self.emit_boxes();
        self.emit_controls();
        name
    }

    pub fn select_wave(&mut self, index: usize) -> Option<&GeneratedWave> {
        self.waves.select(index);
        self.emit_boxes();
        self.waves.current()
    }

    pub fn selected_wave(&self) -> Option<&GeneratedWave> {
        self.waves.current()
    }

    // ========== Audio ==========

    pub fn record_started(&mut self, duration_s: u32) {
        self.controls.set_recording(true);
        self.emit_controls();
        self.log(
            &format!("Recording {} seconds of audio", duration_s),
            LogMode::Newline,
        );
    }

    pub fn record_progress(&mut self, elapsed_s: f32, duration_s: f32) {
        self.set_loading(elapsed_s, duration_s);
    }

    pub fn record_finished(&mut self, ok: bool) {
        if ok {
            self.log("Done recording.", LogMode::Newline);
        } else {
            self.log(
                "Could not record anything. Is your recording device enabled?",
                LogMode::Newline,
            );
            self.log(DEVICE_CONNECTED_HINT, LogMode::Newline);
        }
        self.controls.set_recording(false);
        self.emit_controls();
    }

    pub fn playback_failed(&mut self) {
        self.log(
            "Error in audio playback. Try selecting a different audio output device.",
            LogMode::Newline,
        );
        self.log(DEVICE_CONNECTED_HINT, LogMode::Newline);
    }

    /// Fill the output box and pick the input, preferring the devices saved in `audio`
    pub fn apply_audio_devices(&mut self, devices: &AudioDevices, audio: &AudioConfig) {
        let preferred_input = configured_device(&audio.device_name, "input");
        let preferred_output = configured_device(&audio.output_device_name, "output");

        self.audio_in_device = devices.pick_input(preferred_input).map(str::to_string);
        if self.audio_in_device.is_none() {
            self.log(
                "No audio input device detected. Recording may not work.",
                LogMode::Newline,
            );
        }

        if devices.outputs.is_empty() {
            self.log(
                "No supported output audio devices were found! Audio output may not work.",
                LogMode::Newline,
            );
            self.audio_out_box.repopulate(
                vec![SelectionItem::new(NO_OUTPUT_DEVICE, None)],
                false,
                &mut self.rng,
            );
            self.audio_out_box.set_enabled(false);
        } else {
            let items = devices
                .outputs
                .iter()
                .map(|name| SelectionItem::new(name.as_str(), Some(name.clone())))
                .collect();
            self.audio_out_box.repopulate(items, false, &mut self.rng);
            if let Some(name) = preferred_output {
                match devices.output_index(name) {
                    Some(index) => {
                        self.audio_out_box.set_current(index);
                    }
                    None => ::log::warn!("Configured output device '{}' is not usable", name),
                }
            }
        }
        self.emit_boxes();
    }

    pub fn set_audio_device(&mut self, index: usize) -> bool {
        let changed = self.audio_out_box.set_current(index);
        if changed {
            ::log::info!("Audio output set to {}", self.audio_out_box.current_text());
            self.emit_boxes();
        }
        changed
    }

    /// None lets the audio backend pick its default output
    pub fn current_output_device(&self) -> Option<String> {
        self.audio_out_box.current_data().cloned().flatten()
    }

    pub fn audio_in_device(&self) -> Option<&str> {
        self.audio_in_device.as_deref()
    }

    // ========== View sync ==========

    pub fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            log: self.log.text(),
            controls: self.controls.clone(),
            boxes: self.boxes(),
        }
    }

    pub fn controls(&self) -> &ControlsState {
        &self.controls
    }

    fn boxes(&self) -> BoxesSnapshot {
        let history = |labels: Vec<String>, current: Option<usize>| BoxSnapshot {
            enabled: !labels.is_empty(),
            items: labels,
            current,
        };

        BoxesSnapshot {
            dataset: self.dataset_box.snapshot(),
            speaker: self.speaker_box.snapshot(),
            utterance: self.utterance_box.snapshot(),
            speaker_encoder: self.speaker_encoder_box.snapshot(),
            emotion_encoder: self.emotion_encoder_box.snapshot(),
            synthesizer: self.synthesizer_box.snapshot(),
            vocoder: self.vocoder_box.snapshot(),
            audio_out: self.audio_out_box.snapshot(),
            utterance_history: history(
                self.utterance_history.labels(|u| u.name.clone()),
                self.utterance_history.current_index(),
            ),
            waves: history(
                self.waves.labels(|w| w.name.clone()),
                self.waves.current_index(),
            ),
        }
    }

    fn emit_boxes(&self) {
        self.sink.emit(PanelEvent::Boxes(self.boxes()));
    }

    fn emit_controls(&self) {
        self.sink.emit(PanelEvent::Controls(self.controls.clone()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    SpeakerEncoder,
    EmotionEncoder,
    Synthesizer,
    Vocoder,
}

/// A saved device name, or None when it fails validation
fn configured_device<'a>(name: &'a Option<String>, direction: &str) -> Option<&'a str> {
    match validation::validate_opt_device_name(name) {
        Ok(()) => name.as_deref(),
        Err(e) => {
            ::log::warn!("Ignoring configured {} device: {}", direction, e);
            None
        }
    }
}
