// Prevents additional console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tauri::{AppHandle, Emitter, Manager, State};

use toolbox_lib::audio::{self, playback::Player, wav, AudioDevices};
use toolbox_lib::config::AppConfig;
use toolbox_lib::panel::log::LogMode;
use toolbox_lib::panel::{ControlPanel, ModelKind, PanelEvent, PanelSink, PanelSnapshot};
use toolbox_lib::paths::AppPaths;
use toolbox_lib::plots::Which;
use toolbox_lib::preflight::{self, PreflightReport};
use toolbox_lib::utterance::{Matrix, Utterance};
use toolbox_lib::validation::{
    reject, validate_record_seconds, validate_run_id, validate_text_prompt, ValidationError,
    MAX_TEXT_PROMPT_LEN,
};

/// Forwards panel updates to the webview
struct TauriSink {
    app: AppHandle,
}

impl PanelSink for TauriSink {
    fn emit(&self, event: PanelEvent) {
        let _ = self.app.emit(event.channel(), &event);
    }
}

type Panel = ControlPanel<TauriSink>;

/// Application state
struct AppState {
    paths: AppPaths,
    config: Arc<Mutex<AppConfig>>,
    /// Created in `setup` once the app handle exists
    panel: Mutex<Option<Panel>>,
    player: Mutex<Player>,
    /// Every utterance registered this session, for the projections
    utterances: Mutex<Vec<Arc<Utterance>>>,
    devices: Mutex<AudioDevices>,
    recordings: AtomicUsize,
}

fn with_panel<T>(state: &AppState, f: impl FnOnce(&mut Panel) -> T) -> Result<T, String> {
    let mut guard = state.panel.lock().unwrap();
    let panel = guard
        .as_mut()
        .ok_or_else(|| "Control panel is not ready yet".to_string())?;
    Ok(f(panel))
}

/// Audio handed back to the orchestrator for encoding
#[derive(Debug, Clone, Serialize)]
struct LoadedAudio {
    name: String,
    speaker_name: String,
    samples: Vec<f32>,
    sample_rate: u32,
}

/// Everything an external synthesizer run needs from the panel
#[derive(Debug, Clone, Serialize)]
struct GenerationRequest {
    text: String,
    seed: Option<u64>,
    speaker_encoder: Option<PathBuf>,
    emotion_encoder: Option<PathBuf>,
    synthesizer: Option<PathBuf>,
    /// None means Griffin-Lim
    vocoder: Option<PathBuf>,
    griffin_lim: bool,
    trim_silences: bool,
}

#[derive(Serialize, Clone)]
struct AudioErrorPayload {
    code: String,
    message: String,
}

fn emit_audio_error(app_handle: &AppHandle, error: &anyhow::Error) -> String {
    let friendly = audio::friendly_audio_error(error);
    let _ = app_handle.emit(
        "toolbox:audio_error",
        AudioErrorPayload {
            code: friendly.code,
            message: friendly.message.clone(),
        },
    );
    friendly.message
}

// ===== PANEL STATE =====

/// Tauri command: Full panel state for a freshly loaded view
#[tauri::command]
async fn get_panel_state(state: State<'_, AppState>) -> Result<PanelSnapshot, String> {
    with_panel(&state, |p| p.snapshot())
}

/// Tauri command: Clear plots, progress and per-utterance actions
#[tauri::command]
async fn reset_interface(state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| p.reset_interface())
}

/// Tauri command: Append a line to the panel log
#[tauri::command]
async fn log_line(
    line: String,
    mode: Option<LogMode>,
    state: State<'_, AppState>,
) -> Result<(), String> {
    with_panel(&state, |p| p.log(&line, mode.unwrap_or_default()))
}

/// Tauri command: Drive the loading bar
#[tauri::command]
async fn set_loading(
    value: f32,
    maximum: Option<f32>,
    state: State<'_, AppState>,
) -> Result<(), String> {
    with_panel(&state, |p| p.set_loading(value, maximum.unwrap_or(1.0)))
}

// ===== CONFIG =====

/// Tauri command: Get current configuration
#[tauri::command]
async fn get_config(state: State<'_, AppState>) -> Result<AppConfig, String> {
    let config = state.config.lock().unwrap().clone();
    Ok(config)
}

/// Tauri command: Save current configuration to disk
#[tauri::command]
async fn save_preferences(state: State<'_, AppState>) -> Result<String, String> {
    let config = state.config.lock().unwrap().clone();
    let config_path = state.paths.config_file();
    config.save(&config_path).map_err(|e| e.to_string())?;

    log::info!("Preferences saved to: {} (secure perms)", config_path.display());
    Ok(format!("Preferences saved to: {}", config_path.display()))
}

/// Tauri command: Run startup checks against the current config and devices
#[tauri::command]
async fn run_preflight_checks(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<PreflightReport, String> {
    let toolbox = state.config.lock().unwrap().toolbox.clone();
    let devices = state.devices.lock().unwrap().clone();
    Ok(preflight::run_preflight(&app_handle, &toolbox, &devices))
}

// ===== BROWSER =====

fn populate_browser_from_config(state: &AppState, level: u8, random: bool) -> Result<(), String> {
    let (root, recognized) = {
        let config = state.config.lock().unwrap();
        (
            config.toolbox.datasets_root.clone(),
            config.toolbox.recognized_datasets.clone(),
        )
    };
    with_panel(state, |p| {
        p.populate_browser(root.as_deref(), &recognized, level, random)
    })?
    .map_err(|e| format!("{:#}", e))
}

/// Tauri command: Pick the datasets root with a folder dialog and rescan
#[tauri::command]
async fn choose_datasets_root(state: State<'_, AppState>) -> Result<Option<String>, String> {
    let Some(folder) = rfd::AsyncFileDialog::new()
        .set_title("Select the datasets root")
        .pick_folder()
        .await
    else {
        return Ok(None);
    };

    let root = folder.path().to_path_buf();
    state.config.lock().unwrap().toolbox.datasets_root = Some(root.clone());
    log::info!("Datasets root set to {} (call save_preferences to persist)", root.display());

    populate_browser_from_config(&state, 0, true)?;
    Ok(Some(root.display().to_string()))
}

/// Tauri command: "Random" buttons (0 dataset, 1 speaker, 2 utterance)
#[tauri::command]
async fn browser_random(level: u8, state: State<'_, AppState>) -> Result<(), String> {
    if level > 2 {
        return Err(format!("Invalid browser level: {}", level));
    }
    with_panel(&state, |p| p.randomize(level))?.map_err(|e| format!("{:#}", e))
}

#[tauri::command]
async fn select_dataset(index: usize, state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| p.select_dataset(index))?.map_err(|e| format!("{:#}", e))
}

#[tauri::command]
async fn select_speaker(index: usize, state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| p.select_speaker(index))?.map_err(|e| format!("{:#}", e))
}

#[tauri::command]
async fn select_utterance(index: usize, state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| p.select_utterance(index))
}

#[tauri::command]
async fn browser_select_next(state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| p.browser_select_next())
}

/// Tauri command: Load the utterance selected in the browser
#[tauri::command]
async fn load_from_browser(state: State<'_, AppState>) -> Result<LoadedAudio, String> {
    let (fpath, name, speaker_name) = with_panel(&state, |p| {
        let fpath = p.current_utterance_fpath();
        let name = Path::new(p.current_dataset_name())
            .join(p.current_speaker_name())
            .join(p.current_utterance_name())
            .display()
            .to_string();
        let speaker_name = format!("{}_{}", p.current_dataset_name(), p.current_speaker_name());
        if p.auto_next() {
            p.browser_select_next();
        }
        (fpath, name, speaker_name)
    })?;
    let fpath = fpath.ok_or_else(|| "No utterance selected in the browser".to_string())?;

    load_audio(&state, &fpath, name, speaker_name).await
}

/// Tauri command: Load an audio file picked with a file dialog
#[tauri::command]
async fn browse_file(state: State<'_, AppState>) -> Result<Option<LoadedAudio>, String> {
    let Some(file) = rfd::AsyncFileDialog::new()
        .set_title("Select an audio file")
        .add_filter("Audio Files", &["mp3", "flac", "wav", "m4a"])
        .pick_file()
        .await
    else {
        return Ok(None);
    };

    let fpath = file.path().to_path_buf();
    let name = file.file_name();
    let speaker_name = fpath
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    load_audio(&state, &fpath, name, speaker_name).await.map(Some)
}

async fn load_audio(
    state: &AppState,
    fpath: &Path,
    name: String,
    speaker_name: String,
) -> Result<LoadedAudio, String> {
    let path = fpath.to_path_buf();
    let loaded = tokio::task::spawn_blocking(move || wav::load(&path))
        .await
        .map_err(|e| e.to_string())?;

    match loaded {
        Ok((samples, sample_rate)) => {
            with_panel(state, |p| {
                p.log(&format!("Loaded {}", name), LogMode::Newline)
            })?;
            Ok(LoadedAudio {
                name,
                speaker_name,
                samples,
                sample_rate,
            })
        }
        Err(e) => {
            let message = format!("Could not load {}: {:#}", fpath.display(), e);
            with_panel(state, |p| p.log(&message, LogMode::Newline))?;
            Err(message)
        }
    }
}

// ===== MODELS =====

/// Tauri command: Fill the model boxes from a training run
#[tauri::command]
async fn populate_models(
    run_id: Option<String>,
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<(), String> {
    let (run_id, models_dir) = {
        let mut config = state.config.lock().unwrap();
        if let Some(run_id) = run_id {
            let run_id = validate_run_id(&run_id)
                .map_err(|e| reject(&app_handle, "run_id", e, Some(json!(run_id))))?;
            config.toolbox.run_id = run_id;
        }
        (config.toolbox.run_id.clone(), config.toolbox.models_dir.clone())
    };

    with_panel(&state, |p| match p.populate_models(&run_id, &models_dir) {
        Ok(()) => Ok(()),
        Err(e) => {
            p.log(&e.to_string(), LogMode::Newline);
            Err(e.to_string())
        }
    })?
}

#[tauri::command]
async fn select_model(
    kind: ModelKind,
    index: usize,
    state: State<'_, AppState>,
) -> Result<bool, String> {
    with_panel(&state, |p| p.select_model(kind, index))
}

/// Tauri command: Collect the current model paths and options for synthesis
#[tauri::command]
async fn generation_request(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<GenerationRequest, String> {
    let request = with_panel(&state, |p| -> Result<GenerationRequest, (&'static str, ValidationError)> {
        let text = validate_text_prompt(p.text_prompt()).map_err(|e| ("text_prompt", e))?;
        let seed = p.current_seed().map_err(|e| ("seed", e))?;
        Ok(GenerationRequest {
            text,
            seed,
            speaker_encoder: p.current_speaker_encoder_fpath().map(Path::to_path_buf),
            emotion_encoder: p.current_emotion_encoder_fpath().map(Path::to_path_buf),
            synthesizer: p.current_synthesizer_fpath().map(Path::to_path_buf),
            vocoder: p.current_vocoder_fpath().map(Path::to_path_buf),
            griffin_lim: p.griffin_lim(),
            trim_silences: p.trim_silences(),
        })
    })?;

    request.map_err(|(field, e)| reject(&app_handle, field, e, None))
}

// ===== UTTERANCES AND PLOTS =====

/// Tauri command: Add an encoded utterance to the history and redraw
#[tauri::command]
async fn register_utterance(
    utterance: Utterance,
    state: State<'_, AppState>,
) -> Result<(), String> {
    utterance.spec.validate().map_err(|e| e.to_string())?;

    let utterance = Arc::new(utterance);
    let all = {
        let mut utterances = state.utterances.lock().unwrap();
        utterances.push(utterance.clone());
        utterances.clone()
    };

    let which = if utterance.synth {
        Which::Generated
    } else {
        Which::Current
    };
    with_panel(&state, |p| {
        p.register_utterance(utterance.clone());
        p.draw_utterance(&utterance, which);
        p.draw_umap_projections(&all);
    })
}

/// Tauri command: "Use embedding from" box changed
#[tauri::command]
async fn select_history(index: usize, state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| {
        if let Some(utterance) = p.select_history(index) {
            p.draw_utterance(&utterance, Which::Current);
        }
    })
}

/// Tauri command: "Clear" button under the projections
#[tauri::command]
async fn clear_utterances(state: State<'_, AppState>) -> Result<(), String> {
    state.utterances.lock().unwrap().clear();
    with_panel(&state, |p| p.clear_utterances())
}

#[tauri::command]
async fn draw_spec(
    spec: Option<Matrix>,
    which: Which,
    state: State<'_, AppState>,
) -> Result<(), String> {
    if let Some(spec) = &spec {
        spec.validate().map_err(|e| e.to_string())?;
    }
    with_panel(&state, |p| p.draw_spec(spec.as_ref(), which))
}

#[tauri::command]
async fn draw_embed(
    speaker_embed: Option<Vec<f32>>,
    emotion_embed: Option<Vec<f32>>,
    name: String,
    which: Which,
    state: State<'_, AppState>,
) -> Result<(), String> {
    with_panel(&state, |p| {
        p.draw_embed(
            speaker_embed.as_deref(),
            emotion_embed.as_deref(),
            &name,
            which,
        )
    })
}

// ===== GENERATION OPTIONS =====

#[tauri::command]
async fn update_seed_textbox(checked: bool, state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| p.update_seed_textbox(checked))
}

#[tauri::command]
async fn set_seed_text(text: String, state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| p.set_seed_text(&text))
}

/// Tauri command: Parsed seed (None when "Random seed" is unchecked)
#[tauri::command]
async fn current_seed(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<Option<u64>, String> {
    with_panel(&state, |p| p.current_seed())?
        .map_err(|e| reject(&app_handle, "seed", e, None))
}

#[tauri::command]
async fn set_griffin_lim(checked: bool, state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| p.set_griffin_lim(checked))
}

#[tauri::command]
async fn set_trim_silences(checked: bool, state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| p.set_trim_silences(checked))
}

#[tauri::command]
async fn set_auto_next(checked: bool, state: State<'_, AppState>) -> Result<(), String> {
    state.config.lock().unwrap().ui.auto_next = checked;
    with_panel(&state, |p| p.set_auto_next(checked))
}

#[tauri::command]
async fn set_text_prompt(
    text: String,
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<(), String> {
    if text.chars().count() > MAX_TEXT_PROMPT_LEN {
        let err = ValidationError::ValueTooLong {
            max: MAX_TEXT_PROMPT_LEN,
            actual: text.chars().count(),
        };
        return Err(reject(&app_handle, "text_prompt", err, None));
    }
    with_panel(&state, |p| p.set_text_prompt(&text))
}

// ===== AUDIO =====

/// Tauri command: Enumerate devices usable at the toolbox rate
#[tauri::command]
async fn setup_audio_devices(state: State<'_, AppState>) -> Result<AudioDevices, String> {
    let audio_config = state.config.lock().unwrap().audio.clone();
    let sample_rate = audio_config.sample_rate_hz;
    let devices = tokio::task::spawn_blocking(move || audio::setup_devices(sample_rate))
        .await
        .map_err(|e| e.to_string())?;

    *state.devices.lock().unwrap() = devices.clone();
    with_panel(&state, |p| p.apply_audio_devices(&devices, &audio_config))?;
    Ok(devices)
}

/// Tauri command: "Audio Output" box changed
#[tauri::command]
async fn set_audio_device(index: usize, state: State<'_, AppState>) -> Result<(), String> {
    let output = with_panel(&state, |p| {
        p.set_audio_device(index);
        p.current_output_device()
    })?;
    state.config.lock().unwrap().audio.output_device_name = output;
    Ok(())
}

/// Tauri command: Record a take from the input device
#[tauri::command]
async fn record(app_handle: AppHandle, state: State<'_, AppState>) -> Result<LoadedAudio, String> {
    let (sample_rate, seconds) = {
        let config = state.config.lock().unwrap();
        (config.audio.sample_rate_hz, config.audio.record_seconds)
    };
    let seconds = validate_record_seconds(seconds)
        .map_err(|e| reject(&app_handle, "record_seconds", e, Some(json!(seconds))))?;

    state.player.lock().unwrap().stop();
    let device = with_panel(&state, |p| {
        p.record_started(seconds);
        p.audio_in_device().map(str::to_string)
    })?;

    let handle = app_handle.clone();
    let result = tokio::task::spawn_blocking(move || {
        audio::record::record_one(sample_rate, seconds, device.as_deref(), |elapsed, total| {
            let state = handle.state::<AppState>();
            let _ = with_panel(&state, |p| p.record_progress(elapsed, total));
        })
    })
    .await
    .map_err(|e| e.to_string())?;

    match result {
        Ok(samples) => {
            with_panel(&state, |p| p.record_finished(true))?;
            let take = state.recordings.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(LoadedAudio {
                name: format!("user{:02}", take),
                speaker_name: "user".to_string(),
                samples,
                sample_rate,
            })
        }
        Err(e) => {
            log::error!("Recording failed: {:#}", e);
            with_panel(&state, |p| p.record_finished(false))?;
            Err(emit_audio_error(&app_handle, &e))
        }
    }
}

/// Open the output on a blocking thread; device start-up can take a while
async fn play(
    app_handle: &AppHandle,
    state: &AppState,
    samples: Vec<f32>,
    sample_rate: u32,
) -> Result<(), String> {
    let device = with_panel(state, |p| p.current_output_device())?;
    let handle = app_handle.clone();
    let played = tokio::task::spawn_blocking(move || {
        let state = handle.state::<AppState>();
        let mut player = state.player.lock().unwrap();
        player.play(samples, sample_rate, device)
    })
    .await
    .map_err(|e| e.to_string())?;

    played.map_err(|e| {
        log::error!("Playback failed: {:#}", e);
        let _ = with_panel(state, |p| p.playback_failed());
        emit_audio_error(app_handle, &e)
    })
}

/// Tauri command: Play the utterance selected in the history
#[tauri::command]
async fn play_utterance(app_handle: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let utterance = with_panel(&state, |p| p.selected_utterance())?
        .ok_or_else(|| "No utterance selected".to_string())?;
    play(
        &app_handle,
        &state,
        utterance.wav.clone(),
        utterance.sample_rate,
    )
    .await
}

#[tauri::command]
async fn stop(state: State<'_, AppState>) -> Result<(), String> {
    state.player.lock().unwrap().stop();
    Ok(())
}

/// Tauri command: Keep a vocoder output for replay/export, then play it
#[tauri::command]
async fn add_generated_wave(
    samples: Vec<f32>,
    sample_rate: u32,
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let name = with_panel(&state, |p| p.add_generated_wave(samples.clone(), sample_rate))?;
    // The wave stays available for replay and export even when playback fails
    if let Err(e) = play(&app_handle, &state, samples, sample_rate).await {
        log::warn!("{} was stored but could not be played: {}", name, e);
    }
    Ok(name)
}

#[tauri::command]
async fn select_wave(index: usize, state: State<'_, AppState>) -> Result<(), String> {
    with_panel(&state, |p| {
        p.select_wave(index);
    })
}

/// Tauri command: Replay the wave selected in "Toolbox Output"
#[tauri::command]
async fn replay_wave(app_handle: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let wave = with_panel(&state, |p| p.selected_wave().cloned())?
        .ok_or_else(|| "No generated wave to replay".to_string())?;
    play(
        &app_handle,
        &state,
        wave.samples.as_ref().clone(),
        wave.sample_rate,
    )
    .await
}

/// Tauri command: Save the selected generated wave through a save dialog
#[tauri::command]
async fn export_wave(state: State<'_, AppState>) -> Result<Option<String>, String> {
    let wave = with_panel(&state, |p| p.selected_wave().cloned())?
        .ok_or_else(|| "No generated wave to export".to_string())?;

    let Some(file) = rfd::AsyncFileDialog::new()
        .set_title("Select a path to save the audio file")
        .set_directory(state.paths.exports_dir())
        .set_file_name(format!("{}.wav", wave.name))
        .add_filter("Audio Files", &["wav"])
        .save_file()
        .await
    else {
        return Ok(None);
    };

    let target = file.path().to_path_buf();
    let written = tokio::task::spawn_blocking(move || {
        wav::export(&target, &wave.samples, wave.sample_rate)
    })
    .await
    .map_err(|e| e.to_string())?;

    match written {
        Ok(path) => {
            with_panel(&state, |p| {
                p.log(&format!("Saved {}", path.display()), LogMode::Newline)
            })?;
            Ok(Some(path.display().to_string()))
        }
        Err(e) => {
            let message = format!("{:#}", e);
            with_panel(&state, |p| p.log(&message, LogMode::Newline))?;
            Err(message)
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("SV2TTS toolbox starting...");

    // Initialize paths
    let paths = AppPaths::new().expect("Failed to initialize application paths");
    paths
        .ensure_directories()
        .expect("Failed to create application directories");

    // Load configuration
    let config_path = paths.config_file();
    let config = AppConfig::load_or_create(&config_path).expect("Failed to load configuration");

    log::info!("Configuration loaded");

    if let Err(e) = run_app(paths, config).await {
        log::error!("Application failed to start: {}", e);
        std::process::exit(1);
    }
}

/// Bring the panel to its startup state: browser, models, options, devices
fn initialize_panel(app_handle: &AppHandle, config: &AppConfig) -> Panel {
    let sink = TauriSink {
        app: app_handle.clone(),
    };
    let mut panel = ControlPanel::new(sink, &config.toolbox, &config.ui);
    panel.reset_interface();

    if let Err(e) = panel.populate_browser(
        config.toolbox.datasets_root.as_deref(),
        &config.toolbox.recognized_datasets,
        0,
        true,
    ) {
        log::error!("Failed to populate the dataset browser: {:#}", e);
        panel.log(&format!("{:#}", e), LogMode::Newline);
    }

    if let Err(e) = panel.populate_models(&config.toolbox.run_id, &config.toolbox.models_dir) {
        log::error!("{}", e);
        panel.log(&e.to_string(), LogMode::Newline);
    }

    panel.populate_gen_options(config.toolbox.seed, config.toolbox.trim_silences);
    panel
}

/// Run the Tauri application
async fn run_app(paths: AppPaths, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config_for_setup = config.clone();

    tauri::Builder::default()
        .manage(AppState {
            paths,
            config: Arc::new(Mutex::new(config)),
            panel: Mutex::new(None),
            player: Mutex::new(Player::new()),
            utterances: Mutex::new(Vec::new()),
            devices: Mutex::new(AudioDevices::default()),
            recordings: AtomicUsize::new(0),
        })
        .setup(move |app| {
            let app_handle = app.handle().clone();

            if let Some(window) = app.get_webview_window("main") {
                let _ = window.set_title(&config_for_setup.ui.window_title);
            }

            let panel = initialize_panel(&app_handle, &config_for_setup);
            {
                let state: State<AppState> = app_handle.state();
                *state.panel.lock().unwrap() = Some(panel);
            }

            // Device enumeration can block for a while on some hosts
            let audio_config = config_for_setup.audio.clone();
            let sample_rate = audio_config.sample_rate_hz;
            tokio::spawn(async move {
                let devices = match tokio::task::spawn_blocking(move || {
                    audio::setup_devices(sample_rate)
                })
                .await
                {
                    Ok(devices) => devices,
                    Err(e) => {
                        log::error!("Audio device enumeration failed: {}", e);
                        AudioDevices {
                            sample_rate,
                            ..AudioDevices::default()
                        }
                    }
                };

                let state: State<AppState> = app_handle.state();
                *state.devices.lock().unwrap() = devices.clone();
                let _ = with_panel(&state, |p| p.apply_audio_devices(&devices, &audio_config));
                log::info!(
                    "Audio ready: {} input(s), {} output(s)",
                    devices.inputs.len(),
                    devices.outputs.len()
                );
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_panel_state,
            reset_interface,
            log_line,
            set_loading,
            get_config,
            save_preferences,
            run_preflight_checks,
            choose_datasets_root,
            browser_random,
            select_dataset,
            select_speaker,
            select_utterance,
            browser_select_next,
            load_from_browser,
            browse_file,
            populate_models,
            select_model,
            generation_request,
            register_utterance,
            select_history,
            clear_utterances,
            draw_spec,
            draw_embed,
            update_seed_textbox,
            set_seed_text,
            current_seed,
            set_griffin_lim,
            set_trim_silences,
            set_auto_next,
            set_text_prompt,
            setup_audio_devices,
            set_audio_device,
            record,
            play_utterance,
            stop,
            add_generated_wave,
            select_wave,
            replay_wave,
            export_wave
        ])
        .run(tauri::generate_context!())
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}
