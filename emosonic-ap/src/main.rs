//! emosonic - Main entry point
//!
//! Loads configuration, opens the audio device, decodes the sample bank in
//! the background and steps the installation at the configured frame rate
//! from a detection replay until the replay ends, the optional duration
//! elapses, or Ctrl-C / SIGTERM arrives. On the way out every voice gets the
//! short forced fade-out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use emosonic_ap::audio::resampler::DEFAULT_SAMPLE_RATE;
use emosonic_ap::audio::{AudioOutput, SampleBank};
use emosonic_ap::detection::{DetectionSource, ReplaySource};
use emosonic_ap::playback::{AudioBackend, MixerHandle, NullBackend, VoiceMixer};
use emosonic_ap::state::AudioStatus;
use emosonic_ap::{Installation, SharedState};
use emosonic_common::config::{resolve_config_path, InstallationConfig, CONFIG_ENV_VAR};
use emosonic_common::events::InstallationEvent;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for emosonic
#[derive(Parser, Debug)]
#[command(name = "emosonic")]
#[command(about = "Emotion-driven crossfading sample player")]
#[command(version)]
struct Args {
    /// Configuration file (overrides EMOSONIC_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-lines detection recording to replay
    #[arg(short, long, env = "EMOSONIC_REPLAY")]
    replay: Option<PathBuf>,

    /// Restart the replay when it ends
    #[arg(long)]
    loop_replay: bool,

    /// Output device name (overrides the config file)
    #[arg(short, long)]
    device: Option<String>,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Frames per second (overrides the config file)
    #[arg(long)]
    frame_rate: Option<u32>,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let mut config = InstallationConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;
    if let Some(device) = args.device.clone() {
        config.audio.device = Some(device);
    }
    if let Some(rate) = args.frame_rate {
        config.frame_rate = rate;
    }
    config.validate().context("Invalid configuration")?;

    // Initialize tracing
    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("emosonic_ap={level},emosonic_common={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.list_devices {
        for name in AudioOutput::list_devices().context("Failed to list audio devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    info!("Starting emosonic");
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    let state = Arc::new(SharedState::new());
    spawn_event_logger(&state);

    // Audio output; fall back to a silent backend
    let (output, backend, sample_rate): (Option<AudioOutput>, Box<dyn AudioBackend>, u32) =
        match open_audio(&config) {
            Ok((output, handle)) => {
                let rate = output.sample_rate();
                state.set_audio_status(AudioStatus::Ready).await;
                (Some(output), Box::new(handle) as Box<dyn AudioBackend>, rate)
            }
            Err(e) => {
                error!("Audio unavailable, running silent: {}", e);
                state.report_audio_unavailable(e.to_string()).await;
                (None, Box::new(NullBackend::new()) as Box<dyn AudioBackend>, DEFAULT_SAMPLE_RATE)
            }
        };

    let mut installation = Installation::new(&config, backend);
    info!(
        "Smoothing over {} frames",
        installation.estimator().window()
    );
    let mut loader = Some(SampleBank::spawn_load(config.clone(), sample_rate));

    let mut source: Box<dyn DetectionSource> = match &args.replay {
        Some(path) => Box::new(
            ReplaySource::from_path(path, args.loop_replay).context("Failed to load replay")?,
        ),
        None => {
            warn!("No detection replay given, running without input");
            Box::new(ReplaySource::from_frames(vec![None], true))
        }
    };

    let frame_interval = config.frame_interval();
    let limit = args.duration.map(Duration::from_secs_f64);
    info!(
        "Frame loop at {} fps{}",
        config.frame_rate,
        limit.map_or(String::new(), |l| format!(" for {:?}", l))
    );

    let started = tokio::time::Instant::now();
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut stream_failed = false;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {}
        }

        let now = started.elapsed();
        if limit.is_some_and(|limit| now >= limit) {
            info!("Duration elapsed");
            break;
        }

        if !stream_failed && output.as_ref().is_some_and(AudioOutput::has_error) {
            stream_failed = true;
            warn!("Audio stream failed, continuing without sound");
            state
                .report_audio_unavailable("audio stream error".to_string())
                .await;
        }

        if loader.as_ref().is_some_and(|handle| handle.is_finished()) {
            if let Some(handle) = loader.take() {
                match handle.await {
                    Ok((bank, report)) => {
                        installation.install_samples(Arc::new(bank));
                        state.broadcast_event(InstallationEvent::SamplesLoaded {
                            loaded: report.loaded,
                            missing: report.missing,
                            timestamp: chrono::Utc::now(),
                        });
                    }
                    Err(e) => error!("Sample loading task failed: {}", e),
                }
            }
        }

        let Some(frame) = source.next_frame() else {
            info!("Replay finished");
            break;
        };

        let result = installation.step(frame, now);
        for event in result.events {
            state.broadcast_event(event);
        }
        state.publish_snapshot(result.snapshot).await;
    }

    // Forced fade-out, then keep ticking until every voice is released
    let now = started.elapsed();
    for event in installation.shutdown(now) {
        state.broadcast_event(event);
    }
    let deadline = now + config.audio.forced_fade_out() + frame_interval * 2;
    while !installation.is_quiet() && started.elapsed() < deadline {
        interval.tick().await;
        for event in installation.tick(started.elapsed()) {
            state.broadcast_event(event);
        }
    }

    drop(output);
    info!("emosonic stopped");
    Ok(())
}

fn open_audio(config: &InstallationConfig) -> emosonic_ap::Result<(AudioOutput, MixerHandle)> {
    let mut output = AudioOutput::new(config.audio.device.as_deref())?;
    let (mut mixer, handle) = VoiceMixer::new(config.audio.master_volume, config.audio.loop_samples);
    output.start(move || mixer.next_frame())?;
    Ok((output, handle))
}

/// Log every published event
fn spawn_event_logger(state: &Arc<SharedState>) {
    let mut rx = state.subscribe_events();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Event logger skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn log_event(event: &InstallationEvent) {
    match event {
        InstallationEvent::EmotionChanged {
            primary, secondary, ..
        } => info!("Emotion: {} / {}", primary, secondary),
        InstallationEvent::ReadoutChanged {
            slot,
            emotion,
            percent,
            ..
        } => debug!("Readout {}: {} ({}%)", slot, emotion, percent),
        InstallationEvent::DetectionStatusChanged { detected, .. } => {
            debug!("Detection status: {}", detected)
        }
        InstallationEvent::ChannelStateChanged {
            channel,
            state,
            emotion,
            ..
        } => debug!("{} channel -> {:?} ({:?})", channel, state, emotion),
        InstallationEvent::VoicesStarted {
            channel,
            emotion,
            voices,
            ..
        } => info!("{} channel: {} started ({} voices)", channel, emotion, voices),
        InstallationEvent::ActivationCancelled {
            channel, emotion, ..
        } => debug!("{} channel: {} cancelled before start", channel, emotion),
        InstallationEvent::FadeOutCompleted {
            channel, emotion, ..
        } => info!("{} channel: {} released", channel, emotion),
        InstallationEvent::SamplesLoaded {
            loaded, missing, ..
        } => {
            if *missing > 0 {
                warn!("Samples loaded: {} ({} missing)", loaded, missing);
            } else {
                info!("Samples loaded: {}", loaded);
            }
        }
        InstallationEvent::AudioUnavailable { reason, .. } => {
            warn!("Audio unavailable: {}", reason)
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
