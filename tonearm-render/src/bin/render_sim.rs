//! Render pipeline simulation harness
//!
//! Drives an [`AudioRenderer`] wired to the in-process simulation backends:
//! a tone source, a passthrough PCM decoder, and a tick-drained sink. Acts
//! as the host scheduler, calling one render tick per interval and draining
//! the sink in between, then reports counters and any emitted events.
//!
//! **Usage:**
//! ```bash
//! render-sim [--config <file>] [--realtime] [--volume 0.8]
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use tonearm_common::events::EventBus;
use tonearm_common::timing::ms_to_us;
use tonearm_render::audio::types::AudioFormat;
use tonearm_render::config::RenderConfig;
use tonearm_render::playback::renderer::{AudioRenderer, RendererMessage};
use tonearm_render::sim::{PcmDecoderFactory, SimSink, ToneSource};
use tracing::info;

/// Render pipeline simulation harness
#[derive(Parser, Debug)]
#[clap(name = "render-sim")]
#[clap(about = "Run the audio render pipeline against simulated backends")]
struct Args {
    /// Path to a TOML config file (defaults to the platform config dir)
    #[clap(long, value_name = "FILE")]
    config: Option<std::path::PathBuf>,

    /// Sleep one tick interval between ticks instead of running flat out
    #[clap(long)]
    realtime: bool,

    /// Sink volume override (0.0 silence, 1.0 unity)
    #[clap(long)]
    volume: Option<f32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = RenderConfig::load(args.config.as_deref())?;
    info!(?config, "starting render simulation");

    let format = AudioFormat::pcm16(config.channel_count, config.sample_rate);
    let source = ToneSource::new(format, config.packet_frames, config.total_frames());
    let (sink, sink_handle) = SimSink::new(config.sink_buffer_frames);

    let events = EventBus::new(256);
    let mut event_rx = events.subscribe();

    let mut renderer = AudioRenderer::new(
        0,
        Box::new(source),
        Box::new(PcmDecoderFactory::new(4)),
        Box::new(sink),
        events,
    );
    renderer.set_session_hook(|id| info!(session_id = id, "audio session assigned"));

    renderer.enable()?;
    renderer.start()?;
    renderer.handle_message(RendererMessage::SetVolume(
        args.volume.unwrap_or(config.volume),
    ));

    let tick_us = ms_to_us(config.tick_interval_ms as i64);
    let frames_per_tick =
        (config.sample_rate as u64 * config.tick_interval_ms) / 1_000;
    // Generous cap: the tone plus ten seconds of scheduling slack.
    let max_ticks =
        (config.duration_secs * 1_000.0) as u64 / config.tick_interval_ms.max(1) + 1_000;

    let mut elapsed_us: i64 = 0;
    let mut ticks: u64 = 0;
    while !renderer.is_ended() {
        if ticks > max_ticks {
            bail!("simulation did not finish within {} ticks", max_ticks);
        }
        let position_us = renderer.position_us();
        renderer
            .render(position_us, elapsed_us)
            .context("render tick failed")?;
        sink_handle.drain(frames_per_tick);

        while let Ok(event) = event_rx.try_recv() {
            info!(event = ?event, "render event");
        }

        if args.realtime {
            std::thread::sleep(std::time::Duration::from_millis(config.tick_interval_ms));
        }
        elapsed_us += tick_us;
        ticks += 1;
    }

    let final_position_us = renderer.position_us();
    info!(
        ticks,
        final_position_us,
        played_frames = sink_handle.played_frames(),
        counters = %renderer.counters(),
        "simulation complete"
    );

    renderer.stop()?;
    renderer.disable();
    Ok(())
}
