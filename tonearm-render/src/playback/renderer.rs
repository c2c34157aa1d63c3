//! Audio render pipeline
//!
//! The core of the crate: a pull-based, single-threaded render loop invoked
//! once per host scheduler tick. Each tick acquires a format and decoder if
//! needed, then drains decoder output into the sink until no progress is
//! possible, then feeds encoded input into the decoder until no progress is
//! possible. Backpressure anywhere simply stops the corresponding loop until
//! the next tick; only real decoder/sink failures abort a tick.
//!
//! The renderer holds at most one input buffer and one output buffer at any
//! instant. Buffer hand-off is by move at every queue/dequeue/release
//! boundary.

use crate::audio::buffer::{InputBuffer, OutputBuffer};
use crate::audio::decoder::{AudioDecoder, DecoderFactory};
use crate::audio::sink::{AudioSink, SessionId};
use crate::audio::types::AudioFormat;
use crate::error::{Error, PlaybackError, Result};
use crate::playback::clock::PlaybackClock;
use crate::playback::source::{ReadOutcome, SampleSource};
use std::time::Instant;
use tonearm_common::events::{EventBus, RenderEvent};
use tonearm_common::timing::us_to_ms;
use tonearm_common::DecoderCounters;
use tracing::{debug, info, trace, warn};

/// Renderer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// Not enabled; holds no decoder or format
    Disabled,
    /// Enabled but not playing
    Enabled,
    /// Enabled and playing
    Started,
}

/// Control messages accepted by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RendererMessage {
    /// Set sink gain: 0.0 is silence, 1.0 is unity. Forwarded verbatim.
    SetVolume(f32),
    /// Pre-assign the audio session id. Suppresses the fresh-session hook.
    SetSessionId(SessionId),
}

/// Callback invoked when a fresh audio session id is first obtained
pub type SessionHook = Box<dyn FnMut(SessionId)>;

/// Decodes and renders audio pulled from a [`SampleSource`]
///
/// Owns the decoder lifecycle, the input/output buffer flow, underrun
/// detection, audio-session handling, and position derivation. The host
/// guarantees serialized invocation; there is no internal locking.
pub struct AudioRenderer {
    /// This renderer's index within the host's renderer set, used to tag
    /// playback errors
    index: usize,
    state: RendererState,

    source: Box<dyn SampleSource>,
    decoder_factory: Box<dyn DecoderFactory>,
    sink: Box<dyn AudioSink>,
    events: EventBus,

    counters: DecoderCounters,
    clock: PlaybackClock,

    input_format: Option<AudioFormat>,
    decoder: Option<Box<dyn AudioDecoder>>,
    input_buffer: Option<InputBuffer>,
    output_buffer: Option<OutputBuffer>,

    input_stream_ended: bool,
    output_stream_ended: bool,

    session_id: Option<SessionId>,
    session_hook: Option<SessionHook>,

    /// Whether the sink reported pending data on the previous check, for
    /// underrun edge detection
    sink_had_data: bool,
    /// Host elapsed-realtime at the last successful sink feed
    last_feed_elapsed_us: i64,
}

impl AudioRenderer {
    /// Create a renderer over the given collaborators
    pub fn new(
        index: usize,
        source: Box<dyn SampleSource>,
        decoder_factory: Box<dyn DecoderFactory>,
        sink: Box<dyn AudioSink>,
        events: EventBus,
    ) -> Self {
        Self {
            index,
            state: RendererState::Disabled,
            source,
            decoder_factory,
            sink,
            events,
            counters: DecoderCounters::default(),
            clock: PlaybackClock::new(),
            input_format: None,
            decoder: None,
            input_buffer: None,
            output_buffer: None,
            input_stream_ended: false,
            output_stream_ended: false,
            session_id: None,
            session_hook: None,
            sink_had_data: false,
            last_feed_elapsed_us: 0,
        }
    }

    /// Install the hook invoked when a fresh audio session id is obtained
    ///
    /// The hook fires at most once per enable period, and not at all if a
    /// session id was pre-assigned before the sink first initialized.
    pub fn set_session_hook(&mut self, hook: impl FnMut(SessionId) + 'static) {
        self.session_hook = Some(Box::new(hook));
    }

    /// Track type this renderer handles
    pub fn track_type(&self) -> &'static str {
        "audio"
    }

    /// Current lifecycle state
    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Snapshot of the decoder counters
    pub fn counters(&self) -> DecoderCounters {
        self.counters
    }

    /// One render tick
    ///
    /// `position_us` is the host's media position for this tick;
    /// `elapsed_realtime_us` is the host's monotonic clock, used for feed
    /// timing and underrun gap measurement. No-op once output has ended.
    /// Decoder and sink failures are fatal to the tick and come back tagged
    /// with this renderer's index.
    pub fn render(
        &mut self,
        position_us: i64,
        elapsed_realtime_us: i64,
    ) -> std::result::Result<(), PlaybackError> {
        trace!(position_us, elapsed_realtime_us, "render tick");
        if self.state == RendererState::Disabled {
            return Err(PlaybackError::for_renderer(
                self.index,
                Error::InvalidState("render on a disabled renderer".to_string()),
            ));
        }
        if self.output_stream_ended {
            return Ok(());
        }
        self.render_inner(elapsed_realtime_us)
            .map_err(|e| PlaybackError::for_renderer(self.index, e))
    }

    fn render_inner(&mut self, elapsed_realtime_us: i64) -> Result<()> {
        // No format yet: try to read one; without it nothing can happen.
        if self.input_format.is_none() && !self.read_format() {
            return Ok(());
        }

        if self.decoder.is_none() {
            self.init_decoder()?;
        }

        while self.drain_output(elapsed_realtime_us)? {}
        while self.feed_input()? {}
        Ok(())
    }

    /// Probe the source for a format without consuming any payload
    fn read_format(&mut self) -> bool {
        match self.source.read(None) {
            ReadOutcome::Format(format) => {
                info!(%format, "input format acquired");
                self.input_format = Some(format);
                true
            }
            _ => false,
        }
    }

    /// Construct the decoder for the current input format
    fn init_decoder(&mut self) -> Result<()> {
        let format = self.input_format.as_ref().ok_or_else(|| {
            Error::InvalidState("decoder construction without an input format".to_string())
        })?;

        let construction_started = Instant::now();
        let decoder = self.decoder_factory.create(format)?;
        let init_duration_ms = construction_started.elapsed().as_millis() as u64;

        self.counters.decoder_init_count += 1;
        info!(name = decoder.name(), init_duration_ms, "decoder initialized");
        self.events.emit(RenderEvent::DecoderInitialized {
            name: decoder.name().to_string(),
            init_duration_ms,
            timestamp: chrono::Utc::now(),
        });

        self.decoder = Some(decoder);
        Ok(())
    }

    /// One drain step: move at most one decoded buffer toward the sink
    ///
    /// Returns whether progress was made. A `None` dequeue or a
    /// non-consumed sink write is backpressure, not failure.
    fn drain_output(&mut self, elapsed_realtime_us: i64) -> Result<bool> {
        if self.output_stream_ended {
            return Ok(false);
        }

        if self.output_buffer.is_none() {
            let Some(decoder) = self.decoder.as_mut() else {
                return Ok(false);
            };
            match decoder.dequeue_output_buffer()? {
                Some(buffer) => {
                    trace!(
                        timestamp_us = buffer.timestamp_us,
                        bytes = buffer.data.len(),
                        eos = buffer.end_of_stream,
                        "dequeued output buffer"
                    );
                    self.counters.skipped_output_buffer_count += buffer.skipped_count;
                    self.output_buffer = Some(buffer);
                }
                // Decoder still working; try again next tick.
                None => return Ok(false),
            }
        }

        if self.output_buffer.as_ref().is_some_and(|b| b.end_of_stream) {
            debug!("decoder output reached end of stream");
            self.output_stream_ended = true;
            self.sink.handle_end_of_stream();
            if let (Some(buffer), Some(decoder)) = (self.output_buffer.take(), self.decoder.as_mut())
            {
                decoder.release_output_buffer(buffer);
            }
            return Ok(false);
        }

        if !self.sink.is_initialized() {
            self.initialize_sink()?;
        } else {
            // Underrun check: pending data on the previous look, none now,
            // while playing.
            let had_data = self.sink_had_data;
            self.sink_had_data = self.sink.has_pending_data();
            if had_data && !self.sink_had_data && self.state == RendererState::Started {
                let elapsed_since_feed_ms =
                    us_to_ms(elapsed_realtime_us - self.last_feed_elapsed_us);
                let buffer_size_bytes = self.sink.buffer_size_bytes();
                let buffer_size_ms = self.sink.buffer_size_us().map(us_to_ms);
                warn!(
                    buffer_size_bytes,
                    ?buffer_size_ms,
                    elapsed_since_feed_ms,
                    "sink underrun"
                );
                self.events.emit(RenderEvent::SinkUnderrun {
                    buffer_size_bytes,
                    buffer_size_ms,
                    elapsed_since_feed_ms,
                    timestamp: chrono::Utc::now(),
                });
            }
        }

        let status = {
            let buffer = self.output_buffer.as_ref().ok_or_else(|| {
                Error::InvalidState("output buffer vanished mid-drain".to_string())
            })?;
            self.sink.handle_buffer(&buffer.data, buffer.timestamp_us)?
        };
        self.last_feed_elapsed_us = elapsed_realtime_us;

        if status.position_discontinuity {
            debug!("sink reported position discontinuity");
            self.clock.allow_discontinuity();
        }

        if status.consumed {
            self.counters.rendered_output_buffer_count += 1;
            if let (Some(buffer), Some(decoder)) = (self.output_buffer.take(), self.decoder.as_mut())
            {
                decoder.release_output_buffer(buffer);
            }
            return Ok(true);
        }

        // Sink backpressure: keep the buffer for the next tick.
        Ok(false)
    }

    /// Configure and initialize the sink for the decoder's output format
    ///
    /// Called once per output-format determination, after the first output
    /// buffer is available. Re-runs after a sink reset, reusing the session
    /// id assigned earlier in this enable period.
    fn initialize_sink(&mut self) -> Result<()> {
        let input = self.input_format.as_ref().ok_or_else(|| {
            Error::InvalidState("sink initialization without an input format".to_string())
        })?;
        let decoder = self.decoder.as_ref().ok_or_else(|| {
            Error::InvalidState("sink initialization without a decoder".to_string())
        })?;

        let output_format = decoder.output_format(input);
        info!(%output_format, "configuring sink");
        self.sink.configure(&output_format)?;

        match self.session_id {
            Some(id) => {
                self.sink.initialize(Some(id))?;
            }
            None => {
                let id = self.sink.initialize(None)?;
                debug!(session_id = id, "fresh audio session acquired");
                self.session_id = Some(id);
                if let Some(hook) = self.session_hook.as_mut() {
                    hook(id);
                }
            }
        }

        self.sink_had_data = false;
        if self.state == RendererState::Started {
            self.sink.play();
        }
        Ok(())
    }

    /// One feed step: move at most one encoded buffer toward the decoder
    ///
    /// Returns whether progress was made.
    fn feed_input(&mut self) -> Result<bool> {
        if self.input_stream_ended {
            return Ok(false);
        }
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(false);
        };

        let mut buffer = match self.input_buffer.take() {
            Some(buffer) => buffer,
            None => match decoder.dequeue_input_buffer()? {
                Some(buffer) => buffer,
                // Every input slot is in flight; try again next tick.
                None => return Ok(false),
            },
        };

        match self.source.read(Some(&mut buffer)) {
            ReadOutcome::Nothing => {
                self.input_buffer = Some(buffer);
                Ok(false)
            }
            ReadOutcome::Format(format) => {
                info!(%format, "input format changed");
                self.input_format = Some(format);
                // The held buffer is untouched and is reused next step.
                self.input_buffer = Some(buffer);
                Ok(true)
            }
            ReadOutcome::Buffer => {
                if buffer.end_of_stream {
                    debug!("input reached end of stream");
                    self.input_stream_ended = true;
                    decoder.queue_input_buffer(buffer)?;
                    return Ok(false);
                }
                trace!(
                    timestamp_us = buffer.timestamp_us,
                    bytes = buffer.data.len(),
                    "queueing input buffer"
                );
                decoder.queue_input_buffer(buffer)?;
                self.counters.input_buffer_count += 1;
                Ok(true)
            }
        }
    }

    /// Drop in-flight buffers and reset the decoder's stream state
    ///
    /// The held input buffer is dropped without queueing; the held output
    /// buffer goes back to the decoder's pool. An output buffer is only
    /// ever held while a decoder exists. The decoder keeps its
    /// configuration and accepts fresh input immediately.
    fn flush_decoder(&mut self) {
        self.input_buffer = None;
        if let Some(decoder) = self.decoder.as_mut() {
            if let Some(buffer) = self.output_buffer.take() {
                decoder.release_output_buffer(buffer);
            }
            decoder.flush();
        }
    }

    /// Reposition playback (seek)
    ///
    /// Resets the sink's buffering and timing, rebases the clock to
    /// `position_us` with one backward jump allowed, clears both
    /// stream-ended flags, and flushes the decoder if one exists.
    pub fn reset(&mut self, position_us: i64) {
        debug!(position_us, "resetting renderer position");
        self.sink.reset();
        self.clock.reset_to(position_us);
        self.input_stream_ended = false;
        self.output_stream_ended = false;
        if self.decoder.is_some() {
            self.flush_decoder();
        }
    }

    /// Enable the renderer
    ///
    /// The decoder is not created here; it is constructed lazily on the
    /// first render tick that has a format. Emits a counters snapshot as a
    /// baseline for external reporting.
    pub fn enable(&mut self) -> Result<()> {
        if self.state != RendererState::Disabled {
            return Err(Error::InvalidState(
                "enable on a renderer that is not disabled".to_string(),
            ));
        }
        debug!("renderer enabled");
        self.state = RendererState::Enabled;
        self.events.emit(RenderEvent::CountersSnapshot {
            counters: self.counters,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Begin playing
    pub fn start(&mut self) -> Result<()> {
        if self.state != RendererState::Enabled {
            return Err(Error::InvalidState(
                "start on a renderer that is not enabled".to_string(),
            ));
        }
        debug!("renderer started");
        self.state = RendererState::Started;
        self.sink.play();
        Ok(())
    }

    /// Stop playing, staying enabled
    pub fn stop(&mut self) -> Result<()> {
        if self.state != RendererState::Started {
            return Err(Error::InvalidState(
                "stop on a renderer that is not started".to_string(),
            ));
        }
        debug!("renderer stopped");
        self.state = RendererState::Enabled;
        self.sink.pause();
        Ok(())
    }

    /// Disable the renderer, releasing the decoder and the sink
    ///
    /// Cleanup is unconditional: held buffers are dropped, the format and
    /// session id are cleared, and both the decoder and the sink are
    /// released on every path through this method.
    pub fn disable(&mut self) {
        debug!("disabling renderer");
        self.input_buffer = None;
        self.output_buffer = None;
        self.input_format = None;
        self.session_id = None;
        if let Some(decoder) = self.decoder.take() {
            drop(decoder);
            self.counters.decoder_release_count += 1;
        }
        self.sink.release();
        self.state = RendererState::Disabled;
    }

    /// Whether playback can continue
    ///
    /// True if the sink holds unconsumed data, or a format is known and
    /// either the source has more to offer or an output buffer is held
    /// awaiting the sink.
    pub fn is_ready(&self) -> bool {
        self.sink.has_pending_data()
            || (self.input_format.is_some()
                && (self.source.is_ready() || self.output_buffer.is_some()))
    }

    /// Whether playback has fully finished
    ///
    /// True only when decoder output has ended and the sink has drained.
    pub fn is_ended(&self) -> bool {
        self.output_stream_ended && !self.sink.has_pending_data()
    }

    /// Current playback position in microseconds
    ///
    /// Queries the sink and folds the report through the playback clock:
    /// monotonic unless a discontinuity was explicitly allowed.
    pub fn position_us(&mut self) -> i64 {
        let ended = self.is_ended();
        self.clock.advance(self.sink.position_us(ended))
    }

    /// Handle an inward control message
    pub fn handle_message(&mut self, message: RendererMessage) {
        match message {
            RendererMessage::SetVolume(volume) => {
                debug!(volume, "setting sink volume");
                self.sink.set_volume(volume);
            }
            RendererMessage::SetSessionId(id) => {
                debug!(session_id = id, "audio session pre-assigned");
                self.session_id = Some(id);
            }
        }
    }
}
