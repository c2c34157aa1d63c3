//! In-process simulation backends
//!
//! Deterministic source/decoder/sink implementations used by the
//! `render-sim` harness: a tone-generating source, a passthrough PCM
//! decoder with a bounded buffer pool, and a tick-drained in-memory sink.
//! Everything here runs on the render thread; the sink is shared with the
//! harness through a handle so the harness can simulate hardware drain
//! between ticks.

use crate::audio::buffer::{InputBuffer, OutputBuffer};
use crate::audio::decoder::{AudioDecoder, DecoderFactory};
use crate::audio::sink::{AudioSink, SessionId, SinkWriteStatus};
use crate::audio::types::{AudioFormat, PcmEncoding, MIME_AUDIO_RAW};
use crate::error::{Error, Result};
use crate::playback::source::{ReadOutcome, SampleSource};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tonearm_common::timing::frames_to_us;
use tracing::debug;

/// Source that generates a fixed-length sine tone as raw PCM access units
pub struct ToneSource {
    format: AudioFormat,
    packet_frames: u64,
    frames_remaining: u64,
    frame_position: u64,
    format_sent: bool,
    eos_sent: bool,
}

impl ToneSource {
    /// Tone source producing `total_frames` frames in `packet_frames`-sized
    /// access units
    pub fn new(format: AudioFormat, packet_frames: u64, total_frames: u64) -> Self {
        Self {
            format,
            packet_frames,
            frames_remaining: total_frames,
            frame_position: 0,
            format_sent: false,
            eos_sent: false,
        }
    }

    fn fill_packet(&mut self, buffer: &mut InputBuffer) {
        let frames = self.packet_frames.min(self.frames_remaining);
        let channels = self.format.channel_count as usize;
        buffer.clear();
        buffer.timestamp_us = frames_to_us(self.frame_position, self.format.sample_rate);
        buffer.data.reserve(frames as usize * channels * 2);

        let rate = self.format.sample_rate as f64;
        for i in 0..frames {
            let t = (self.frame_position + i) as f64 / rate;
            let sample = (0.3 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()
                * i16::MAX as f64) as i16;
            for _ in 0..channels {
                buffer.data.extend_from_slice(&sample.to_le_bytes());
            }
        }

        self.frame_position += frames;
        self.frames_remaining -= frames;
    }
}

impl SampleSource for ToneSource {
    fn read(&mut self, buffer: Option<&mut InputBuffer>) -> ReadOutcome {
        if !self.format_sent {
            self.format_sent = true;
            return ReadOutcome::Format(self.format.clone());
        }
        let Some(buffer) = buffer else {
            return ReadOutcome::Nothing;
        };
        if self.frames_remaining > 0 {
            self.fill_packet(buffer);
            ReadOutcome::Buffer
        } else if !self.eos_sent {
            self.eos_sent = true;
            buffer.clear();
            buffer.end_of_stream = true;
            ReadOutcome::Buffer
        } else {
            ReadOutcome::Nothing
        }
    }

    fn is_ready(&self) -> bool {
        !self.eos_sent
    }
}

/// Passthrough decoder for raw PCM with a bounded input-slot pool
pub struct PcmDecoder {
    format: AudioFormat,
    free_input_slots: usize,
    queued: VecDeque<InputBuffer>,
}

impl PcmDecoder {
    pub fn new(format: AudioFormat, input_slots: usize) -> Self {
        Self {
            format,
            free_input_slots: input_slots,
            queued: VecDeque::new(),
        }
    }
}

impl AudioDecoder for PcmDecoder {
    fn name(&self) -> &str {
        "pcm-passthrough"
    }

    fn dequeue_input_buffer(&mut self) -> Result<Option<InputBuffer>> {
        if self.free_input_slots == 0 {
            return Ok(None);
        }
        self.free_input_slots -= 1;
        Ok(Some(InputBuffer::new()))
    }

    fn queue_input_buffer(&mut self, buffer: InputBuffer) -> Result<()> {
        self.queued.push_back(buffer);
        Ok(())
    }

    fn dequeue_output_buffer(&mut self) -> Result<Option<OutputBuffer>> {
        let Some(input) = self.queued.pop_front() else {
            return Ok(None);
        };
        // The input slot frees up once its payload has moved to the output
        // side.
        self.free_input_slots += 1;
        if input.end_of_stream {
            return Ok(Some(OutputBuffer::end_of_stream()));
        }
        Ok(Some(OutputBuffer {
            data: input.data,
            timestamp_us: input.timestamp_us,
            end_of_stream: false,
            skipped_count: 0,
        }))
    }

    fn release_output_buffer(&mut self, buffer: OutputBuffer) {
        drop(buffer);
    }

    fn flush(&mut self) {
        self.free_input_slots += self.queued.len();
        self.queued.clear();
    }

    // Raw PCM passes through unchanged, whatever the input encoding.
    fn output_format(&self, _input: &AudioFormat) -> AudioFormat {
        self.format.clone()
    }
}

/// Factory for [`PcmDecoder`]
pub struct PcmDecoderFactory {
    input_slots: usize,
}

impl PcmDecoderFactory {
    pub fn new(input_slots: usize) -> Self {
        Self { input_slots }
    }
}

impl DecoderFactory for PcmDecoderFactory {
    fn create(&mut self, format: &AudioFormat) -> Result<Box<dyn AudioDecoder>> {
        if format.sample_mime_type != MIME_AUDIO_RAW {
            return Err(Error::DecoderInit(format!(
                "unsupported mime type: {}",
                format.sample_mime_type
            )));
        }
        Ok(Box::new(PcmDecoder::new(format.clone(), self.input_slots)))
    }
}

struct SimSinkState {
    format: Option<AudioFormat>,
    initialized: bool,
    playing: bool,
    capacity_frames: u64,
    buffered_bytes: usize,
    played_frames: u64,
    received_end_of_stream: bool,
    volume: f32,
    next_session_id: SessionId,
}

impl SimSinkState {
    fn bytes_per_frame(&self) -> usize {
        self.format.as_ref().map(|f| f.bytes_per_frame()).unwrap_or(4)
    }
}

/// Tick-drained in-memory audio sink
///
/// Holds up to `capacity_frames` of PCM. `handle_buffer` refuses a write
/// that would overflow (backpressure); the harness calls
/// [`SimSinkHandle::drain`] between ticks to play frames out.
pub struct SimSink {
    state: Rc<RefCell<SimSinkState>>,
}

/// Harness-side handle onto a [`SimSink`]
#[derive(Clone)]
pub struct SimSinkHandle {
    state: Rc<RefCell<SimSinkState>>,
}

impl SimSink {
    /// Create a sink and its harness handle
    pub fn new(capacity_frames: u64) -> (Self, SimSinkHandle) {
        let state = Rc::new(RefCell::new(SimSinkState {
            format: None,
            initialized: false,
            playing: false,
            capacity_frames,
            buffered_bytes: 0,
            played_frames: 0,
            received_end_of_stream: false,
            volume: 1.0,
            next_session_id: 1,
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            SimSinkHandle { state },
        )
    }
}

impl SimSinkHandle {
    /// Play out up to `frames` frames of buffered data
    ///
    /// No-op while the sink is paused.
    pub fn drain(&self, frames: u64) {
        let mut state = self.state.borrow_mut();
        if !state.playing {
            return;
        }
        let bytes_per_frame = state.bytes_per_frame();
        let drained_bytes = (frames as usize * bytes_per_frame).min(state.buffered_bytes);
        state.buffered_bytes -= drained_bytes;
        state.played_frames += (drained_bytes / bytes_per_frame) as u64;
    }

    /// Frames played out so far
    pub fn played_frames(&self) -> u64 {
        self.state.borrow().played_frames
    }

    /// Bytes currently buffered
    pub fn buffered_bytes(&self) -> usize {
        self.state.borrow().buffered_bytes
    }

    /// Current sink volume
    pub fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    /// Whether the renderer has signalled end of stream to the sink
    pub fn reached_end_of_stream(&self) -> bool {
        self.state.borrow().received_end_of_stream
    }
}

impl AudioSink for SimSink {
    fn configure(&mut self, format: &AudioFormat) -> Result<()> {
        if format.sample_mime_type != MIME_AUDIO_RAW {
            return Err(Error::SinkInit(format!(
                "sink only accepts raw PCM, got {}",
                format.sample_mime_type
            )));
        }
        if format.pcm_encoding == PcmEncoding::Pcm24 {
            return Err(Error::SinkInit(
                "sink does not support packed 24-bit PCM".to_string(),
            ));
        }
        self.state.borrow_mut().format = Some(format.clone());
        Ok(())
    }

    fn initialize(&mut self, session_id: Option<SessionId>) -> Result<SessionId> {
        let mut state = self.state.borrow_mut();
        if state.format.is_none() {
            return Err(Error::SinkInit("initialize before configure".to_string()));
        }
        let id = match session_id {
            Some(id) => id,
            None => {
                let id = state.next_session_id;
                state.next_session_id += 1;
                id
            }
        };
        state.initialized = true;
        debug!(session_id = id, "sim sink initialized");
        Ok(id)
    }

    fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    fn has_pending_data(&self) -> bool {
        self.state.borrow().buffered_bytes > 0
    }

    fn handle_buffer(&mut self, data: &[u8], _timestamp_us: i64) -> Result<SinkWriteStatus> {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            return Err(Error::SinkWrite("buffer before initialize".to_string()));
        }
        let capacity_bytes = state.capacity_frames as usize * state.bytes_per_frame();
        if state.buffered_bytes + data.len() > capacity_bytes {
            // Full: backpressure, caller retries the same buffer next tick.
            return Ok(SinkWriteStatus {
                consumed: false,
                position_discontinuity: false,
            });
        }
        state.buffered_bytes += data.len();
        Ok(SinkWriteStatus {
            consumed: true,
            position_discontinuity: false,
        })
    }

    fn handle_end_of_stream(&mut self) {
        self.state.borrow_mut().received_end_of_stream = true;
    }

    fn position_us(&self, _ended: bool) -> Option<i64> {
        let state = self.state.borrow();
        if !state.initialized {
            return None;
        }
        let format = state.format.as_ref()?;
        Some(frames_to_us(state.played_frames, format.sample_rate))
    }

    fn buffer_size_bytes(&self) -> usize {
        let state = self.state.borrow();
        state.capacity_frames as usize * state.bytes_per_frame()
    }

    fn buffer_size_us(&self) -> Option<i64> {
        let state = self.state.borrow();
        state
            .format
            .as_ref()
            .map(|f| frames_to_us(state.capacity_frames, f.sample_rate))
    }

    fn play(&mut self) {
        self.state.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn reset(&mut self) {
        let mut state = self.state.borrow_mut();
        state.format = None;
        state.initialized = false;
        state.buffered_bytes = 0;
        state.played_frames = 0;
        state.received_end_of_stream = false;
    }

    fn release(&mut self) {
        self.reset();
        self.state.borrow_mut().playing = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }
}
