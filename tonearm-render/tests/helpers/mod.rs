//! Shared test doubles for the render pipeline tests
//!
//! A scripted source, a loopback decoder, and a scripted sink, all
//! instrumented so tests can observe exactly what the renderer did. The
//! decoder asserts the single-borrow invariant on every call: if the
//! renderer ever holds more than one input or output buffer at once, the
//! test panics at the point of violation.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tonearm_render::audio::buffer::{InputBuffer, OutputBuffer};
use tonearm_render::audio::decoder::{AudioDecoder, DecoderFactory};
use tonearm_render::audio::sink::{AudioSink, SessionId, SinkWriteStatus};
use tonearm_render::audio::types::AudioFormat;
use tonearm_render::error::{Error, Result};
use tonearm_render::playback::renderer::AudioRenderer;
use tonearm_render::playback::source::{ReadOutcome, SampleSource};

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// One scripted source step, consumed per `read` call
#[derive(Debug, Clone)]
pub enum SourceStep {
    /// Report a format change
    Format(AudioFormat),
    /// Fill the buffer with a payload and timestamp
    Payload(Vec<u8>, i64),
    /// Mark the buffer end-of-stream
    Eos,
    /// Stall for one read
    Nothing,
}

/// Source that replays a fixed script of read outcomes
pub struct ScriptedSource {
    steps: VecDeque<SourceStep>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<SourceStep>) -> Self {
        Self {
            steps: steps.into(),
        }
    }
}

impl SampleSource for ScriptedSource {
    fn read(&mut self, buffer: Option<&mut InputBuffer>) -> ReadOutcome {
        let Some(buffer) = buffer else {
            // Probe mode: only a format may be surfaced, and non-format
            // steps are left in place.
            if matches!(self.steps.front(), Some(SourceStep::Format(_))) {
                if let Some(SourceStep::Format(format)) = self.steps.pop_front() {
                    return ReadOutcome::Format(format);
                }
            }
            return ReadOutcome::Nothing;
        };

        match self.steps.pop_front() {
            None | Some(SourceStep::Nothing) => ReadOutcome::Nothing,
            Some(SourceStep::Format(format)) => ReadOutcome::Format(format),
            Some(SourceStep::Payload(data, timestamp_us)) => {
                buffer.clear();
                buffer.data = data;
                buffer.timestamp_us = timestamp_us;
                ReadOutcome::Buffer
            }
            Some(SourceStep::Eos) => {
                buffer.clear();
                buffer.end_of_stream = true;
                ReadOutcome::Buffer
            }
        }
    }

    fn is_ready(&self) -> bool {
        !self.steps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Observations recorded by the loopback decoder
#[derive(Debug, Default)]
pub struct DecoderStats {
    pub inputs_dequeued: u32,
    pub inputs_queued: u32,
    pub outputs_produced: u32,
    pub outputs_released: u32,
    pub flush_calls: u32,
    pub eos_queued: bool,
    pub dropped: bool,
    outstanding_inputs: u32,
    outstanding_outputs: u32,
}

/// Decoder that echoes queued input back as output 1:1
///
/// `output_delay` makes the first N output dequeues return `None` to model
/// a decoder that is still warming up. Asserts that the renderer never
/// borrows a second buffer while one is outstanding.
pub struct LoopbackDecoder {
    stats: Rc<RefCell<DecoderStats>>,
    free_input_slots: usize,
    queued: VecDeque<InputBuffer>,
    output_delay: u32,
    fail_dequeue_output: Option<String>,
    output_format_override: Option<AudioFormat>,
    skip_per_buffer: u64,
}

impl AudioDecoder for LoopbackDecoder {
    fn name(&self) -> &str {
        "loopback"
    }

    fn dequeue_input_buffer(&mut self) -> Result<Option<InputBuffer>> {
        if self.free_input_slots == 0 {
            return Ok(None);
        }
        let mut stats = self.stats.borrow_mut();
        stats.outstanding_inputs += 1;
        assert!(
            stats.outstanding_inputs <= 1,
            "renderer borrowed a second input buffer"
        );
        stats.inputs_dequeued += 1;
        self.free_input_slots -= 1;
        Ok(Some(InputBuffer::new()))
    }

    fn queue_input_buffer(&mut self, buffer: InputBuffer) -> Result<()> {
        let mut stats = self.stats.borrow_mut();
        stats.outstanding_inputs -= 1;
        stats.inputs_queued += 1;
        if buffer.end_of_stream {
            stats.eos_queued = true;
        }
        drop(stats);
        self.queued.push_back(buffer);
        Ok(())
    }

    fn dequeue_output_buffer(&mut self) -> Result<Option<OutputBuffer>> {
        if let Some(message) = &self.fail_dequeue_output {
            return Err(Error::Decoder(message.clone()));
        }
        if self.output_delay > 0 {
            self.output_delay -= 1;
            return Ok(None);
        }
        let Some(input) = self.queued.pop_front() else {
            return Ok(None);
        };
        self.free_input_slots += 1;

        let mut stats = self.stats.borrow_mut();
        stats.outstanding_outputs += 1;
        assert!(
            stats.outstanding_outputs <= 1,
            "renderer borrowed a second output buffer"
        );
        stats.outputs_produced += 1;
        drop(stats);

        if input.end_of_stream {
            return Ok(Some(OutputBuffer::end_of_stream()));
        }
        Ok(Some(OutputBuffer {
            data: input.data,
            timestamp_us: input.timestamp_us,
            end_of_stream: false,
            skipped_count: self.skip_per_buffer,
        }))
    }

    fn release_output_buffer(&mut self, buffer: OutputBuffer) {
        let mut stats = self.stats.borrow_mut();
        stats.outstanding_outputs -= 1;
        stats.outputs_released += 1;
        drop(buffer);
    }

    fn flush(&mut self) {
        let mut stats = self.stats.borrow_mut();
        stats.flush_calls += 1;
        // The renderer drops any held buffers as part of its flush; the
        // pool is whole again afterwards.
        stats.outstanding_inputs = 0;
        stats.outstanding_outputs = 0;
        drop(stats);
        self.free_input_slots += self.queued.len();
        self.queued.clear();
    }

    fn output_format(&self, input: &AudioFormat) -> AudioFormat {
        self.output_format_override
            .clone()
            .unwrap_or_else(|| AudioFormat::pcm16(input.channel_count, input.sample_rate))
    }
}

impl Drop for LoopbackDecoder {
    fn drop(&mut self) {
        self.stats.borrow_mut().dropped = true;
    }
}

/// Factory producing instrumented [`LoopbackDecoder`]s
pub struct TestDecoderFactory {
    pub stats: Rc<RefCell<DecoderStats>>,
    pub create_calls: Rc<RefCell<u32>>,
    pub input_slots: usize,
    pub output_delay: u32,
    /// Shared so a test can clear the failure after the renderer owns the
    /// factory
    pub fail_with: Rc<RefCell<Option<String>>>,
    pub fail_dequeue_output: Option<String>,
    pub output_format_override: Option<AudioFormat>,
    pub skip_per_buffer: u64,
}

impl TestDecoderFactory {
    pub fn new() -> Self {
        Self {
            stats: Rc::new(RefCell::new(DecoderStats::default())),
            create_calls: Rc::new(RefCell::new(0)),
            input_slots: 2,
            output_delay: 0,
            fail_with: Rc::new(RefCell::new(None)),
            fail_dequeue_output: None,
            output_format_override: None,
            skip_per_buffer: 0,
        }
    }
}

impl DecoderFactory for TestDecoderFactory {
    fn create(&mut self, _format: &AudioFormat) -> Result<Box<dyn AudioDecoder>> {
        *self.create_calls.borrow_mut() += 1;
        if let Some(message) = self.fail_with.borrow().as_ref() {
            return Err(Error::DecoderInit(message.clone()));
        }
        Ok(Box::new(LoopbackDecoder {
            stats: Rc::clone(&self.stats),
            free_input_slots: self.input_slots,
            queued: VecDeque::new(),
            output_delay: self.output_delay,
            fail_dequeue_output: self.fail_dequeue_output.clone(),
            output_format_override: self.output_format_override.clone(),
            skip_per_buffer: self.skip_per_buffer,
        }))
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Everything the scripted sink saw and will do next
#[derive(Debug, Default)]
pub struct SinkRecord {
    pub configured: Vec<AudioFormat>,
    pub initialized: bool,
    /// Session argument of every `initialize` call, in order
    pub init_calls: Vec<Option<SessionId>>,
    pub next_session_id: SessionId,
    /// Controls `has_pending_data`; tests flip this to stage underruns
    pub pending_data: bool,
    /// If set, a consumed write raises `pending_data`
    pub pending_follows_writes: bool,
    /// Statuses to return from `handle_buffer`, front first; an empty
    /// script means "consumed, no discontinuity"
    pub write_script: VecDeque<SinkWriteStatus>,
    /// (payload length, timestamp) of every `handle_buffer` call
    pub writes: Vec<(usize, i64)>,
    pub end_of_stream: bool,
    /// Position to report, `None` = not yet known
    pub position_us: Option<i64>,
    pub play_calls: u32,
    pub pause_calls: u32,
    pub reset_calls: u32,
    pub release_calls: u32,
    pub volume_calls: Vec<f32>,
    pub fail_configure: Option<String>,
    pub fail_write: Option<String>,
}

/// Shared handle to a [`ScriptedSink`]'s record
pub type SinkHandle = Rc<RefCell<SinkRecord>>;

/// Sink controlled entirely by its shared [`SinkRecord`]
pub struct ScriptedSink {
    record: SinkHandle,
}

impl ScriptedSink {
    pub fn new() -> (Self, SinkHandle) {
        let record = Rc::new(RefCell::new(SinkRecord {
            next_session_id: 100,
            ..SinkRecord::default()
        }));
        (
            Self {
                record: Rc::clone(&record),
            },
            record,
        )
    }
}

impl AudioSink for ScriptedSink {
    fn configure(&mut self, format: &AudioFormat) -> Result<()> {
        let mut record = self.record.borrow_mut();
        if let Some(message) = &record.fail_configure {
            return Err(Error::SinkInit(message.clone()));
        }
        record.configured.push(format.clone());
        Ok(())
    }

    fn initialize(&mut self, session_id: Option<SessionId>) -> Result<SessionId> {
        let mut record = self.record.borrow_mut();
        record.init_calls.push(session_id);
        let id = match session_id {
            Some(id) => id,
            None => {
                let id = record.next_session_id;
                record.next_session_id += 1;
                id
            }
        };
        record.initialized = true;
        Ok(id)
    }

    fn is_initialized(&self) -> bool {
        self.record.borrow().initialized
    }

    fn has_pending_data(&self) -> bool {
        self.record.borrow().pending_data
    }

    fn handle_buffer(&mut self, data: &[u8], timestamp_us: i64) -> Result<SinkWriteStatus> {
        let mut record = self.record.borrow_mut();
        if let Some(message) = &record.fail_write {
            return Err(Error::SinkWrite(message.clone()));
        }
        record.writes.push((data.len(), timestamp_us));
        let status = record.write_script.pop_front().unwrap_or(SinkWriteStatus {
            consumed: true,
            position_discontinuity: false,
        });
        if status.consumed && record.pending_follows_writes {
            record.pending_data = true;
        }
        Ok(status)
    }

    fn handle_end_of_stream(&mut self) {
        self.record.borrow_mut().end_of_stream = true;
    }

    fn position_us(&self, _ended: bool) -> Option<i64> {
        self.record.borrow().position_us
    }

    fn buffer_size_bytes(&self) -> usize {
        4_096
    }

    fn buffer_size_us(&self) -> Option<i64> {
        Some(23_219)
    }

    fn play(&mut self) {
        self.record.borrow_mut().play_calls += 1;
    }

    fn pause(&mut self) {
        self.record.borrow_mut().pause_calls += 1;
    }

    fn reset(&mut self) {
        let mut record = self.record.borrow_mut();
        record.reset_calls += 1;
        record.initialized = false;
        record.pending_data = false;
    }

    fn release(&mut self) {
        let mut record = self.record.borrow_mut();
        record.release_calls += 1;
        record.initialized = false;
        record.pending_data = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.record.borrow_mut().volume_calls.push(volume);
    }
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Tick interval used by the drivers (microseconds)
pub const TICK_US: i64 = 10_000;

/// Drive render ticks until `is_ended`, panicking if it never happens
///
/// Returns the elapsed-realtime value after the final tick.
pub fn run_until_ended(renderer: &mut AudioRenderer, max_ticks: u32) -> i64 {
    let mut elapsed_us = 0;
    for _ in 0..max_ticks {
        if renderer.is_ended() {
            return elapsed_us;
        }
        renderer.render(0, elapsed_us).expect("render tick failed");
        elapsed_us += TICK_US;
    }
    panic!("renderer not ended after {} ticks", max_ticks);
}

/// Drive exactly `ticks` render ticks starting at `start_elapsed_us`
pub fn run_ticks(renderer: &mut AudioRenderer, ticks: u32, start_elapsed_us: i64) -> i64 {
    let mut elapsed_us = start_elapsed_us;
    for _ in 0..ticks {
        renderer.render(0, elapsed_us).expect("render tick failed");
        elapsed_us += TICK_US;
    }
    elapsed_us
}
