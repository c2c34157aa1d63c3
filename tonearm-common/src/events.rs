//! Event types for the tonearm render pipeline
//!
//! Provides the shared `RenderEvent` definitions and the `EventBus` used to
//! deliver them. Event delivery is fire-and-forget: the pipeline emits and
//! moves on, and a missing or slow subscriber never affects playback.

use crate::counters::DecoderCounters;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Render pipeline event types
///
/// Events are broadcast via `EventBus` and can be serialized for external
/// reporting. They are purely diagnostic; nothing in the pipeline waits on
/// them or reacts to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RenderEvent {
    /// A decoder instance was constructed
    ///
    /// Emitted once per decoder construction, immediately after the factory
    /// returns.
    DecoderInitialized {
        /// Decoder name as reported by the implementation
        name: String,
        /// Wall time spent inside the factory (milliseconds)
        init_duration_ms: u64,
        /// When the decoder became ready
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The output sink ran out of buffered audio while playing
    ///
    /// Diagnostic only; playback control flow is unchanged. Reported when
    /// the sink transitions from having pending data to having none while
    /// the renderer is started.
    SinkUnderrun {
        /// Sink buffer capacity in bytes
        buffer_size_bytes: usize,
        /// Sink buffer capacity as estimated duration (milliseconds),
        /// if the sink can report one
        buffer_size_ms: Option<i64>,
        /// Time since the renderer last fed the sink (milliseconds)
        elapsed_since_feed_ms: i64,
        /// When the underrun was detected
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Snapshot of the decoder counters
    ///
    /// Emitted when the renderer is enabled so that external reporting has a
    /// baseline to diff later reads against.
    CountersSnapshot {
        /// Current counter values
        counters: DecoderCounters,
        /// When the snapshot was taken
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Central event distribution bus for pipeline events
///
/// Built on `tokio::sync::broadcast`:
/// - Non-blocking publish (slow subscribers never block the render tick)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
///
/// # Examples
///
/// ```
/// use tonearm_common::events::{EventBus, RenderEvent};
/// use tonearm_common::DecoderCounters;
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit(RenderEvent::CountersSnapshot {
///     counters: DecoderCounters::default(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(
///     rx.try_recv(),
///     Ok(RenderEvent::CountersSnapshot { .. })
/// ));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RenderEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// Older events are dropped for subscribers that lag beyond `capacity`.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RenderEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// A send failure only means nobody is listening; the pipeline treats
    /// that as normal and the failure is logged at trace level.
    pub fn emit(&self, event: RenderEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("render event emitted with no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_harmless() {
        let bus = EventBus::new(8);
        bus.emit(RenderEvent::CountersSnapshot {
            counters: DecoderCounters::default(),
            timestamp: chrono::Utc::now(),
        });
    }

    #[test]
    fn test_subscriber_receives_emitted_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit(RenderEvent::DecoderInitialized {
            name: "test-decoder".to_string(),
            init_duration_ms: 3,
            timestamp: chrono::Utc::now(),
        });

        match rx.try_recv() {
            Ok(RenderEvent::DecoderInitialized { name, .. }) => {
                assert_eq!(name, "test-decoder");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = RenderEvent::SinkUnderrun {
            buffer_size_bytes: 8192,
            buffer_size_ms: Some(46),
            elapsed_since_feed_ms: 120,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"SinkUnderrun\""));
    }
}
