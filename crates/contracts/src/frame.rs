//! FrameEvent / FrameSource - capture pipeline collaborator contract
//!
//! The capture pipeline delivers one `FrameEvent` per captured frame, in frame
//! order. Drops are tolerated; reordering is not.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Per-frame timestamp pair delivered by the capture pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEvent {
    /// Capture timestamp in the device clock domain (microseconds)
    pub device_timestamp_us: i64,

    /// Host time at which the callback observed the frame (microseconds)
    pub host_timestamp_us: i64,

    /// Optional frame sequence number (for ordering diagnostics)
    pub frame_id: Option<u64>,
}

/// Frame event callback type
///
/// Invoked by the capture pipeline on its own thread for every captured frame.
/// Uses `Arc` to allow callback sharing across contexts. The callback must not
/// block on I/O; the controller behind it only does arithmetic.
pub type FrameEventCallback = Arc<dyn Fn(FrameEvent) + Send + Sync>;

/// Frame event source trait
///
/// Abstracts the capture pipeline's subscription mechanism so the loop can be
/// driven by real hardware callbacks or by a mock camera.
///
/// # Ordering
///
/// Implementations must deliver events in frame order. Dropped frames are
/// normal operating noise and handled by the Lock Controller.
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn FrameSource> = make_source();
/// source.listen(Arc::new(|event| {
///     println!("frame at {}us", event.host_timestamp_us);
/// }));
/// // ... run ...
/// source.stop();
/// ```
pub trait FrameSource: Send + Sync {
    /// Stable identifier of this source
    fn source_id(&self) -> &str;

    /// Register the frame callback
    ///
    /// Idempotent: if already listening, repeated calls do not register a
    /// second callback.
    fn listen(&self, callback: FrameEventCallback);

    /// Stop delivering events
    fn stop(&self);

    /// Check whether events are currently being delivered
    fn is_listening(&self) -> bool;
}
