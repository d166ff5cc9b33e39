//! Mocked video consultation.
//!
//! There is no call transport.  The consultation owns the local camera
//! preview and a fake "connecting" phase that turns into an in-call state
//! after [`CONNECT_DELAY`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;
use crate::observability::MEDIA_ACQUIRE_ERRORS;

/// How long the connecting phase lasts.
pub const CONNECT_DELAY: Duration = Duration::from_secs(2);

/// A camera and microphone.
pub trait MediaDevice: Send + Sync {
    /// Start capturing.  Returns an identifier for the stream.
    fn acquire(&self) -> Result<u64>;

    /// Stop capturing the given stream.
    fn release(&self, stream: u64);
}

/// A live capture stream, released when dropped.
pub struct MediaStream {
    device: Arc<dyn MediaDevice>,
    id: u64,
}

impl MediaStream {
    /// Acquire a stream from `device`.
    pub fn acquire(device: Arc<dyn MediaDevice>) -> Result<Self> {
        let id = device.acquire()?;
        Ok(Self { device, id })
    }

    /// The device's identifier for this stream.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream").field("id", &self.id).finish()
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.device.release(self.id);
    }
}

/// Where the call is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Connecting { until: Instant },
    InCall,
}

/// One consultation screen.
pub struct VideoConsultation {
    device: Arc<dyn MediaDevice>,
    preview: Option<MediaStream>,
    audio_on: bool,
    call: CallState,
}

impl VideoConsultation {
    /// Opens the consultation with the camera requested.
    ///
    /// If the camera cannot be acquired the consultation starts with video
    /// off.
    pub fn new(device: Arc<dyn MediaDevice>) -> Self {
        let mut consultation = Self {
            device,
            preview: None,
            audio_on: true,
            call: CallState::Idle,
        };
        consultation.set_video(true);
        consultation
    }

    /// True while the camera preview is live.
    pub fn is_video_on(&self) -> bool {
        self.preview.is_some()
    }

    /// True unless the microphone is muted.
    pub fn is_audio_on(&self) -> bool {
        self.audio_on
    }

    /// The live preview, if any.
    pub fn preview(&self) -> Option<&MediaStream> {
        self.preview.as_ref()
    }

    /// Turn the camera on or off; returns whether it is on afterwards.
    pub fn set_video(&mut self, on: bool) -> bool {
        if !on {
            self.preview = None;
            return false;
        }
        if self.preview.is_none() {
            match MediaStream::acquire(Arc::clone(&self.device)) {
                Ok(stream) => self.preview = Some(stream),
                Err(err) => {
                    MEDIA_ACQUIRE_ERRORS.click();
                    tracing::warn!(error = %err, "camera unavailable; continuing with video off");
                }
            }
        }
        self.is_video_on()
    }

    /// Flip the camera.
    pub fn toggle_video(&mut self) -> bool {
        let on = !self.is_video_on();
        self.set_video(on)
    }

    /// Mute or unmute.
    pub fn toggle_audio(&mut self) -> bool {
        self.audio_on = !self.audio_on;
        self.audio_on
    }

    /// Current call state, promoting a finished connecting phase.
    pub fn call_state(&mut self) -> CallState {
        if let CallState::Connecting { until } = self.call
            && Instant::now() >= until
        {
            self.call = CallState::InCall;
        }
        self.call
    }

    /// Begin connecting.  Ignored unless idle.
    pub fn start_call(&mut self) -> CallState {
        if self.call_state() == CallState::Idle {
            self.call = CallState::Connecting {
                until: Instant::now() + CONNECT_DELAY,
            };
        }
        self.call
    }

    /// Wait out the connecting phase.
    pub async fn wait_connected(&mut self) -> CallState {
        if let CallState::Connecting { until } = self.call {
            tokio::time::sleep_until(until).await;
        }
        self.call_state()
    }

    /// Hang up, or abandon connecting.
    pub fn end_call(&mut self) {
        self.call = CallState::Idle;
    }
}
