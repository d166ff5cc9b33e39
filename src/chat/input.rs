//! Input capture for the chat widget.
//!
//! Three modalities feed one pending outbound message: the text field,
//! single-utterance voice recognition that fills the text field, and one
//! selected image that is decoded in the background.

use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::observability::VOICE_ERRORS;
use crate::types::ImageDataUri;

/// Locale every recognition session runs in.
pub const RECOGNITION_LOCALE: &str = "en-US";

/// A platform speech recognizer.
///
/// Recognition is single-utterance: no continuous mode and no interim
/// results.  Outcomes come back to the widget as [`VoiceEvent`]s.
pub trait SpeechRecognizer: Send {
    /// Begin listening for one utterance in `locale`.
    fn start(&mut self, locale: &str) -> Result<()>;

    /// Stop listening.
    fn stop(&mut self);
}

/// Whether a recognition session is active.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum VoiceState {
    /// No session.
    #[default]
    Idle,

    /// A session is listening.
    Recording,
}

/// Outcome reported by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    /// An utterance was recognized.
    Transcript(String),

    /// Recognition failed (no speech, denied microphone, ...).
    Error(String),
}

/// Toggle-driven voice capture.
pub struct VoiceCapture {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    state: VoiceState,
}

impl VoiceCapture {
    /// Voice capture backed by `recognizer`.
    pub fn new(recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer: Some(recognizer),
            state: VoiceState::Idle,
        }
    }

    /// Voice capture on a platform without a recognizer; toggling does nothing.
    pub fn unavailable() -> Self {
        Self {
            recognizer: None,
            state: VoiceState::Idle,
        }
    }

    /// Returns true if a recognizer is present.
    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    /// The current state.
    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Start a session when idle, stop the running one when recording.
    pub fn toggle(&mut self) -> VoiceState {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return self.state;
        };
        self.state = match self.state {
            VoiceState::Recording => {
                recognizer.stop();
                VoiceState::Idle
            }
            VoiceState::Idle => match recognizer.start(RECOGNITION_LOCALE) {
                Ok(()) => VoiceState::Recording,
                Err(err) => {
                    VOICE_ERRORS.click();
                    tracing::warn!(error = %err, "speech recognition could not start");
                    VoiceState::Idle
                }
            },
        };
        self.state
    }

    /// Consume a recognizer event; returns the transcript to apply, if any.
    pub fn handle(&mut self, event: VoiceEvent) -> Option<String> {
        self.state = VoiceState::Idle;
        match event {
            VoiceEvent::Transcript(transcript) => Some(transcript),
            VoiceEvent::Error(reason) => {
                VOICE_ERRORS.click();
                tracing::warn!(%reason, "speech recognition failed");
                None
            }
        }
    }
}

impl Default for VoiceCapture {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// An image file being read and encoded in the background.
#[derive(Debug)]
pub struct PendingImage {
    path: PathBuf,
    task: JoinHandle<Result<ImageDataUri>>,
}

impl PendingImage {
    /// Start decoding `path`.  Must be called from within a tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let task_path = path.clone();
        let task = tokio::spawn(async move { ImageDataUri::from_path(&task_path).await });
        Self { path, task }
    }

    /// The file being decoded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once decoding has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Suspend until the decode completes.
    pub async fn wait(self) -> Result<ImageDataUri> {
        self.task
            .await
            .map_err(|err| Error::unknown(format!("image decode task failed: {err}")))?
    }

    fn abort(self) {
        self.task.abort();
    }
}

/// The image slot of the input area.
#[derive(Debug)]
pub enum ImageSelection {
    /// A file is still being decoded.
    Pending(PendingImage),

    /// An already-encoded image.
    Ready(ImageDataUri),
}

impl ImageSelection {
    async fn resolve(self) -> Result<ImageDataUri> {
        match self {
            ImageSelection::Pending(pending) => pending.wait().await,
            ImageSelection::Ready(image) => Ok(image),
        }
    }
}

/// A submission ready to be appended and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// The text as typed.
    pub text: String,

    /// The decoded image, if one was selected.
    pub image: Option<ImageDataUri>,
}

/// Pending input of the widget.
#[derive(Default)]
pub struct InputCapture {
    text: String,
    voice: VoiceCapture,
    image: Option<ImageSelection>,
}

impl InputCapture {
    /// Input capture without voice support.
    pub fn new() -> Self {
        Self::default()
    }

    /// Input capture with the given voice recognizer.
    pub fn with_recognizer(recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self {
            voice: VoiceCapture::new(recognizer),
            ..Self::default()
        }
    }

    /// Current text-field contents.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text-field contents.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Empty the text field, returning what it held.
    pub fn take_text(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Voice capture state.
    pub fn voice(&self) -> &VoiceCapture {
        &self.voice
    }

    /// Toggle voice capture.
    pub fn toggle_voice(&mut self) -> VoiceState {
        self.voice.toggle()
    }

    /// Apply a recognizer event; a transcript replaces the text field.
    pub fn handle_voice_event(&mut self, event: VoiceEvent) {
        if let Some(transcript) = self.voice.handle(event) {
            self.text = transcript;
        }
    }

    /// Select an image file; decoding starts immediately in the background.
    pub fn select_image(&mut self, path: impl Into<PathBuf>) {
        self.clear_image();
        self.image = Some(ImageSelection::Pending(PendingImage::spawn(path)));
    }

    /// Attach an image that is already encoded.
    pub fn attach_image(&mut self, image: ImageDataUri) {
        self.clear_image();
        self.image = Some(ImageSelection::Ready(image));
    }

    /// Drop the current image selection, cancelling any decode.
    pub fn clear_image(&mut self) {
        if let Some(ImageSelection::Pending(pending)) = self.image.take() {
            pending.abort();
        }
    }

    /// Returns true if an image is selected, decoded or not.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// True when the send action should be enabled: non-blank text or an
    /// image.
    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty() || self.has_image()
    }

    /// Take the pending input as one outbound message.
    ///
    /// Returns `Ok(None)` without touching anything when there is nothing to
    /// send.  An image still being decoded is awaited first; if decoding
    /// fails the text is left in place, the image selection is dropped and
    /// the error is returned.
    pub async fn take_outbound(&mut self) -> Result<Option<OutboundMessage>> {
        if !self.can_submit() {
            return Ok(None);
        }
        let image = match self.image.take() {
            Some(selection) => Some(selection.resolve().await.inspect_err(|err| {
                tracing::warn!(error = %err, "image attachment could not be decoded");
            })?),
            None => None,
        };
        let text = self.take_text();
        Ok(Some(OutboundMessage { text, image }))
    }
}
