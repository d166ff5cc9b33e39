//! Core chat session management.
//!
//! [`SessionStore`] is the append-only transcript.  [`ChatWidget`] wraps it
//! with the widget's two state machines (closed/open and idle/awaiting a
//! reply) and drives one request per submission through a
//! [`CompletionClient`].

use tokio_util::sync::CancellationToken;

use crate::chat::completion::CompletionClient;
use crate::chat::input::{InputCapture, OutboundMessage, VoiceEvent, VoiceState};
use crate::chat::render::Renderer;
use crate::error::Result;
use crate::observability::{CHAT_CANCELLATIONS, CHAT_DISCARDED_REPLIES, CHAT_SUBMISSIONS};
use crate::types::{ImageDataUri, Message, MessageId, Sender};
use crate::utils::time::now;

/// The assistant's opening line, synthesized locally.
pub const WELCOME_MESSAGE: &str =
    "Hello! I'm Sarthi, your AI health assistant. How can I help you today?";

/// Ordered, append-only list of messages for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    messages: Vec<Message>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message from the user.
    pub fn append_user_message(
        &mut self,
        text: impl Into<String>,
        image: Option<ImageDataUri>,
    ) -> &Message {
        self.append(Sender::User, text.into(), image)
    }

    /// Append a message from the assistant.
    pub fn append_assistant_message(&mut self, text: impl Into<String>) -> &Message {
        self.append(Sender::Assistant, text.into(), None)
    }

    fn append(&mut self, sender: Sender, text: String, image: Option<ImageDataUri>) -> &Message {
        let timestamp = now();
        let id = MessageId::next_after(self.last().map(|m| m.id), timestamp);
        self.messages
            .push(Message::new(id, text, sender, timestamp, image));
        &self.messages[self.messages.len() - 1]
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The newest message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}

/// Whether the widget window is showing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Only the launcher button is visible.
    #[default]
    Closed,

    /// The transcript and input area are visible.
    Open,
}

/// Identifies one outstanding request.
///
/// A reply is only accepted with the ticket of the request currently
/// awaited; cancelling invalidates the ticket.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Whether a request is outstanding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Activity {
    /// Ready for a submission.
    #[default]
    Idle,

    /// Waiting on the reply for this ticket.
    AwaitingResponse(RequestTicket),
}

/// Why a submission did not go out.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The widget is closed.
    Closed,

    /// A request is already outstanding.
    Busy,

    /// No text and no image.
    Empty,

    /// Cancelled while the input was still being prepared; the input is
    /// left in place.
    Cancelled,
}

/// A submission that has been appended and still needs its reply.
#[derive(Debug, Clone)]
pub struct PendingReply {
    /// Ticket to hand back to [`ChatWidget::deliver`].
    pub ticket: RequestTicket,

    /// The user message this reply answers.
    pub user_message: MessageId,

    /// Text to send.
    pub text: String,

    /// Image to send.
    pub image: Option<ImageDataUri>,
}

/// First half of a submission.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Nothing was appended.
    Rejected(Rejection),

    /// The user message was appended; a reply is awaited.
    Dispatched(PendingReply),
}

/// Result of a full submission round-trip.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The user message and its reply were both appended.
    Replied {
        /// The user's message.
        user: MessageId,
        /// The assistant's reply.
        assistant: MessageId,
    },

    /// The user message was appended but the request was cancelled.
    Cancelled {
        /// The user's message.
        user: MessageId,
    },

    /// Nothing happened.
    Rejected(Rejection),
}

/// Aggregated stats for a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of messages in the transcript.
    pub message_count: usize,
    /// Messages written by the user.
    pub user_messages: usize,
    /// Messages written by the assistant, welcome included.
    pub assistant_messages: usize,
    /// Window state.
    pub visibility: Visibility,
    /// Whether a reply is outstanding.
    pub awaiting_response: bool,
    /// Voice capture state.
    pub voice: VoiceState,
    /// Whether an image is selected.
    pub image_selected: bool,
}

/// The floating chat widget.
///
/// Holds the session for as long as the value lives; closing and reopening
/// keeps the transcript, dropping the widget discards it.
pub struct ChatWidget<C: CompletionClient> {
    client: C,
    store: SessionStore,
    input: InputCapture,
    visibility: Visibility,
    activity: Activity,
    next_ticket: u64,
}

impl<C: CompletionClient> ChatWidget<C> {
    /// Creates a closed widget whose transcript holds only the welcome.
    pub fn new(client: C) -> Self {
        Self::with_input(client, InputCapture::new())
    }

    /// Creates a widget with custom input capture (e.g. with voice).
    pub fn with_input(client: C, input: InputCapture) -> Self {
        let mut store = SessionStore::new();
        store.append_assistant_message(WELCOME_MESSAGE);
        Self {
            client,
            store,
            input,
            visibility: Visibility::Closed,
            activity: Activity::Idle,
            next_ticket: 0,
        }
    }

    /// The completion client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The transcript.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Pending input.
    pub fn input(&self) -> &InputCapture {
        &self.input
    }

    /// Pending input, for editing.
    pub fn input_mut(&mut self) -> &mut InputCapture {
        &mut self.input
    }

    /// Window state.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns true if the window is open.
    pub fn is_open(&self) -> bool {
        self.visibility == Visibility::Open
    }

    /// Request state.
    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Returns true while a reply is outstanding.
    pub fn is_awaiting_response(&self) -> bool {
        matches!(self.activity, Activity::AwaitingResponse(_))
    }

    /// Whether the send action is enabled.
    pub fn can_submit(&self) -> bool {
        self.check_submittable().is_none()
    }

    fn check_submittable(&self) -> Option<Rejection> {
        if !self.is_open() {
            Some(Rejection::Closed)
        } else if self.is_awaiting_response() {
            Some(Rejection::Busy)
        } else if !self.input.can_submit() {
            Some(Rejection::Empty)
        } else {
            None
        }
    }

    /// Open the window and draw the whole transcript.
    pub fn open(&mut self, renderer: &mut dyn Renderer) {
        if self.is_open() {
            return;
        }
        self.visibility = Visibility::Open;
        for message in self.store.iter() {
            renderer.print_message(message);
        }
        if let Some(last) = self.store.last() {
            renderer.scroll_to(last.id);
        }
        if self.is_awaiting_response() {
            renderer.start_typing();
        }
    }

    /// Hide the window; the transcript is kept.
    pub fn close(&mut self) {
        self.visibility = Visibility::Closed;
    }

    /// Flip between open and closed.
    pub fn toggle(&mut self, renderer: &mut dyn Renderer) -> Visibility {
        match self.visibility {
            Visibility::Open => self.close(),
            Visibility::Closed => self.open(renderer),
        }
        self.visibility
    }

    /// Toggle voice capture; ignored while a reply is outstanding.
    pub fn toggle_voice(&mut self) -> VoiceState {
        if self.is_awaiting_response() {
            return self.input.voice().state();
        }
        self.input.toggle_voice()
    }

    /// Apply a recognizer event to the text field.
    pub fn handle_voice_event(&mut self, event: VoiceEvent) {
        self.input.handle_voice_event(event);
    }

    /// Append the pending input as a user message and enter
    /// awaiting-response.
    ///
    /// A selected image is decoded before anything is appended.  Nothing is
    /// appended when the widget is closed, busy, or the input is empty.
    pub async fn begin_submission(&mut self, renderer: &mut dyn Renderer) -> Result<Submission> {
        if let Some(rejection) = self.check_submittable() {
            return Ok(Submission::Rejected(rejection));
        }
        let Some(outbound) = self.input.take_outbound().await? else {
            return Ok(Submission::Rejected(Rejection::Empty));
        };
        Ok(Submission::Dispatched(self.dispatch(outbound, renderer)))
    }

    fn dispatch(&mut self, outbound: OutboundMessage, renderer: &mut dyn Renderer) -> PendingReply {
        CHAT_SUBMISSIONS.click();
        let message = self
            .store
            .append_user_message(outbound.text.clone(), outbound.image.clone());
        let user_message = message.id;
        renderer.print_message(message);
        renderer.scroll_to(user_message);

        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        self.activity = Activity::AwaitingResponse(ticket);
        renderer.start_typing();
        tracing::debug!(
            message = %user_message,
            has_image = outbound.image.is_some(),
            "submission dispatched"
        );

        PendingReply {
            ticket,
            user_message,
            text: outbound.text,
            image: outbound.image,
        }
    }

    /// Append the reply for `ticket` and return to idle.
    ///
    /// Replies for a ticket that is no longer awaited (cancelled, or
    /// already answered) are discarded and `None` is returned.  While the
    /// widget is closed the reply is only stored; [`open`](Self::open)
    /// draws it.
    pub fn deliver(
        &mut self,
        ticket: RequestTicket,
        reply: impl Into<String>,
        renderer: &mut dyn Renderer,
    ) -> Option<MessageId> {
        if self.activity != Activity::AwaitingResponse(ticket) {
            CHAT_DISCARDED_REPLIES.click();
            tracing::debug!(?ticket, "discarding reply for a request no longer awaited");
            return None;
        }
        self.activity = Activity::Idle;
        let visible = self.is_open();
        let message = self.store.append_assistant_message(reply);
        let id = message.id;
        if visible {
            renderer.finish_typing();
            renderer.print_message(message);
            renderer.scroll_to(id);
        }
        Some(id)
    }

    /// Abandon the outstanding request, if any.
    ///
    /// Returns true if a request was outstanding.  Its reply, should it
    /// still arrive, will be discarded by [`deliver`](Self::deliver).
    pub fn cancel(&mut self, renderer: &mut dyn Renderer) -> bool {
        if !self.is_awaiting_response() {
            return false;
        }
        self.activity = Activity::Idle;
        CHAT_CANCELLATIONS.click();
        tracing::info!("outstanding request cancelled");
        if self.is_open() {
            renderer.finish_typing();
            renderer.print_interrupted();
        }
        true
    }

    /// Submit the pending input and wait for its reply.
    ///
    /// Exactly one assistant message follows the user message unless
    /// `cancel` fires first, in which case no reply is appended.  If
    /// `cancel` fires before the input is ready (e.g. while an image is
    /// decoding) nothing is appended and the input is restored.
    pub async fn submit(
        &mut self,
        renderer: &mut dyn Renderer,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome> {
        if let Some(rejection) = self.check_submittable() {
            return Ok(SubmitOutcome::Rejected(rejection));
        }
        let Some(outbound) = self.input.take_outbound().await? else {
            return Ok(SubmitOutcome::Rejected(Rejection::Empty));
        };
        if cancel.is_cancelled() {
            self.input.set_text(outbound.text);
            if let Some(image) = outbound.image {
                self.input.attach_image(image);
            }
            tracing::info!("submission cancelled before dispatch");
            return Ok(SubmitOutcome::Rejected(Rejection::Cancelled));
        }
        let pending = self.dispatch(outbound, renderer);
        let user = pending.user_message;

        let reply = tokio::select! {
            reply = self.client.complete(&pending.text, pending.image.as_ref()) => Some(reply),
            _ = cancel.cancelled() => None,
        };

        match reply {
            Some(reply) => match self.deliver(pending.ticket, reply, renderer) {
                Some(assistant) => Ok(SubmitOutcome::Replied { user, assistant }),
                None => Ok(SubmitOutcome::Cancelled { user }),
            },
            None => {
                self.cancel(renderer);
                Ok(SubmitOutcome::Cancelled { user })
            }
        }
    }

    /// Current stats snapshot.
    pub fn stats(&self) -> SessionStats {
        let user_messages = self.store.iter().filter(|m| m.is_user()).count();
        SessionStats {
            message_count: self.store.len(),
            user_messages,
            assistant_messages: self.store.len() - user_messages,
            visibility: self.visibility,
            awaiting_response: self.is_awaiting_response(),
            voice: self.input.voice().state(),
            image_selected: self.input.has_image(),
        }
    }
}
