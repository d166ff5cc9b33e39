use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("sarthi.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("sarthi.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("sarthi.client.request_duration_seconds");

pub(crate) static CHAT_SUBMISSIONS: Counter = Counter::new("sarthi.chat.submissions");
pub(crate) static CHAT_FALLBACKS: Counter = Counter::new("sarthi.chat.fallbacks");
pub(crate) static CHAT_CANCELLATIONS: Counter = Counter::new("sarthi.chat.cancellations");
pub(crate) static CHAT_DISCARDED_REPLIES: Counter = Counter::new("sarthi.chat.discarded_replies");

pub(crate) static VOICE_ERRORS: Counter = Counter::new("sarthi.voice.errors");
pub(crate) static MEDIA_ACQUIRE_ERRORS: Counter = Counter::new("sarthi.media.acquire_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_SUBMISSIONS);
    collector.register_counter(&CHAT_FALLBACKS);
    collector.register_counter(&CHAT_CANCELLATIONS);
    collector.register_counter(&CHAT_DISCARDED_REPLIES);

    collector.register_counter(&VOICE_ERRORS);
    collector.register_counter(&MEDIA_ACQUIRE_ERRORS);
}
