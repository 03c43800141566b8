use biometrics::{Collector, Counter};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatline.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("chatline.client.request_errors");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("chatline.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("chatline.stream.errors");

pub(crate) static SESSION_SUBMITS: Counter = Counter::new("chatline.session.submits");
pub(crate) static SESSION_REPLIES: Counter = Counter::new("chatline.session.replies");
pub(crate) static SESSION_ROLLBACKS: Counter = Counter::new("chatline.session.rollbacks");
pub(crate) static SESSION_INTERRUPTS: Counter = Counter::new("chatline.session.interrupts");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);

    collector.register_counter(&SESSION_SUBMITS);
    collector.register_counter(&SESSION_REPLIES);
    collector.register_counter(&SESSION_ROLLBACKS);
    collector.register_counter(&SESSION_INTERRUPTS);
}
