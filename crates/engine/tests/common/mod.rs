#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex, Once},
    time::Duration,
};

use engine::{ExecutionListener, FieldStatus, Phase, Response};
use engine_error::{MessageCollection, ResponsePath};
use engine_operation::PlanCacheKey;

/// Installs a `fmt` subscriber once per test binary, filtered by `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Response errors as `(code, message)` pairs, in order.
pub fn errors(response: &Response) -> Vec<(String, String)> {
    response
        .errors()
        .into_iter()
        .map(|error| {
            let code = error
                .extensions
                .get("code")
                .and_then(|code| code.as_str())
                .unwrap_or_default()
                .to_string();
            (code, error.message)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started(Option<String>),
    PlanCacheLookup { hit: bool },
    Phase(Phase),
    Field(String, FieldStatus),
    Completed { errors: usize },
}

/// Keeps every notification it gets, timings left out.
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ExecutionListener for RecordingListener {
    fn request_started(&self, operation_name: Option<&str>) {
        self.push(Event::Started(operation_name.map(str::to_string)));
    }

    fn plan_cache_lookup(&self, _key: &PlanCacheKey, hit: bool) {
        self.push(Event::PlanCacheLookup { hit });
    }

    fn phase_completed(&self, phase: Phase, _duration: Duration) {
        self.push(Event::Phase(phase));
    }

    fn field_resolved(&self, path: &ResponsePath, status: FieldStatus, _duration: Duration) {
        self.push(Event::Field(path.to_string(), status));
    }

    fn request_completed(&self, messages: &MessageCollection, _duration: Duration) {
        let errors = messages.to_vec().iter().filter(|message| message.is_critical()).count();
        self.push(Event::Completed { errors });
    }
}
