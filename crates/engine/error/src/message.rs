use std::{borrow::Cow, collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{MessageCode, Severity, SourceOrigin};

/// An error captured while resolving a field, kept around so a redaction
/// policy can decide later whether to expose it.
pub type Exception = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A single diagnostic produced anywhere in the pipeline.
///
/// The timestamp, origin and severity are fixed at creation. Code, text,
/// exception and metadata can be adjusted by later stages.
#[derive(Clone)]
pub struct Message {
    timestamp: DateTime<Utc>,
    origin: SourceOrigin,
    severity: Severity,
    pub code: MessageCode,
    pub text: Cow<'static, str>,
    pub exception: Option<Exception>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Message {
    pub fn new(severity: Severity, code: MessageCode, text: impl Into<Cow<'static, str>>) -> Self {
        Message {
            timestamp: Utc::now(),
            origin: SourceOrigin::none(),
            severity,
            code,
            text: text.into(),
            exception: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn critical(code: MessageCode, text: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Severity::Critical, code, text)
    }

    pub fn warning(code: MessageCode, text: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Severity::Warning, code, text)
    }

    pub fn info(code: MessageCode, text: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Severity::Info, code, text)
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<SourceOrigin>) -> Self {
        self.origin = origin.into();
        self
    }

    #[must_use]
    pub fn with_exception(mut self, exception: Exception) -> Self {
        self.exception = Some(exception);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_critical(&self) -> bool {
        self.severity.is_critical()
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("severity", &self.severity)
            .field("code", &self.code)
            .field("text", &self.text)
            .field("origin", &self.origin)
            .field("exception", &self.exception.as_ref().map(|err| err.to_string()))
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.text)
    }
}
