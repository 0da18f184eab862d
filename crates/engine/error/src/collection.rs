use std::sync::{
    atomic::{AtomicU8, Ordering},
    Mutex, PoisonError,
};

use crate::{Message, Severity};

/// Append-only sink of messages shared by every context of a request.
///
/// Appends are safe from concurrently resolving fields. The aggregate
/// severity is tracked alongside so validity checks never lock.
#[derive(Default)]
pub struct MessageCollection {
    messages: Mutex<Vec<Message>>,
    // 0 while empty, otherwise the `Severity` discriminant.
    max_severity: AtomicU8,
}

impl MessageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, message: Message) {
        self.max_severity.fetch_max(message.severity() as u8, Ordering::AcqRel);
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    pub fn extend(&self, messages: impl IntoIterator<Item = Message>) {
        let mut guard = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        for message in messages {
            self.max_severity.fetch_max(message.severity() as u8, Ordering::AcqRel);
            guard.push(message);
        }
    }

    /// Copies every message of `other` into this collection.
    pub fn add_range(&self, other: &MessageCollection) {
        self.extend(other.to_vec());
    }

    /// Maximum severity of all members, `None` for an empty collection.
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_repr(self.max_severity.load(Ordering::Acquire))
    }

    pub fn is_valid(&self) -> bool {
        match self.severity() {
            Some(severity) => severity < Severity::Critical,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|message| message.severity() >= severity)
            .count()
    }

    /// Snapshot of the messages, in the order they were appended.
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn into_vec(self) -> Vec<Message> {
        self.messages.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MessageCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

impl FromIterator<Message> for MessageCollection {
    fn from_iter<T: IntoIterator<Item = Message>>(iter: T) -> Self {
        let collection = MessageCollection::new();
        collection.extend(iter);
        collection
    }
}
