/// How serious a [`Message`](crate::Message) is.
///
/// Ordering is significant: `Trace < Debug < Info < Warning < Critical`. A
/// request is valid as long as no message reaches [`Severity::Critical`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::FromRepr,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Severity {
    Trace = 1,
    Debug = 2,
    Info = 3,
    Warning = 4,
    Critical = 5,
}

impl Severity {
    pub fn is_critical(self) -> bool {
        self == Severity::Critical
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::Severity;

    #[test]
    fn ordering_is_trace_debug_info_warning_critical() {
        let ordered: Vec<Severity> = Severity::iter().collect();
        let mut sorted = ordered.clone();
        sorted.sort();

        assert_eq!(ordered, sorted);
        assert!(Severity::Trace < Severity::Debug);
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn repr_round_trips() {
        for severity in Severity::iter() {
            assert_eq!(Severity::from_repr(severity as u8), Some(severity));
        }
        assert_eq!(Severity::from_repr(0), None);
    }
}
