#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum MessageCode {
    // Operation preparation phases
    SyntaxError,
    DocumentConstructionError,
    OperationValidationError,
    OperationPlanningError,
    VariableError,
    // Auth
    Unauthenticated,
    Unauthorized,
    // Runtime
    ResolverError,
    UnhandledException,
    InvalidSource,
    InvalidResult,
    DirectiveError,
    InternalServerError,
}

impl MessageCode {
    /// Codes emitted before any resolver ran.
    pub fn is_request_error(self) -> bool {
        matches!(
            self,
            MessageCode::SyntaxError
                | MessageCode::DocumentConstructionError
                | MessageCode::OperationValidationError
                | MessageCode::OperationPlanningError
                | MessageCode::VariableError
        )
    }
}
