use thiserror::Error;

/// A route pattern that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Unclosed argument segment '{segment}'")]
    UnclosedSegment { segment: String },
    #[error("Argument segment '{segment}' has no name")]
    EmptyArgumentName { segment: String },
    #[error("Argument '{name}' appears more than once")]
    DuplicateArgument { name: String },
    #[error("Required argument '{name}' follows an optional argument")]
    RequiredAfterOptional { name: String },
    #[error("Literal '{literal}' follows an optional argument")]
    LiteralAfterOptional { literal: String },
}

/// Tokens that do not fit a command's route or argument types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("Missing argument <{name}>")]
    Missing { name: String },
    #[error("Expected '{expected}' but got '{found}'")]
    LiteralMismatch { expected: String, found: String },
    #[error("Unexpected argument '{token}'")]
    Unexpected { token: String },
    #[error("Invalid value '{value}' for <{name}>: expected {expected}")]
    Invalid {
        name: String,
        value: String,
        expected: String,
    },
}
