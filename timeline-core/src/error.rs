/// Errors raised while building or interacting with a timeline.
///
/// None of these are fatal to the widget: callers log them and keep the last
/// good layout.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimelineError {
    #[error("timeline container not found, keeping last position")]
    MissingContainer,
    #[error("no drag or resize gesture is active")]
    NoActiveGesture,
    #[error("another gesture is already active on item {0}")]
    GestureInProgress(String),
    #[error("pointer button {0} does not start a gesture")]
    UnsupportedButton(i16),
    #[error("input is missing required data")]
    MissingData,
    #[error("could not read input: {0}")]
    Parse(String),
    #[error("other error: {0}")]
    Other(String),
}
