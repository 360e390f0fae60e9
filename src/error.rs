/// Error kinds raised by the simulation core.
///
/// None of these are fatal: `OutOfBounds` marks a caller that skipped its
/// bounds check, `InvalidTransition` marks an input or tick the current
/// phase does not accept (the caller keeps the previous snapshot), and
/// `InvalidLayout` marks a generator that broke the layout contract.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("position ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i64, y: i64 },

    #[error("transition not accepted: {0}")]
    InvalidTransition(&'static str),

    #[error("invalid level layout: {0}")]
    InvalidLayout(String),
}
