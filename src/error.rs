use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolarizeError {
    /// The accumulator was frozen before any sample was added.
    #[error("no samples have been added to the polarimetric image")]
    NoSamples,

    /// A writer panicked while holding a row lock, leaving that row partially updated.
    #[error("row {row} was poisoned by a panicking writer")]
    PoisonedRow { row: i32 },
}
