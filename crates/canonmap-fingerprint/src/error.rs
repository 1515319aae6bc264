/// A strategy-local failure. The dispatcher catches these and falls through
/// to the next applicable (lower-priority) strategy, matching spec.md's
/// "any strategy-local exception is caught; the serializer falls through."
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("value is not a valid UTF-8 regex source/flags pair")]
    InvalidRegex,
    #[error("strategy does not apply to this category")]
    NotApplicable,
}
