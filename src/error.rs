use std::collections::TryReserveError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlatSetError {
    #[error("failed to reserve room for {additional} more elements")]
    Reserve {
        additional: usize,
        #[source]
        source: TryReserveError,
    },
}
