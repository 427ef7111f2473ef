use thiserror::Error;

use crate::model::StopStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("stop {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: String,
        from: StopStatus,
        to: StopStatus,
    },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Failure while reassigning the two stops of an exchange.
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("exchange not applied: {0}")]
    Aborted(StoreError),

    #[error("stop {applied} was reassigned but stop {failed} was not: {source}")]
    Partial {
        applied: String,
        failed: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("courier {0} not found")]
    CourierNotFound(String),

    #[error("stop {0} not found")]
    StopNotFound(String),

    #[error("stop {stop_id} is no longer assigned to courier {expected_courier}")]
    StaleExchange {
        stop_id: String,
        expected_courier: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Exchange(#[from] SwapError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
