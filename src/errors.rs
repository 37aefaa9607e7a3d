/*!
 * Error types for the shopglot pipeline.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to a translation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Provider returned an empty completion
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether the executor should retry after this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RequestFailed(_)
                | ProviderError::ConnectionError(_)
                | ProviderError::RateLimitExceeded(_)
                | ProviderError::EmptyResponse
        )
    }
}

/// Errors raised by the quota reservation ledger
#[derive(Error, Debug)]
pub enum QuotaError {
    /// The shop does not have enough spendable credits left
    #[error("insufficient credits for shop {shop_id}: requested {requested}, available {available}")]
    InsufficientCredits {
        /// Shop whose quota was exhausted
        shop_id: String,
        /// Credits the reservation asked for
        requested: i64,
        /// Credits still spendable at the time of the check
        available: i64,
    },

    /// The reservation id is unknown
    #[error("reservation not found: {0}")]
    ReservationNotFound(String),

    /// The reservation already reached a terminal state
    #[error("reservation {id} already finalized as {status}")]
    AlreadyFinalized {
        /// Reservation id
        id: String,
        /// Terminal status it already holds
        status: String,
    },

    /// The shop has no balance row
    #[error("unknown shop: {0}")]
    UnknownShop(String),

    /// Underlying datastore failure
    #[error("ledger datastore error: {0}")]
    Datastore(String),
}

impl From<rusqlite::Error> for QuotaError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Datastore(error.to_string())
    }
}

/// Main pipeline error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a configuration file or value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the quota ledger
    #[error("Quota error: {0}")]
    Quota(#[from] QuotaError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::Config(error.to_string())
    }
}
