// Backend command handlers shared by the HTTP routes

pub mod accounts;
pub mod push;

use thiserror::Error;

/// Errors a command can report to the HTTP layer.
///
/// The variant decides the response status; the message is the response
/// body. Delivery outcomes are not errors: they are values returned by
/// the push commands and mapped separately.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad input from the client
    #[error("{0}")]
    Invalid(String),

    /// The referenced user or subscription does not exist
    #[error("{0}")]
    NotFound(String),

    /// Storage or other internal failure
    #[error("{0}")]
    Internal(String),
}

// Storage helpers report `FileResult<T> = Result<T, String>`; those are
// internal failures unless a command says otherwise.
impl From<String> for CommandError {
    fn from(message: String) -> Self {
        CommandError::Internal(message)
    }
}
