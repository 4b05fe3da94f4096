// error.rs — Error types for the policy subsystem.
//
// Policy decisions are values, never errors. These variants only cover
// parsing tokens that arrive as strings from the host (config, storage,
// CLI arguments).

use thiserror::Error;

/// Errors that can occur while parsing policy vocabulary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// The token is not part of the deployed capability catalog.
    #[error("unknown capability '{token}' (catalog {catalog_version})")]
    UnknownCapability {
        token: String,
        catalog_version: &'static str,
    },

    /// The name is not one of the fixed roles.
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    /// The string is not a known policy reason code.
    #[error("unknown reason code '{0}'")]
    UnknownReasonCode(String),
}
