/// Router Module Index
///
/// Splits the BFF's endpoints by the credential they require. Access control is applied at the
/// module level (via Axum layers) so a handler cannot be exposed without its check.

/// Routes open to any client, with or without tokens.
pub mod public;

/// Routes requiring an end-user token the upstream accepts.
pub mod authenticated;

/// Routes requiring an admin token the upstream accepts. Nested under `/admin`.
pub mod admin;
