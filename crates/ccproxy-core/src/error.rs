use http::StatusCode;

/// Domain error that knows how it should surface over HTTP
///
/// Feature crates implement this for their error enums so the server
/// layer can render failures without depending on their internals.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `unsupported_feature_error`)
    fn error_type(&self) -> &str;

    /// Diagnostic text safe to hand back to the peer
    fn client_message(&self) -> String;
}
