/// Middleware modules for the API server
///
/// - `security`: security response headers
///
/// Bearer authentication lives in `recipebook_shared::auth::middleware`.

pub mod security;
