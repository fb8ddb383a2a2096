/// Authentication utilities
///
/// Registration, login and password management belong to the identity
/// provider. This crate only verifies the bearer tokens it issues.
///
/// # Modules
///
/// - [`jwt`]: JWT token validation (and signing for provisioning/tests)
/// - [`middleware`]: Axum middleware and the `AuthContext` extractor

pub mod jwt;
pub mod middleware;
