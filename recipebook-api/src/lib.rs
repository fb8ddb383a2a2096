//! # Recipe Book API Server Library
//!
//! Core functionality of the recipe book HTTP API.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Custom tower middleware
//! - `pagination`: Page-number pagination with absolute links
//! - `params`: Query string parsing
//! - `represent`: JSON response representations
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod pagination;
pub mod params;
pub mod represent;
pub mod routes;
