//! Shared types, errors, configuration and collaborator traits.
//!
//! Configuration is loaded with Figment from `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars. Metadata extraction lives here because it only needs a
//! [`traits::MetadataSource`]; rendering and vision backends are separate crates.
#![deny(unused_variables)]

pub mod config;
pub mod error;
pub mod metadata;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
