//! Common types and utilities for the CodeClash streak service

pub mod config;
pub mod daykey;
pub mod error;
pub mod models;

pub use config::Config;
pub use daykey::DayKey;
pub use error::{Error, Result};
