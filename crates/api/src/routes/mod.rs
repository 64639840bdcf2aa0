//! Route handlers

pub mod health;
pub mod internal;
pub mod streak;
