//! # Domain Layer
//!
//! Pure verification logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod approval;
pub mod codec;
pub mod entities;
pub mod errors;
pub mod hashing;
pub mod rules;
pub mod whitelist;
