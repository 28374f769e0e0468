//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that SDK callers use
//! - **Outbound (Driven)**: Transport collaborators this core needs

pub mod inbound;
pub mod outbound;
