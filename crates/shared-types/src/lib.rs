//! # Shared Types Crate
//!
//! Wire-level data transfer objects returned by the platform API, plus the
//! error type transport collaborators report.
//!
//! ## Design Principles
//!
//! - **Untrusted by default**: every DTO here is exactly what arrived over
//!   the network. Convenience fields such as `payload` or a DTO's `address`
//!   are never consulted for trust decisions.
//! - **Signed bytes are opaque strings**: `payloadAsString` and base64 blobs
//!   are carried verbatim so hashes can be recomputed over the delivered bytes.

pub mod envelope;
pub mod errors;

pub use envelope::*;
pub use errors::*;
