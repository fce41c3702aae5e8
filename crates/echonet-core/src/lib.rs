//! ECHONET Lite protocol encoding and decoding in pure Rust.
//!
//! `echonet-core` provides the frame codec, object and service identifiers,
//! and decoders for the property payloads used during node discovery
//! (instance lists, property maps, identification numbers). It is the
//! foundation of the echonet crate family and stays usable in `no_std`
//! environments.
//!
//! # Feature flags
//!
//! - **`std`** (default): enables `std::error::Error` implementations.
//! - **`alloc`** (default): enables the owned [`frame::Frame`] type and the
//!   payload decoders in [`services`].
//! - **`serde`**: derives `Serialize`/`Deserialize` on core types.
//! - **`defmt`**: derives `defmt::Format` for embedded logging.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// Zero-copy reader/writer over caller-owned byte buffers.
pub mod encoding;
/// Error types for encoding and decoding operations.
pub mod error;
/// ECHONET Lite frame (EHD, TID, SEOJ/DEOJ, ESV, property lists).
#[cfg(feature = "alloc")]
pub mod frame;
/// Decoders for the EDT payloads of well-known properties.
#[cfg(feature = "alloc")]
pub mod services;
/// Object identifiers, service codes, property codes and property maps.
pub mod types;

pub use error::{DecodeError, EncodeError};
