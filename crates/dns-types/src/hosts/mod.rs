//! Hosts files: a static name-to-address table consulted before any
//! query goes to the network.  Supports the standard format:
//!
//! ```text
//! # addresses can have multiple names, and repeated names override
//! 127.0.0.1       localhost
//! ::1             localhost
//! 10.0.0.17       host.example.com host
//! ```

pub mod deserialise;
pub mod types;

pub use self::types::Hosts;
