#![warn(clippy::pedantic)]
// Sometimes a redundant else is clearer
#![allow(clippy::redundant_else)]
// Don't care enough to fix
#![allow(clippy::match_same_arms)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::wildcard_imports)]

//! A stub resolver: sends questions to a recursive server and makes
//! sense of what comes back.  Not a recursive resolver itself - the
//! heavy lifting of walking the delegation tree is the upstream
//! server's job.
//!
//! The pieces:
//!
//! - [`lookup::LookupSession`], the user-facing engine: search-path
//!   expansion, hosts-file answers, cache consultation, and
//!   CNAME/DNAME chasing.
//!
//! - [`cache::SharedCache`], a per-class cache of positive and
//!   negative answers ranked by credibility.
//!
//! - [`transport::Transport`], the pluggable carrier of messages,
//!   with a UDP-with-TCP-fallback implementation.

pub mod cache;
pub mod lookup;
pub mod transport;

pub use self::cache::{CacheResponse, Credibility, SharedCache};
pub use self::lookup::{LookupConfig, LookupError, LookupResult, LookupSession};
pub use self::transport::{Transport, TransportError, UdpTransport};
