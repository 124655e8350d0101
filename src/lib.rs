//! EasyPow Library
//!
//! Finds strings whose digest matches a partial bit pattern, and uses that
//! to run interactive proof-of-work challenges over a line-based transport.
//!
//! # Overview
//!
//! The search engine lives in `easypow-core` and is re-exported here as
//! [`engine`]. This crate adds the challenge protocol: a verifier issues a
//! random nonce and checks the response, a solver parses the challenge and
//! searches for a response.
//!
//! # Example
//!
//! ```rust
//! use easypow::protocol::Challenge;
//! use easypow::SearchConfig;
//!
//! let challenge = Challenge::new("abcdef0123456789", 8).unwrap();
//! let line = challenge.to_string();
//!
//! // Solver side: parse the line and search for a response
//! let response = easypow::solve_challenge(line.as_bytes(), &SearchConfig::default()).unwrap();
//!
//! // Verifier side
//! assert!(challenge.verify(&response));
//! ```

// Re-export the search engine
pub use easypow_core as engine;

pub mod config;
pub mod protocol;

// Convenience re-exports
pub use engine::{
    search_prefix, search_suffix, Algorithm, SearchConfig, SearchResult, DEFAULT_ALPHABET,
};
pub use protocol::{
    issue_challenge, respond, solve_challenge, Challenge, LineTransport, Transport,
};
