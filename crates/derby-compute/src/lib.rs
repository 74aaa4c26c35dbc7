//! derby-compute: blocking REST implementation of [`derby_core::ComputeClient`].
//!
//! Talks to the Compute Engine JSON API (beta surface by default, which
//! exposes rollout versions and `minReadySec`). Authentication is out of
//! scope: callers hand in an already-minted bearer token, or none at all
//! when pointing at a local emulator.

pub mod client;
mod wire;

pub use client::{ComputeRestClient, DEFAULT_ENDPOINT};
