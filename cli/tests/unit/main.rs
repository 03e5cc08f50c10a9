//! Unit tests for the swarm CLI
//!
//! These tests use scripted backends and run fast without spawning gomote.

mod fleet;
mod gomote_backend;
