#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Integration test crate for Harbor.
//!
//! This crate exists solely for the §8 end-to-end scenario tests. It is
//! `publish = false` and has no library code — all tests live in `tests/`.
