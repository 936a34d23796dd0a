//! Provider wire-protocol implementations.

pub mod gemini;
