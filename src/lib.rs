//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-decode`, `backend-symphonia`). Host players
//! can depend on `decode-workspace` and enable the documented features without
//! needing to wire each crate individually.
