//! # Ideas Parking Lot CLI
//!
//! Terminal front end for the Ideas Parking Lot service:
//! - account flows (register, login, Google sign-in, logout, password reset)
//! - browsing, creating, editing and deleting ideas
//!
//! Argument parsing is clap derive; each command has a handler taking the
//! shared [`context::AppContext`].

pub mod cli;
pub mod context;
pub mod error;
pub mod output;
pub mod progress;

pub use cli::*;
pub use error::*;
