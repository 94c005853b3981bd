//! Live poll client library.

pub mod cli;
pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod session;
pub mod sink;
pub mod tally;
pub mod terminal;
pub mod view;

pub use controller::{PollStateController, SessionRole};
