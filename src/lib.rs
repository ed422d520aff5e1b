//! taskcon: keyboard-driven console process monitor.
//!
//! The `ui` module is a small retained-mode widget framework drawing on a
//! `console::Console`; `screens` builds the monitor's pages on top of it.

pub mod commands;
pub mod console;
pub mod error;
pub mod logging;
pub mod platform;
pub mod screens;
pub mod settings;
pub mod state;
pub mod system;
pub mod types;
pub mod ui;
