//! Parley is a small terminal client for OpenAI-compatible chat servers.
//!
//! The crate is organized around a few collaborating layers:
//! - [`api`] speaks the wire protocol: model listing, chat completions and
//!   the error taxonomy callers see.
//! - [`core`] owns the settings store, the request scheduler and the chat
//!   session that ties them together.
//! - [`ui`] runs the line-oriented chat loop and picks display colors.
//! - [`commands`] parses and executes the chat loop's slash commands.
//! - [`cli`] parses arguments and dispatches to the chat loop or one-shot
//!   commands.
//!
//! The binary (`src/main.rs`) routes straight through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
