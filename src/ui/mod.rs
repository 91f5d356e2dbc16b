//! Terminal front end.
//!
//! - [`chat_loop`]: reads input lines, dispatches slash commands and prints
//!   whatever the session applied since the last redraw.
//! - [`appearance`] and [`palette`]: light/dark detection and accent colors.
//!
//! This layer only presents session state; [`crate::core`] owns it.

pub mod appearance;
pub mod chat_loop;
pub mod palette;
