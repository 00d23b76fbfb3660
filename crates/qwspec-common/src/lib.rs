#![allow(clippy::needless_return, clippy::too_many_arguments, clippy::collapsible_if,
         clippy::collapsible_else_if, clippy::float_cmp, clippy::needless_range_loop,
         clippy::manual_range_contains, clippy::new_without_default)]
// Shared engine pieces: math, console output, cvars and command text.

pub mod q_shared;
pub mod common;
pub mod cvar;
pub mod cmd;
