#![allow(clippy::needless_return, clippy::too_many_arguments)]

// Host side of the spectator client: a scripted arena that stands in for a
// server, and the command-line plumbing for the simulator binary.

pub mod sim;
pub mod view_thread;
