#![allow(clippy::needless_return, clippy::too_many_arguments, clippy::collapsible_if,
         clippy::collapsible_else_if, clippy::field_reassign_with_default,
         clippy::manual_range_contains, clippy::float_cmp, clippy::needless_range_loop,
         clippy::new_without_default)]
// Spectator client: connection state, the tracking camera and its console
// commands, input and mouse acceleration, tied together by the session.
pub mod client;
pub mod cl_timing;
pub mod cl_trace;
pub mod cl_flyby;
pub mod cl_multiview;
pub mod cl_cam;
pub mod cl_cam_cmds;
pub mod cl_mouseaccel;
pub mod cl_input;
pub mod cl_main;
