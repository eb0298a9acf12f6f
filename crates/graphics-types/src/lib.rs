//! Plain data shared by `graphics`, `graphics-backend` and
//! `graphics-backend-traits`: handles, the command-stream opcode set, and the
//! resource/descriptor structs spec.md §3 describes.
//!
//! Nothing in this crate touches a driver. It exists so that the frontend
//! facade and the two backend executors agree on a wire format for the
//! command stream without depending on each other.

pub mod commands;
pub mod error;
pub mod gpu;
pub mod handles;
pub mod rendering;
pub mod resources;
