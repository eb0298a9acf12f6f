//! Minimal vector/matrix/color math shared by `graphics-types` and the backends.
//!
//! Kept intentionally small: the Unified Rendering Core only ever needs to
//! carry transforms and colors through the command stream, never to do heavy
//! linear algebra itself (that's left to the application).

pub mod color;
pub mod matrix;
pub mod vector;

pub use color::Rgba;
pub use matrix::Mat4;
pub use vector::{Vec2, Vec3, Vec4};
