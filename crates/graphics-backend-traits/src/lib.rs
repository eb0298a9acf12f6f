//! The capability traits external collaborators implement toward the URC
//! (spec.md §6), in the spirit of the teacher's `plugin.rs` /
//! `frame_fetcher_plugin.rs` external-capability-trait style: small `Debug +
//! Send + Sync` traits the backend holds as trait objects, never concrete
//! types, so `graphics-backend` doesn't depend on `winit`, `image`, or
//! `fontdue` directly.

pub mod font_provider;
pub mod gl_context_provider;
pub mod image_provider;
pub mod shader_compiler;
pub mod surface_provider;
pub mod timer_provider;

pub use font_provider::{FontAtlas, FontGlyphMetrics};
pub use gl_context_provider::GlContextProvider;
pub use image_provider::DecodedImage;
pub use shader_compiler::{ShaderCompileError, ShaderCompiler, ShaderStage};
pub use surface_provider::{SurfaceExtent, SurfaceProvider};
pub use timer_provider::TimerProvider;
