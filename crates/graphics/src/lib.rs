//! The public-facing facade applications call (spec.md §6): wires the
//! `graphics-backend` crate's Registry/Scheduler/Executor/Compositor/
//! Verifier/ShaderBridge into the single `System` value spec.md §9 asks
//! for, and exposes every operation named in §6 under one roof.

pub mod options;
pub mod system;
pub mod virtual_display;

pub use graphics_backend::executor::EndFrameOutcome;
pub use graphics_types::commands::{DrawArgs, DrawIndexedArgs, GlyphQuad, TextureRect};
pub use graphics_types::error::{UrcError, UrcResult};
pub use graphics_types::handles::{Handle, HandleKind};
pub use graphics_types::rendering::{LoadOp, Scissor, StageMask, StoreOp, VertexAttribute, Viewport};
pub use graphics_types::resources::{
    BlendMode, BufferUsage, DescriptorLayoutKind, ScalingMode, ShaderStageSource, TextureFormat,
    TextureUsage,
};
pub use options::{FontSource, InitOptions, PixelSource};
pub use system::{AcquireOutcome, RenderPassBeginArgs, System};
pub use virtual_display::{VirtualDisplayConfig, VirtualDisplayCreate};
