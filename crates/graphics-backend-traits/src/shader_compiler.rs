use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

#[derive(Debug, Error)]
#[error("shader compile failed: {0}")]
pub struct ShaderCompileError(pub String);

/// `compile-glsl(stage, source) -> spirv-bytes | error-string` (spec.md §6
/// "From Shader compiler"). The Shader Compiler Bridge (§4.H) caches calls
/// through this trait by `(source, stage)`; the trait itself stays
/// driver-agnostic so `graphics-backend` can build without a compiler
/// present when only pre-compiled SPIR-V sources are used, per §4.H's
/// "permitted to be absent at compile time."
pub trait ShaderCompiler: std::fmt::Debug + Send + Sync {
    fn compile_glsl(&self, stage: ShaderStage, source: &str) -> Result<Vec<u8>, ShaderCompileError>;
}
