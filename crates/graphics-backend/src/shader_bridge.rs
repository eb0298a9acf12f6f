use std::collections::HashMap;

use graphics_backend_traits::shader_compiler::{ShaderCompileError, ShaderCompiler, ShaderStage};
use graphics_types::error::{UrcError, UrcResult};
use log::debug;

/// Translates GLSL shader stages to SPIR-V at load time and caches the
/// result by `(source, stage)` (spec.md §4.H). Optional: a caller who only
/// ever submits pre-compiled SPIR-V never needs a compiler installed.
pub struct ShaderBridge {
    compiler: Option<Box<dyn ShaderCompiler>>,
    cache: HashMap<(String, ShaderStage), Vec<u8>>,
}

impl ShaderBridge {
    pub fn new(compiler: Option<Box<dyn ShaderCompiler>>) -> Self {
        Self {
            compiler,
            cache: HashMap::new(),
        }
    }

    pub fn has_compiler(&self) -> bool {
        self.compiler.is_some()
    }

    /// Returns cached SPIR-V bytes for `(source, stage)`, compiling and
    /// caching on a miss. `InvalidState` if no compiler was installed and a
    /// GLSL source reaches this call — callers that only submit SPIR-V never
    /// hit this path (spec.md §4.H "absent at compile time").
    pub fn compile(&mut self, stage: ShaderStage, source: &str) -> UrcResult<&[u8]> {
        let key = (source.to_string(), stage);
        if !self.cache.contains_key(&key) {
            let compiler = self.compiler.as_deref().ok_or_else(|| {
                UrcError::InvalidState(
                    "a GLSL shader stage was submitted but no shader compiler is installed".into(),
                )
            })?;
            let spirv = compiler
                .compile_glsl(stage, source)
                .map_err(|ShaderCompileError(msg)| UrcError::BackendFailure(msg))?;
            debug!("compiled {stage:?} shader stage, {} bytes of SPIR-V", spirv.len());
            self.cache.insert(key.clone(), spirv);
        }
        Ok(self.cache.get(&key).expect("just inserted"))
    }

    pub fn cached_entry_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(feature = "shader-compiler")]
pub struct ShadercCompiler {
    compiler: shaderc::Compiler,
}

#[cfg(feature = "shader-compiler")]
impl std::fmt::Debug for ShadercCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadercCompiler").finish()
    }
}

#[cfg(feature = "shader-compiler")]
impl ShadercCompiler {
    pub fn new() -> UrcResult<Self> {
        let compiler = shaderc::Compiler::new()
            .ok_or_else(|| UrcError::BackendFailure("failed to initialize shaderc".into()))?;
        Ok(Self { compiler })
    }
}

#[cfg(feature = "shader-compiler")]
impl ShaderCompiler for ShadercCompiler {
    fn compile_glsl(&self, stage: ShaderStage, source: &str) -> Result<Vec<u8>, ShaderCompileError> {
        let kind = match stage {
            ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
            ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
            ShaderStage::Compute => shaderc::ShaderKind::Compute,
        };
        let artifact = self
            .compiler
            .compile_into_spirv(source, kind, "<inline>", "main", None)
            .map_err(|e| ShaderCompileError(e.to_string()))?;
        Ok(artifact.as_binary_u8().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakeCompiler;
    impl ShaderCompiler for FakeCompiler {
        fn compile_glsl(&self, _stage: ShaderStage, source: &str) -> Result<Vec<u8>, ShaderCompileError> {
            Ok(source.bytes().collect())
        }
    }

    #[test]
    fn caches_repeated_compiles_of_the_same_source() {
        let mut bridge = ShaderBridge::new(Some(Box::new(FakeCompiler)));
        bridge.compile(ShaderStage::Fragment, "void main() {}").unwrap();
        assert_eq!(bridge.cached_entry_count(), 1);
        bridge.compile(ShaderStage::Fragment, "void main() {}").unwrap();
        assert_eq!(bridge.cached_entry_count(), 1);
        bridge.compile(ShaderStage::Vertex, "void main() {}").unwrap();
        assert_eq!(bridge.cached_entry_count(), 2);
    }

    #[test]
    fn missing_compiler_is_invalid_state() {
        let mut bridge = ShaderBridge::new(None);
        let err = bridge.compile(ShaderStage::Vertex, "void main() {}").unwrap_err();
        assert!(matches!(err, UrcError::InvalidState(_)));
    }
}
