use std::sync::Arc;

use config::config::ConfigBackendKind;
use graphics_backend_traits::{FontAtlas, GlContextProvider, ShaderCompiler, SurfaceProvider, TimerProvider};

/// Arguments to `init` (spec.md §6): backend choice, a slot-count hint the
/// scheduler clamps to what the chosen backend supports, debug mode, and
/// the boundary adapters the URC consumes but never constructs itself.
pub struct InitOptions {
    pub backend: ConfigBackendKind,
    pub slot_count_hint: u32,
    pub debug_mode: bool,
    pub vsync: bool,
    pub msaa_samples: u32,
    pub surface: Arc<dyn SurfaceProvider>,
    pub gl_context: Option<Arc<dyn GlContextProvider>>,
    pub timer: Arc<dyn TimerProvider>,
    pub shader_compiler: Option<Arc<dyn ShaderCompiler>>,
}

/// `create-texture-from-pixels`'s source (spec.md §6 "From Image decode").
pub struct PixelSource<'a> {
    pub width: u32,
    pub height: u32,
    pub rgba8: &'a [u8],
    pub attribution: &'a str,
}

/// `draw-text`'s font dependency (spec.md §6 "From Font atlas").
pub struct FontSource {
    pub atlas: FontAtlas,
    pub attribution: String,
}
