use graphics_types::commands::RenderPassBegin;
use graphics_types::error::UrcResult;
use graphics_types::handles::Handle;
use graphics_types::resources::{BlendMode, ScalingMode, VirtualDisplay};
use graphics_types::rendering::{LoadOp, RenderTarget, Scissor, StoreOp, Viewport};
use math::Rgba;

use crate::recorder::CommandRecorder;

/// Destination rectangle on the main surface a virtual display's color
/// attachment is blitted into, computed from its scaling mode (spec.md
/// §4.F step 2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

pub fn dest_rect(
    scaling: ScalingMode,
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
) -> DestRect {
    match scaling {
        ScalingMode::Stretch => DestRect {
            x: 0,
            y: 0,
            w: dst_w,
            h: dst_h,
        },
        ScalingMode::Fit => {
            let src_aspect = src_w as f32 / src_h as f32;
            let dst_aspect = dst_w as f32 / dst_h as f32;
            let (w, h) = if src_aspect > dst_aspect {
                (dst_w, (dst_w as f32 / src_aspect).round() as u32)
            } else {
                ((dst_h as f32 * src_aspect).round() as u32, dst_h)
            };
            DestRect {
                x: ((dst_w as i32) - w as i32) / 2,
                y: ((dst_h as i32) - h as i32) / 2,
                w,
                h,
            }
        }
        ScalingMode::Integer => {
            let factor = (dst_w / src_w.max(1)).min(dst_h / src_h.max(1)).max(1);
            let w = src_w * factor;
            let h = src_h * factor;
            DestRect {
                x: ((dst_w as i32) - w as i32) / 2,
                y: ((dst_h as i32) - h as i32) / 2,
                w,
                h,
            }
        }
    }
}

/// Push-constant contract id the internal composite quad pipeline expects:
/// a destination rect in normalized device coordinates plus the display's
/// opacity. Reserved and opaque to callers per spec.md §9 "Push-constant
/// contract id".
pub const COMPOSITE_PUSH_CONSTANT_CONTRACT: u32 = 0;

/// The four internal quad pipelines the compositor binds, one per blend
/// mode (spec.md §4.F step 3: "Blend equations"). A pipeline's blend state
/// is fixed-function and baked in at creation, so each mode gets its own
/// `Shader` handle built from the same quad source at `System` init.
#[derive(Debug, Clone, Copy)]
pub struct CompositePipelines {
    pub opaque: Handle,
    pub alpha: Handle,
    pub additive: Handle,
    pub multiply: Handle,
    pub quad_vertex_buffer: Handle,
}

impl CompositePipelines {
    pub fn pipeline_for(&self, blend: BlendMode) -> Handle {
        match blend {
            BlendMode::Opaque => self.opaque,
            BlendMode::Alpha => self.alpha,
            BlendMode::Additive => self.additive,
            BlendMode::Multiply => self.multiply,
        }
    }
}

/// Records the terminal composite pass (spec.md §4.F): collects visible
/// displays ascending by z, computes each one's destination rectangle, and
/// issues a textured quad draw per display with its blend mode and opacity.
pub struct Compositor {
    pipelines: CompositePipelines,
}

impl Compositor {
    pub fn new(pipelines: CompositePipelines) -> Self {
        Self { pipelines }
    }

    pub fn record(
        &self,
        recorder: &mut CommandRecorder,
        displays: &mut [&VirtualDisplay],
        main_width: u32,
        main_height: u32,
    ) -> UrcResult<()> {
        displays.sort_by_key(|d| d.z);
        let visible: Vec<&&VirtualDisplay> = displays.iter().filter(|d| d.visible).collect();
        if visible.is_empty() {
            return Ok(());
        }

        recorder.begin_render_pass(RenderPassBegin {
            target: RenderTarget::Main,
            color_load: LoadOp::Load,
            color_store: StoreOp::Store,
            color_clear: Rgba::TRANSPARENT,
            depth_load: LoadOp::DontCare,
            depth_store: StoreOp::DontCare,
            depth_clear: 1.0,
        })?;
        recorder.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            w: main_width as f32,
            h: main_height as f32,
        })?;

        for display in visible {
            let rect = dest_rect(display.scaling, display.width, display.height, main_width, main_height);
            recorder.set_scissor(Scissor {
                x: rect.x + display.offset.x.round() as i32,
                y: rect.y + display.offset.y.round() as i32,
                w: rect.w as i32,
                h: rect.h as i32,
            })?;
            recorder.bind_pipeline(self.pipelines.pipeline_for(display.blend))?;
            recorder.bind_sampled_texture(0, display.color_attachment)?;
            recorder.bind_vertex_buffer(self.pipelines.quad_vertex_buffer)?;

            // rect in NDC: xy is the top-left corner, zw the (signed) extent
            // the unit quad's [0,1] vertex positions are scaled by; std140
            // packs `vec4 rect; float opacity;` into a 32-byte block.
            let scissor_x = rect.x + display.offset.x.round() as i32;
            let scissor_y = rect.y + display.offset.y.round() as i32;
            let ndc_x = (scissor_x as f32 / main_width as f32) * 2.0 - 1.0;
            let ndc_y = 1.0 - (scissor_y as f32 / main_height as f32) * 2.0;
            let ndc_w = (rect.w as f32 / main_width as f32) * 2.0;
            let ndc_h = -(rect.h as f32 / main_height as f32) * 2.0;
            let mut constants = [0u8; 32];
            constants[0..4].copy_from_slice(&ndc_x.to_le_bytes());
            constants[4..8].copy_from_slice(&ndc_y.to_le_bytes());
            constants[8..12].copy_from_slice(&ndc_w.to_le_bytes());
            constants[12..16].copy_from_slice(&ndc_h.to_le_bytes());
            constants[16..20].copy_from_slice(&display.opacity.to_le_bytes());
            recorder.set_push_constant(COMPOSITE_PUSH_CONSTANT_CONTRACT, &constants)?;
            recorder.draw(graphics_types::commands::DrawArgs {
                vertex_count: 6,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            })?;
        }

        recorder.end_render_pass()
    }
}

/// A virtual display is dirty when any command targeting it was recorded
/// this frame, or it was explicitly marked dirty (spec.md §4.F "Dirty
/// tracking"). A non-dirty display skips its internal passes and its
/// attachment carries over unchanged.
pub fn mark_dirty_if_targeted(display: &mut VirtualDisplay, targeted_this_frame: bool) {
    if targeted_this_frame {
        display.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphics_types::commands::Command;
    use graphics_types::handles::HandleKind;

    #[test]
    fn fit_centers_same_aspect_source_with_no_letterboxing() {
        let rect = dest_rect(ScalingMode::Fit, 640, 480, 640, 480);
        assert_eq!(rect, DestRect { x: 0, y: 0, w: 640, h: 480 });
    }

    #[test]
    fn fit_letterboxes_a_narrower_source() {
        let rect = dest_rect(ScalingMode::Fit, 640, 480, 800, 480);
        assert_eq!(rect.h, 480);
        assert!(rect.w < 800);
        assert_eq!(rect.x, (800 - rect.w as i32) / 2);
    }

    #[test]
    fn stretch_always_fills_the_destination() {
        let rect = dest_rect(ScalingMode::Stretch, 320, 200, 640, 480);
        assert_eq!(rect, DestRect { x: 0, y: 0, w: 640, h: 480 });
    }

    fn test_display(id: i64, z: i32, blend: BlendMode, opacity: f32) -> VirtualDisplay {
        VirtualDisplay {
            id,
            width: 640,
            height: 480,
            z,
            scaling: ScalingMode::Fit,
            blend,
            opacity,
            visible: true,
            dirty: true,
            offset: math::Vec2::ZERO,
            frame_time_multiplier: 1.0,
            color_attachment: Handle::null(HandleKind::Texture),
            depth_attachment: Handle::null(HandleKind::Texture),
            last_composite_time_ms: 0.0,
        }
    }

    fn handle(kind: HandleKind, index: u32) -> Handle {
        Handle { kind, index, generation: 0 }
    }

    fn composite_pipelines() -> CompositePipelines {
        CompositePipelines {
            opaque: handle(HandleKind::Shader, 1),
            alpha: handle(HandleKind::Shader, 2),
            additive: handle(HandleKind::Shader, 3),
            multiply: handle(HandleKind::Shader, 4),
            quad_vertex_buffer: handle(HandleKind::Buffer, 5),
        }
    }

    /// spec.md §8 scenario S3: an opaque `z=0` red display under an alpha
    /// `z=1` blue display at opacity 0.5 draws back-to-front and the second
    /// draw's push constant carries 0.5, so the two quad draws alone fully
    /// determine the blended result the scenario's expected pixel describes.
    #[test]
    fn composites_back_to_front_by_z_with_each_displays_blend_pipeline() {
        let compositor = Compositor::new(composite_pipelines());
        let mut recorder = CommandRecorder::new();
        let back = test_display(0, 0, BlendMode::Opaque, 1.0);
        let front = test_display(1, 1, BlendMode::Alpha, 0.5);
        let mut displays = [&front, &back];

        compositor.record(&mut recorder, &mut displays, 640, 480).unwrap();

        let pipelines: Vec<Handle> = recorder
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::BindPipeline { shader } => Some(*shader),
                _ => None,
            })
            .collect();
        assert_eq!(pipelines, vec![compositor.pipelines.opaque, compositor.pipelines.alpha]);

        let opacities: Vec<f32> = recorder
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetPushConstant { bytes, .. } => Some(f32::from_le_bytes(bytes[16..20].try_into().unwrap())),
                _ => None,
            })
            .collect();
        assert_eq!(opacities, vec![1.0, 0.5]);
    }

    #[test]
    fn skips_the_whole_pass_when_no_display_is_visible() {
        let compositor = Compositor::new(composite_pipelines());
        let mut recorder = CommandRecorder::new();
        let mut hidden = test_display(0, 0, BlendMode::Opaque, 1.0);
        hidden.visible = false;
        let mut displays = [&hidden];

        compositor.record(&mut recorder, &mut displays, 640, 480).unwrap();

        assert!(recorder.commands().is_empty());
    }
}
