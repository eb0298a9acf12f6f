use graphics_types::resources::{BlendMode, ScalingMode};
use math::Vec2;

/// `virtual-display.configure(id, {offset, opacity, z, visible, blend,
/// multiplier})` (spec.md §6). Idempotent: calling `configure` twice with
/// the same `VirtualDisplayConfig` is equivalent to calling it once
/// (spec.md §8 property 9) since it's a plain field-by-field assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualDisplayConfig {
    pub offset: Vec2,
    pub opacity: f32,
    pub z: i32,
    pub visible: bool,
    pub blend: BlendMode,
    pub frame_time_multiplier: f32,
}

impl Default for VirtualDisplayConfig {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            opacity: 1.0,
            z: 0,
            visible: true,
            blend: BlendMode::Opaque,
            frame_time_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VirtualDisplayCreate {
    pub width: u32,
    pub height: u32,
    pub z: i32,
    pub scaling: ScalingMode,
    pub blend: BlendMode,
    pub opacity: f32,
}
