use serde::{Deserialize, Serialize};

/// Column-major 4x4 matrix, the layout both the GL and Vulkan executors
/// upload verbatim as a push-constant / uniform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Mat4(pub [[f32; 4]; 4]);

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn identity() -> Self {
        Self([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.0[3][0] = x;
        m.0[3][1] = y;
        m.0[3][2] = z;
        m
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.0[0][0] = x;
        m.0[1][1] = y;
        m.0[2][2] = z;
        m
    }

    /// Orthographic projection matching the convention used by `draw-quad`
    /// in the command stream (y-down, depth [0,1]).
    pub fn orthographic(width: f32, height: f32) -> Self {
        let mut m = Self::identity();
        m.0[0][0] = 2.0 / width;
        m.0[1][1] = -2.0 / height;
        m.0[3][0] = -1.0;
        m.0[3][1] = 1.0;
        m
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck_cast(&self.0)
    }
}

fn bytemuck_cast(m: &[[f32; 4]; 4]) -> &[u8] {
    // SAFETY: `[[f32; 4]; 4]` has no padding and a well-defined layout.
    unsafe {
        std::slice::from_raw_parts(m.as_ptr() as *const u8, std::mem::size_of::<[[f32; 4]; 4]>())
    }
}
