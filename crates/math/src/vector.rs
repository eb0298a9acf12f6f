use serde::{Deserialize, Serialize};

macro_rules! impl_vec {
    ($name:ident, $n:expr, $($field:ident),+) => {
        #[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
        #[repr(C)]
        pub struct $name {
            $(pub $field: f32),+
        }

        impl $name {
            pub const ZERO: Self = Self { $($field: 0.0),+ };

            pub fn new($($field: f32),+) -> Self {
                Self { $($field),+ }
            }

            pub fn as_array(&self) -> [f32; $n] {
                [$(self.$field),+]
            }
        }

        impl From<[f32; $n]> for $name {
            fn from(v: [f32; $n]) -> Self {
                let mut it = v.into_iter();
                Self { $($field: it.next().unwrap()),+ }
            }
        }
    };
}

impl_vec!(Vec2, 2, x, y);
impl_vec!(Vec3, 3, x, y, z);
impl_vec!(Vec4, 4, x, y, z, w);
