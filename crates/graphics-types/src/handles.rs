use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// One table per kind in the Resource Registry (spec.md §4.A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum HandleKind {
    Buffer,
    Texture,
    Mesh,
    Shader,
    ComputePipeline,
    VirtualDisplay,
}

/// A generational, non-owning reference into the Resource Registry
/// (spec.md §3 "Handle"). `index == 0 && generation == 0` is the null
/// handle; comparing two handles of the same kind is a cheap integer compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    pub kind: HandleKind,
    pub index: u32,
    pub generation: u32,
}

impl Handle {
    pub const fn null(kind: HandleKind) -> Self {
        Self {
            kind,
            index: 0,
            generation: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.index == 0 && self.generation == 0
    }
}
