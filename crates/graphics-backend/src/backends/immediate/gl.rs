//! Generated GL 4.6 Core bindings (see `build.rs`). Consumers reach every
//! entry point through `gl::Xyz` and every enum through `gl::XYZ_CONSTANT`,
//! as gl_generator lays them out.
#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
