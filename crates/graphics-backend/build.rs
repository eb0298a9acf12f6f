use std::env;
use std::fs::File;
use std::path::Path;

use gl_generator::{Api, Fallbacks, GlobalGenerator, Profile, Registry};

/// Generates the GL 4.6 Core bindings the immediate executor calls into
/// (spec.md §4.D). Ran once at build time; the generated module is included
/// verbatim by `backends::immediate::gl`.
fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let mut file = File::create(Path::new(&out_dir).join("gl_bindings.rs")).unwrap();

    let registry = Registry::new(Api::Gl, (4, 6), Profile::Core, Fallbacks::All, []);
    registry
        .write_bindings(GlobalGenerator, &mut file)
        .expect("failed to generate GL bindings");
}
