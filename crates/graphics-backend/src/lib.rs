//! The Unified Rendering Core's device-facing half: the Resource Registry
//! (4.A), Frame Scheduler (4.B), Command Stream recorder (4.C), the two
//! Backend Executors (4.D/4.E), the Virtual Display Compositor (4.F), the
//! Update-Before-Draw Verifier (4.G) and the Shader Compiler Bridge (4.H).
//!
//! Laid out the way the teacher splits `graphics-backend` from `graphics`:
//! this crate owns every driver call; the `graphics` crate wires it into the
//! public operation surface applications call.

pub mod backends;
pub mod compositor;
pub mod executor;
pub mod recorder;
pub mod registry;
pub mod scheduler;
pub mod shader_bridge;
pub mod verifier;

pub use compositor::{CompositePipelines, Compositor};
pub use executor::{BackendExecutor, BackendKind, EndFrameOutcome};
pub use recorder::CommandRecorder;
pub use registry::Registry;
pub use scheduler::{FrameScheduler, SchedulerOutcome};
pub use shader_bridge::ShaderBridge;
pub use verifier::Verifier;
