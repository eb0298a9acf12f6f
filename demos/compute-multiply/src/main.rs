//! Tutorial entry point for spec.md §8 scenario S2 ("Compute multiply"):
//! upload a storage buffer, run a compute dispatch that multiplies every
//! element by a push-constant scalar, and read the result back once the
//! frame has retired.

use std::sync::Arc;

use clap::Parser;
use cli::DemoArgs;
use graphics::{AcquireOutcome, InitOptions, System};
use graphics_types::rendering::StageMask;
use graphics_types::resources::{BufferUsage, DescriptorLayoutKind, ShaderStageSource};
use timer::Timer;
use window::event_loop::WindowApp;
use window::gl_context::GlutinGlContext;
use window::{InputState, WindowRunner, WinitSurfaceProvider};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

const ELEMENT_COUNT: u32 = 1024;
const MULTIPLIER: f32 = 10.0;
const COMPUTE_SHADER_SOURCE: &str = include_str!("multiply.comp.glsl");

fn push_constant_bytes(multiplier: f32, count: u32) -> [u8; 8] {
    let mut bytes = [0u8; 8];
    bytes[0..4].copy_from_slice(&multiplier.to_ne_bytes());
    bytes[4..8].copy_from_slice(&count.to_ne_bytes());
    bytes
}

struct ComputeMultiply {
    args: DemoArgs,
    gl_context: Option<Arc<GlutinGlContext>>,
    system: Option<System>,
    done: bool,
}

impl WindowApp for ComputeMultiply {
    fn create_window(&mut self, event_loop: &ActiveEventLoop, attributes: WindowAttributes) -> Window {
        if self.args.backend == cli::BackendArg::Immediate {
            let (window, context) = GlutinGlContext::new(
                event_loop,
                attributes,
                !self.args.no_vsync,
                self.args.msaa_samples,
            )
            .expect("failed to build GL window/context");
            self.gl_context = Some(Arc::new(context));
            window
        } else {
            event_loop
                .create_window(attributes)
                .expect("failed to create window")
        }
    }

    fn init(&mut self, surface: &Arc<WinitSurfaceProvider>) {
        let options = InitOptions {
            backend: self.args.backend.into(),
            slot_count_hint: 2,
            debug_mode: self.args.debug,
            vsync: !self.args.no_vsync,
            msaa_samples: self.args.msaa_samples,
            surface: surface.clone(),
            gl_context: self
                .gl_context
                .clone()
                .map(|c| c as Arc<dyn graphics_backend_traits::GlContextProvider>),
            timer: Arc::new(Timer::new()),
            shader_compiler: None,
        };
        self.system = Some(System::init(options).expect("System::init failed"));
        log::info!("initialized {:?} backend", self.args.backend);
    }

    fn on_tick(&mut self, _input: &InputState) -> bool {
        if self.done {
            return false;
        }
        let system = self.system.as_mut().expect("init ran before first tick");

        let input: Vec<f32> = (0..ELEMENT_COUNT).map(|i| i as f32).collect();
        let input_bytes: Vec<u8> = input.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let buffer_size = input_bytes.len() as u64;

        let b_in = system
            .create_buffer(buffer_size, BufferUsage::STORAGE, "compute-multiply-b-in")
            .expect("create-buffer(b_in) failed");
        let b_out = system
            .create_buffer(buffer_size, BufferUsage::STORAGE, "compute-multiply-b-out")
            .expect("create-buffer(b_out) failed");
        let pipeline = system
            .create_compute_pipeline(
                ShaderStageSource::Glsl(COMPUTE_SHADER_SOURCE.to_string()),
                DescriptorLayoutKind::TwoStorageBuffers,
                "compute-multiply-pipeline",
            )
            .expect("create-compute-pipeline failed");

        match system.acquire_frame().expect("acquire-frame failed") {
            AcquireOutcome::Ok => {}
            AcquireOutcome::SurfaceLost | AcquireOutcome::BackendBusy => return true,
        }

        system
            .update_buffer(b_in, 0, &input_bytes)
            .expect("update-buffer(b_in) failed");
        system.bind_compute_pipeline(pipeline).expect("bind-compute-pipeline failed");
        system
            .bind_compute_storage_buffer(0, b_in)
            .expect("bind-compute-storage-buffer(0) failed");
        system
            .bind_compute_storage_buffer(1, b_out)
            .expect("bind-compute-storage-buffer(1) failed");
        system
            .set_push_constant(0, &push_constant_bytes(MULTIPLIER, ELEMENT_COUNT))
            .expect("set-push-constant failed");
        system
            .dispatch(ELEMENT_COUNT / 64, 1, 1)
            .expect("dispatch failed");
        system
            .pipeline_barrier(StageMask::COMPUTE_WRITE, StageMask::HOST_READ)
            .expect("pipeline-barrier failed");

        system.end_frame().expect("end-frame failed");

        let result_bytes = system
            .get_buffer_data(b_out, 0, buffer_size)
            .expect("get-buffer-data failed");
        let result: Vec<f32> = result_bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes(chunk.try_into().unwrap()))
            .collect();

        for (i, value) in result.iter().enumerate() {
            let expected = i as f32 * MULTIPLIER;
            assert!(
                (value - expected).abs() < 1e-3,
                "b_out[{i}] = {value}, expected {expected}"
            );
        }
        log::info!(
            "compute-multiply: {} elements verified, b_out[7]={}",
            ELEMENT_COUNT,
            result[7]
        );

        system.destroy_compute_pipeline(pipeline).expect("destroy-compute-pipeline failed");
        system.destroy_buffer(b_in).expect("destroy-buffer(b_in) failed");
        system.destroy_buffer(b_out).expect("destroy-buffer(b_out) failed");

        self.done = true;
        false
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        if let Some(gl) = &self.gl_context {
            gl.resize(width, height);
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = DemoArgs::parse();
    let app = ComputeMultiply {
        args,
        gl_context: None,
        system: None,
        done: false,
    };
    WindowRunner::new("compute-multiply", 64, 64, app).run()
}
