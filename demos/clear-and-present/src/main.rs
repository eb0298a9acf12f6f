//! Tutorial entry point for spec.md §8 scenario S1 ("Clear-and-present"):
//! acquire a frame, clear the main surface to a fixed color, present, and
//! report the scheduler's frame index.

use std::sync::Arc;

use clap::Parser;
use cli::DemoArgs;
use graphics::{AcquireOutcome, InitOptions, RenderPassBeginArgs, System};
use graphics_types::rendering::{LoadOp, StoreOp};
use math::Rgba;
use timer::Timer;
use window::event_loop::WindowApp;
use window::gl_context::GlutinGlContext;
use window::{InputState, WindowRunner, WinitSurfaceProvider};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

struct ClearAndPresent {
    args: DemoArgs,
    gl_context: Option<Arc<GlutinGlContext>>,
    system: Option<System>,
    frames_drawn: u32,
}

impl WindowApp for ClearAndPresent {
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
        let system = self.system.as_mut().expect("init ran before first tick");

        match system.acquire_frame().expect("acquire-frame failed") {
            AcquireOutcome::Ok => {}
            AcquireOutcome::SurfaceLost => return true,
            AcquireOutcome::BackendBusy => return true,
        }

        system
            .begin_render_pass(
                graphics_types::resources::VirtualDisplay::MAIN,
                RenderPassBeginArgs {
                    color_load: LoadOp::Clear,
                    color_store: StoreOp::Store,
                    color_clear: Rgba::from_u8(0, 12, 24, 255),
                    depth_load: LoadOp::DontCare,
                    depth_store: StoreOp::DontCare,
                    depth_clear: 1.0,
                },
            )
            .expect("begin-render-pass failed");
        system.end_render_pass().expect("end-render-pass failed");
        system.end_frame().expect("end-frame failed");

        self.frames_drawn += 1;
        log::info!(
            "frame-index={} renderer={}",
            system.frame_index(),
            system.get_renderer_type()
        );

        self.frames_drawn < 3
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
    let app = ClearAndPresent {
        args,
        gl_context: None,
        system: None,
        frames_drawn: 0,
    };
    WindowRunner::new("clear-and-present", 800, 600, app).run()
}
