//! Tutorial entry point for spec.md §8 scenario S3 ("Two virtual displays"):
//! an opaque red display at `z=0` composited under an alpha-blended blue
//! display at `z=1` and opacity 0.5, both fit-scaled onto a 640x480 main
//! surface.

use std::sync::Arc;

use clap::Parser;
use cli::DemoArgs;
use graphics::{
    AcquireOutcome, InitOptions, RenderPassBeginArgs, System, VirtualDisplayConfig, VirtualDisplayCreate,
};
use graphics_types::resources::{BlendMode, ScalingMode};
use graphics_types::rendering::{LoadOp, StoreOp};
use math::Rgba;
use timer::Timer;
use window::event_loop::WindowApp;
use window::gl_context::GlutinGlContext;
use window::{InputState, WindowRunner, WinitSurfaceProvider};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

struct VirtualDisplays {
    args: DemoArgs,
    gl_context: Option<Arc<GlutinGlContext>>,
    system: Option<System>,
    back_display: Option<i64>,
    front_display: Option<i64>,
    frames_drawn: u32,
}

impl WindowApp for VirtualDisplays {
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
        let mut system = System::init(options).expect("System::init failed");

        let back = system
            .create_virtual_display(VirtualDisplayCreate {
                width: 640,
                height: 480,
                z: 0,
                scaling: ScalingMode::Fit,
                blend: BlendMode::Opaque,
                opacity: 1.0,
            })
            .expect("create-virtual-display(back) failed");
        let front = system
            .create_virtual_display(VirtualDisplayCreate {
                width: 640,
                height: 480,
                z: 1,
                scaling: ScalingMode::Fit,
                blend: BlendMode::Alpha,
                opacity: 0.5,
            })
            .expect("create-virtual-display(front) failed");
        system
            .configure_virtual_display(
                front,
                VirtualDisplayConfig {
                    blend: BlendMode::Alpha,
                    opacity: 0.5,
                    z: 1,
                    ..VirtualDisplayConfig::default()
                },
            )
            .expect("configure-virtual-display(front) failed");

        self.back_display = Some(back);
        self.front_display = Some(front);
        self.system = Some(system);
        log::info!("initialized {:?} backend", self.args.backend);
    }

    fn on_tick(&mut self, _input: &InputState) -> bool {
        let system = self.system.as_mut().expect("init ran before first tick");
        let back = self.back_display.expect("init ran before first tick");
        let front = self.front_display.expect("init ran before first tick");

        match system.acquire_frame().expect("acquire-frame failed") {
            AcquireOutcome::Ok => {}
            AcquireOutcome::SurfaceLost => return true,
            AcquireOutcome::BackendBusy => return true,
        }

        system
            .begin_render_pass(
                back,
                RenderPassBeginArgs {
                    color_load: LoadOp::Clear,
                    color_store: StoreOp::Store,
                    color_clear: Rgba::from_u8(255, 0, 0, 255),
                    depth_load: LoadOp::DontCare,
                    depth_store: StoreOp::DontCare,
                    depth_clear: 1.0,
                },
            )
            .expect("begin-render-pass(back) failed");
        system.end_render_pass().expect("end-render-pass(back) failed");

        system
            .begin_render_pass(
                front,
                RenderPassBeginArgs {
                    color_load: LoadOp::Clear,
                    color_store: StoreOp::Store,
                    color_clear: Rgba::from_u8(0, 0, 255, 255),
                    depth_load: LoadOp::DontCare,
                    depth_store: StoreOp::DontCare,
                    depth_clear: 1.0,
                },
            )
            .expect("begin-render-pass(front) failed");
        system.end_render_pass().expect("end-render-pass(front) failed");

        // The main surface itself stays untouched by a draw this frame; the
        // terminal composite pass `end-frame` always appends (spec.md §4.F)
        // blits both displays onto it back-to-front.
        system.end_frame().expect("end-frame failed");

        self.frames_drawn += 1;
        log::info!(
            "frame-index={} composite(back)={:.3}ms composite(front)={:.3}ms",
            system.frame_index(),
            system.last_composite_time_ms(back).unwrap_or(0.0),
            system.last_composite_time_ms(front).unwrap_or(0.0),
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
    let app = VirtualDisplays {
        args,
        gl_context: None,
        system: None,
        back_display: None,
        front_display: None,
        frames_drawn: 0,
    };
    WindowRunner::new("virtual-displays", 640, 480, app).run()
}
