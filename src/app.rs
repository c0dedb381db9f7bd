//! Application bootstrap and event loop.
//!
//! [`run`] opens the window, creates the GPU [`Context`], hands an [`Engine`]
//! to the caller's setup function and then drives the frame loop:
//!
//! 1. Collect window/device events into [`VirtualInput`]
//! 2. Advance [`FrameTime`]
//! 3. Update every scene component
//! 4. Clear per-frame input state
//! 5. Upload camera, lights and instances, draw and present

use std::sync::Arc;

use anyhow::Context as _;
use futures::future::LocalBoxFuture;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorGrabMode, Fullscreen, Window, WindowId},
};

use crate::{
    config::AppConfig,
    context::Context,
    data_structures::scene_graph::Scene,
    input::VirtualInput,
    render::Renderer,
    resources::{AssetSource, Resources},
    time::FrameTime,
};

/// Everything scene setup code can reach.
#[derive(Debug)]
pub struct Engine {
    pub ctx: Context,
    pub scene: Scene,
    pub input: VirtualInput,
    pub resources: Resources,
    pub time: FrameTime,
    pub config: AppConfig,
    renderer: Renderer,
}

impl Engine {
    pub fn new(ctx: Context, config: AppConfig) -> Self {
        let resources = Resources::new(AssetSource::new(config.assets.root.clone()));
        let renderer = Renderer::new(&ctx.device);
        Self {
            ctx,
            scene: Scene::new(),
            input: VirtualInput::new(),
            resources,
            time: FrameTime::new(),
            config,
            renderer,
        }
    }

    /// Size of the primary window's drawable area in pixels.
    pub fn window_size(&self) -> (u32, u32) {
        (self.ctx.config.width, self.ctx.config.height)
    }

    pub fn window_aspect(&self) -> f32 {
        let (width, height) = self.window_size();
        width as f32 / height.max(1) as f32
    }

    pub fn hide_cursor(&self, hidden: bool) {
        self.ctx.window().set_cursor_visible(!hidden);
    }

    /// Keep the cursor inside the window. Not every platform supports every
    /// grab mode, so confinement falls back to locking.
    pub fn grab_cursor(&self, grab: bool) {
        let window = self.ctx.window();
        let result = if grab {
            window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = result {
            log::warn!("Could not change the cursor grab: {e}");
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
        if width > 0 && height > 0 {
            self.scene.set_window_aspect(width as f32 / height as f32);
        }
    }

    fn frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.time.tick();
        self.scene.update(&self.input, &self.time);
        self.input.end_frame();
        self.renderer
            .render(&mut self.ctx, &self.scene, &self.resources)
    }
}

/// Scene construction, run once the GPU context exists.
pub type SetupFn =
    Box<dyn for<'a> FnOnce(&'a mut Engine) -> LocalBoxFuture<'a, anyhow::Result<()>>>;

struct App {
    async_runtime: tokio::runtime::Runtime,
    config: AppConfig,
    setup: Option<SetupFn>,
    engine: Option<Engine>,
    /// Start-up failure reported from [`run`] once the loop exits.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig, setup: SetupFn) -> anyhow::Result<Self> {
        let async_runtime =
            tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
        Ok(Self {
            async_runtime,
            config,
            setup: Some(setup),
            engine: None,
            error: None,
        })
    }

    fn window_attributes(&self) -> winit::window::WindowAttributes {
        let window = &self.config.window;
        let mut attributes = Window::default_attributes()
            .with_title(window.title.clone())
            .with_inner_size(PhysicalSize::new(window.width, window.height));
        if window.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        attributes
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = Arc::new(
            event_loop
                .create_window(self.window_attributes())
                .context("Failed to create the window")?,
        );
        let setup = self.setup.take().context("Scene setup already ran")?;
        let config = self.config.clone();

        let init_future = async move {
            let ctx = Context::new(window, &config.render).await?;
            let mut engine = Engine::new(ctx, config);
            setup(&mut engine).await.context("Scene setup failed")?;
            Ok::<_, anyhow::Error>(engine)
        };
        let mut engine = self.async_runtime.block_on(init_future)?;

        if engine.config.window.grab_cursor {
            engine.grab_cursor(true);
        }
        let size = engine.ctx.window().inner_size();
        engine.resize(size.width, size.height);
        // Don't count set-up time as the first frame
        engine.time = FrameTime::new();
        engine.ctx.window().request_redraw();
        self.engine = Some(engine);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() || self.error.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            log::error!("{e:#}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let Some(engine) = &mut self.engine {
            engine.input.handle_device_event(&event);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let engine = match &mut self.engine {
            Some(engine) => engine,
            None => return,
        };

        engine.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => engine.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                match engine.frame() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = engine.ctx.window().inner_size();
                        engine.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => log::error!("Unable to render {e}"),
                }
                engine.ctx.window().request_redraw();
            }
            _ => {}
        }
    }
}

/// Open the window, run `setup` and drive the frame loop until the window
/// closes.
pub fn run<F>(config: AppConfig, setup: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(&'a mut Engine) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
{
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, Box::new(setup))?;
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
