//! Frame driver and application event loop.
//!
//! An application describes its scene by implementing [`SceneFlow`] and hands
//! it to [`run`], which owns the window, the wgpu surface and the
//! [`WgpuDevice`].
//!
//! # Lifecycle
//!
//! 1. On the first `resumed` event the window and GPU are set up and
//!    [`SceneFlow::build`] links programs and returns the scene tree
//! 2. Window events are forwarded to [`SceneFlow::on_window_event`]
//! 3. Every redraw calls [`SceneFlow::update`], builds a fresh
//!    [`RenderContext`], renders the tree once, submits and presents

use std::{future::Future, rc::Rc, sync::Arc};

use anyhow::Context as _;
use cgmath::Matrix4;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::RenderContext,
    data_structures::scene_graph::SceneNode,
    device::{
        GraphicsDevice, ProgramRegistry, ProgramSource, ShaderProgram,
        gpu::{WgpuDevice, texture::DepthTexture},
    },
    math,
    render::render,
};

/// Window and camera settings of [`run`].
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: wgpu::Color,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "flow-scene".to_string(),
            width: 800,
            height: 600,
            clear_color: wgpu::Color {
                r: 0.9,
                g: 0.9,
                b: 0.9,
                a: 1.0,
            },
            fov: 30.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

impl AppConfig {
    pub fn projection(&self, width: u32, height: u32) -> Matrix4<f32> {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        math::perspective(self.fov, aspect, self.near, self.far)
    }
}

/// What [`SceneFlow::build`] gets to set the scene up with.
pub struct FlowContext<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub programs: &'a mut ProgramRegistry,
    runtime: &'a tokio::runtime::Runtime,
}

impl FlowContext<'_> {
    /// Link `source` and register it under its label.
    pub fn link(&mut self, source: &ProgramSource) -> anyhow::Result<Rc<ShaderProgram>> {
        self.programs.link(&mut *self.device, source)
    }

    /// Wait for an asset loader from [`crate::resources`].
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// A scene driven by [`run`].
pub trait SceneFlow {
    /// Called once after the GPU is ready.
    fn build(&mut self, ctx: &mut FlowContext<'_>) -> anyhow::Result<Box<dyn SceneNode>>;

    /// Per-frame animation, called before the tree is rendered.
    fn update(&mut self, _root: &mut dyn SceneNode, _elapsed: Duration) {}

    /// The view matrix of the frame.
    fn view(&self, elapsed: Duration) -> Matrix4<f32>;

    fn on_window_event(&mut self, _event: &WindowEvent) {}
}

struct GpuState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    device: WgpuDevice,
    depth_texture: DepthTexture,
    is_surface_configured: bool,
}

impl GpuState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::debug!("wgpu setup");
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create a surface for the window")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flow-scene device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                ..Default::default()
            })
            .await
            .context("failed to create the GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface supports no texture format")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let depth_texture =
            DepthTexture::new(&device, [config.width, config.height], "depth_texture");
        let device = WgpuDevice::new(device, queue, surface_format);

        Ok(Self {
            window,
            surface,
            config,
            device,
            depth_texture,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(self.device.device(), &self.config);
            self.depth_texture =
                DepthTexture::new(self.device.device(), [width, height], "depth_texture");
            self.is_surface_configured = true;
        }
    }

    fn render(
        &mut self,
        root: &mut dyn SceneNode,
        flow: &mut dyn SceneFlow,
        app: &AppConfig,
        elapsed: Duration,
    ) -> Result<(), wgpu::CurrentSurfaceTexture> {
        self.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = match self.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            other => return Err(other),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        flow.update(root, elapsed);
        {
            let projection = app.projection(self.config.width, self.config.height);
            let mut ctx =
                RenderContext::new(&mut self.device, projection, flow.view(elapsed)).with_time(elapsed);
            render(root, &mut ctx);
        }
        self.device
            .submit(&view, &self.depth_texture.view, app.clear_color);

        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

struct App<F: SceneFlow> {
    async_runtime: tokio::runtime::Runtime,
    config: AppConfig,
    flow: F,
    programs: ProgramRegistry,
    state: Option<GpuState>,
    root: Option<Box<dyn SceneNode>>,
    start: Instant,
    error: Option<anyhow::Error>,
}

impl<F: SceneFlow> App<F> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl<F: SceneFlow> ApplicationHandler for App<F> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let mut state = match self.async_runtime.block_on(GpuState::new(window)) {
            Ok(state) => state,
            Err(e) => return self.fail(event_loop, e),
        };

        let mut ctx = FlowContext {
            device: &mut state.device,
            programs: &mut self.programs,
            runtime: &self.async_runtime,
        };
        let root = self.flow.build(&mut ctx).context("building the scene failed");
        match root {
            Ok(root) => {
                log::debug!("scene built with {} programs", self.programs.len());
                self.root = Some(root);
                self.start = Instant::now();
                let size = state.window.inner_size();
                state.resize(size.width, size.height);
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(state), Some(root)) = (&mut self.state, &mut self.root) else {
            return;
        };

        self.flow.on_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let elapsed = self.start.elapsed();
                match state.render(root.as_mut(), &mut self.flow, &self.config, elapsed) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                        let size = state.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => log::error!("unable to render {e:?}"),
                }
            }
            _ => {}
        }
    }
}

/// Open a window and drive `flow` until the window is closed.
///
/// Initialises `env_logger` (see `RUST_LOG`) and returns the error that made
/// scene setup fail, if any.
pub fn run<F: SceneFlow>(config: AppConfig, flow: F) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App {
        async_runtime: tokio::runtime::Runtime::new()?,
        config,
        flow,
        programs: ProgramRegistry::new(),
        state: None,
        root: None,
        start: Instant::now(),
        error: None,
    };

    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
