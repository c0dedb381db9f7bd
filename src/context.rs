//! GPU and window context.
//!
//! [`Context`] owns the wgpu device, queue and surface together with the
//! render targets and uniforms that live as long as the window does.

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{CameraResources, clamp_msaa_count},
    config::RenderConfig,
    data_structures::texture::Texture,
    light::{LightResources, LightsUniform},
    pipelines::standard::mk_standard_pipeline,
    resources::material::material_layout,
};

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub(crate) depth_texture: Texture,
    /// Multisampled colour target, `None` when rendering with one sample.
    pub(crate) msaa_target: Option<Texture>,
    sample_count: u32,
    requested_samples: u32,
    pub camera: CameraResources,
    pub light: LightResources,
    pub material_layout: wgpu::BindGroupLayout,
    pub(crate) standard_pipeline: wgpu::RenderPipeline,
    /// Bound in place of a missing albedo texture.
    pub(crate) white_texture: Texture,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, render: &RenderConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .context("Failed to create the GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The standard shader writes linear colour and relies on an sRGB target
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = CameraResources::new(&device);
        let light = LightResources::new(
            &device,
            LightsUniform::new(render.exposure, render.ambient),
        );
        let material_layout = material_layout(&device);

        let sample_count = 1;
        let standard_pipeline = mk_standard_pipeline(
            &device,
            config.format,
            sample_count,
            &material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );
        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );
        let white_texture = Texture::create_solid(&device, &queue, [255; 4], "white_texture");

        Ok(Self {
            window,
            surface,
            adapter,
            device,
            queue,
            config,
            depth_texture,
            msaa_target: None,
            sample_count,
            requested_samples: sample_count,
            camera,
            light,
            material_layout,
            standard_pipeline,
            white_texture,
            is_surface_configured: false,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn is_surface_configured(&self) -> bool {
        self.is_surface_configured
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.is_surface_configured = true;
        self.rebuild_targets();
    }

    /// Largest supported sample count not above `requested`.
    pub fn supported_sample_count(&self, requested: u32) -> u32 {
        let requested = clamp_msaa_count(requested);
        let flags = self
            .adapter
            .get_texture_format_features(self.config.format)
            .flags;
        if requested > 1 && !flags.sample_count_supported(requested) {
            log::warn!(
                "{requested}x MSAA is not supported for {:?}, rendering without it",
                self.config.format
            );
            return 1;
        }
        requested
    }

    /// Switch the sample count, rebuilding the pipeline and render targets.
    pub fn set_sample_count(&mut self, requested: u32) {
        if requested == self.requested_samples {
            return;
        }
        self.requested_samples = requested;
        let sample_count = self.supported_sample_count(requested);
        if sample_count == self.sample_count {
            return;
        }
        log::debug!("Switching to {sample_count}x MSAA");
        self.sample_count = sample_count;
        self.standard_pipeline = mk_standard_pipeline(
            &self.device,
            self.config.format,
            sample_count,
            &self.material_layout,
            &self.camera.bind_group_layout,
            &self.light.bind_group_layout,
        );
        self.rebuild_targets();
    }

    fn rebuild_targets(&mut self) {
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [self.config.width, self.config.height],
            self.sample_count,
            "depth_texture",
        );
        self.msaa_target = (self.sample_count > 1)
            .then(|| Texture::create_msaa_target(&self.device, &self.config, self.sample_count));
    }
}
