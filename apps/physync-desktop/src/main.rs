use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use physync_input::PointerState;
use physync_render_wgpu::{DrawStats, WgpuRenderer};
use physync_scene::SceneConfig;
use physync_sync::SceneContext;
use physync_tools::FrameInspector;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Zoom factor per wheel line.
const ZOOM_STEP: f32 = 0.9;

#[derive(Parser)]
#[command(name = "physync-desktop", about = "physync desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene file (.yaml, .yml, or .json); the demo scene if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Application state.
struct AppState {
    config: SceneConfig,
    ctx: SceneContext,
    pointer: PointerState,
    show_hud: bool,
    paused: bool,
    mouse_captured: bool,
    last_draw: DrawStats,
    last_error: Option<String>,
}

impl AppState {
    fn new(config: SceneConfig) -> Result<Self> {
        let ctx = config.build().context("building scene")?;
        Ok(Self {
            config,
            ctx,
            pointer: PointerState::default(),
            show_hud: true,
            paused: false,
            mouse_captured: false,
            last_draw: DrawStats::default(),
            last_error: None,
        })
    }

    /// Rebuild the scene from its config, keeping the camera where the user
    /// left it.
    fn reset(&mut self) {
        match self.config.build() {
            Ok(mut ctx) => {
                ctx.camera = self.ctx.camera;
                self.ctx = ctx;
                self.last_error = None;
                tracing::info!("scene reset");
            }
            Err(e) => {
                tracing::error!("failed to rebuild scene: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }
        match key {
            KeyCode::F1 => self.show_hud = !self.show_hud,
            KeyCode::Space => self.paused = !self.paused,
            KeyCode::KeyR => self.reset(),
            _ => {}
        }
    }

    fn pointer_moved(&mut self, client: Vec2, viewport: Vec2) {
        self.pointer.update(client, viewport);
        if let Some(angle) = self.ctx.pointer_moved(self.pointer.position) {
            tracing::trace!(angle, "tilt");
        }
    }

    fn draw_ui(&mut self, ui_ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        let summary = FrameInspector::summary(&self.ctx);

        egui::SidePanel::left("hud")
            .default_width(300.0)
            .show(ui_ctx, |ui| {
                ui.heading("physync");
                ui.separator();
                ui.label(format!("Tick: {}  t={:.2}s", summary.tick, summary.elapsed));
                ui.label(format!(
                    "Bodies: {}  Objects: {}  Pairs: {}",
                    summary.body_count, summary.object_count, summary.pair_count
                ));
                ui.label(format!(
                    "Contacts: {}  Iterations: {}",
                    summary.contacts, summary.solver_iterations
                ));
                ui.label(format!(
                    "Drawn: {} instances in {} batches",
                    self.last_draw.instances, self.last_draw.batches
                ));
                if self.pointer.seen {
                    ui.label(format!(
                        "Pointer: ({:.2}, {:.2})  tilt {:.1} deg",
                        self.pointer.position.x,
                        self.pointer.position.y,
                        summary.tilt.to_degrees()
                    ));
                }
                let eye = self.ctx.camera.eye;
                ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", eye.x, eye.y, eye.z));
                ui.separator();

                ui.horizontal(|ui| {
                    let label = if self.paused { "Resume (Space)" } else { "Pause (Space)" };
                    if ui.button(label).clicked() {
                        self.paused = !self.paused;
                    }
                    if ui.button("Reset (R)").clicked() {
                        self.reset();
                    }
                });

                if let Some(err) = &self.last_error {
                    ui.colored_label(egui::Color32::RED, err);
                }

                ui.separator();
                ui.heading("Pairs");
                for pair in FrameInspector::pairs(&self.ctx) {
                    let marker = if pair.in_sync { "" } else { " (out of sync)" };
                    ui.label(format!(
                        "{}{}: y={:.2} speed={:.2}",
                        pair.name, marker, pair.position.y, pair.speed
                    ));
                }

                ui.separator();
                ui.small("F1: HUD | RMB drag: orbit | Wheel: zoom | Space: pause | R: reset");
            });
    }
}

/// Window and GPU resources, created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("physync")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("physync_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn viewport(&self) -> Vec2 {
        Vec2::new(self.config.width as f32, self.config.height as f32)
    }

    /// Run one frame: a single synchronizer step and draw (or just a draw
    /// while paused), then the HUD on top.
    fn redraw(&mut self, state: &mut AppState, egui_ctx: &EguiContext) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let frame = self.renderer.frame(&self.device, &self.queue, &view);
        let drawn = if state.paused {
            Some(state.ctx.draw(&frame))
        } else {
            match state.ctx.frame(&frame) {
                Ok(stats) => Some(stats),
                Err(e) => {
                    tracing::error!(tick = state.ctx.tick(), "frame failed: {e}");
                    state.last_error = Some(e.to_string());
                    None
                }
            }
        };
        if let Some(stats) = drawn {
            state.last_draw = stats;
        }

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ui_ctx| {
            state.draw_ui(ui_ctx);
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        // A failed frame drew nothing, so the HUD clears the target itself.
        let load = if drawn.is_some() {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        };
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => {
                self.state.ctx.camera.set_aspect(gpu.config.width, gpu.config.height);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
                self.state
                    .ctx
                    .camera
                    .set_aspect(gpu.config.width, gpu.config.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let client = Vec2::new(position.x as f32, position.y as f32);
                self.state.pointer_moved(client, gpu.viewport());
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                self.state.ctx.camera.zoom(ZOOM_STEP.powf(lines));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.state.mouse_captured = btn_state == ElementState::Pressed;
                gpu.window.set_cursor_visible(!self.state.mouse_captured);
            }
            WindowEvent::RedrawRequested => {
                gpu.redraw(&mut self.state, &self.egui_ctx);
                gpu.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.mouse_captured {
                self.state
                    .ctx
                    .camera
                    .orbit(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("physync-desktop starting");

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene {}", path.display()))?,
        None => SceneConfig::default(),
    };
    let state = AppState::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
