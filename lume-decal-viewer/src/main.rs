mod gbuffer;
mod input;
mod renderer;
mod scene;
mod shading;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use log::{error, info, warn};
use lume_core::{Backend, Instance, InstanceDescriptor};
use lume_decal::{FlyCamera, ViewerConfig};
use lume_vulkan::{VulkanDevice, VulkanInstance};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowId};

use crate::input::InputState;
use crate::renderer::Renderer;
use crate::scene::Scene;

struct App {
    config: ViewerConfig,
    scene: Scene,
    camera: FlyCamera,
    input: InputState,
    last_frame: Instant,
    cursor_captured: bool,
    title_state: (usize, u32, u32),
    // Drop order: renderer (and its surface) before the window and the instance.
    renderer: Option<Renderer<VulkanDevice>>,
    window: Option<Arc<Window>>,
    instance: Option<VulkanInstance>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewerConfig, scene: Scene) -> Self {
        Self {
            camera: FlyCamera::new(&config.decals.camera),
            config,
            scene,
            input: InputState::default(),
            last_frame: Instant::now(),
            cursor_captured: false,
            title_state: (usize::MAX, 0, 0),
            renderer: None,
            window: None,
            instance: None,
            error: None,
        }
    }

    fn init_gpu(&mut self, window: &Arc<Window>) -> Result<()> {
        let instance = VulkanInstance::new(
            InstanceDescriptor { name: &self.config.title, backend: Backend::Vulkan, validation: self.config.validation },
            window,
        )?;
        let surface = instance.create_surface(window, window)?;
        let device = instance.request_device(Some(&surface))?;

        self.renderer = Some(Renderer::new(&device, surface, &self.config, &self.scene)?);
        self.instance = Some(instance);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    fn set_cursor_captured(&mut self, captured: bool) {
        let Some(window) = &self.window else { return };
        let mode = if captured { CursorGrabMode::Confined } else { CursorGrabMode::None };
        let grabbed = window.set_cursor_grab(mode).or_else(|_| {
            if captured { window.set_cursor_grab(CursorGrabMode::Locked) } else { Ok(()) }
        });
        if let Err(e) = grabbed {
            warn!("Cursor grab unavailable: {}", e);
        }
        window.set_cursor_visible(!captured);
        self.cursor_captured = captured;
    }

    fn toggle_fullscreen(&self) {
        if let Some(window) = &self.window {
            let next = if window.fullscreen().is_some() { None } else { Some(Fullscreen::Borderless(None)) };
            window.set_fullscreen(next);
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode, state: ElementState, repeat: bool) {
        match (code, state) {
            (KeyCode::Escape, ElementState::Pressed) => event_loop.exit(),
            (KeyCode::F1, ElementState::Pressed) if !repeat => self.toggle_fullscreen(),
            _ => self.input.on_key(code, state),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer)) = (&self.window, &mut self.renderer) else { return };

        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        let input = self.input.take_frame(dt);
        self.camera.update(&input.camera, dt);

        let size = window.inner_size();
        if let Err(e) = renderer.render(&input, &self.camera, size.width, size.height) {
            self.fail(event_loop, e.into());
            return;
        }

        let orchestrator = renderer.orchestrator();
        let settings = orchestrator.settings();
        let state = (orchestrator.store().active_count(), settings.kind, settings.id);
        if state != self.title_state {
            window.set_title(&format!("{} - {} decals - kind {} decal {}", self.config.title, state.0, state.1, state.2));
            self.title_state = state;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.window = Some(window.clone());

        if let Err(e) = self.init_gpu(&window) {
            return self.fail(event_loop, e);
        }
        info!("Right click captures the mouse, left click places a decal");
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.request_resize();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.on_key(event_loop, code, event.state, event.repeat);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Right && state == ElementState::Pressed {
                    self.set_cursor_captured(!self.cursor_captured);
                } else {
                    self.input.on_mouse_button(button, state);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.input.on_scroll(delta),
            WindowEvent::Focused(false) => {
                self.input.release_all();
                if self.cursor_captured {
                    self.set_cursor_captured(false);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.cursor_captured {
                self.input.on_mouse_motion(delta.0, delta.1);
            }
        }
    }

    fn about_to_wait(&mut self, _: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = ViewerConfig::resolve(std::env::args_os().nth(1).map(PathBuf::from))?;
    let scene = match &config.scene {
        Some(path) => Scene::load_obj(path)?,
        None => Scene::room(),
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, scene);
    event_loop.run_app(&mut app)?;

    // Tear the GPU side down before reporting.
    app.renderer = None;
    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
