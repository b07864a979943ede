use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window, WindowAttributes, WindowId},
};

use crate::config::ViewerConfig;
use crate::gfx::rendering::WgpuBackend;
use crate::gfx::scene::{build_scene, SceneAssets, SceneController};
use crate::input::{Key, MouseButton};

pub struct DioramaApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    scene: Option<SceneController>,
    cursor: PhysicalPosition<f64>,
    start: Instant,
    /// First fatal startup error, returned from [`DioramaApp::run`]
    failure: Option<anyhow::Error>,
}

impl DioramaApp {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;
        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                backend: None,
                scene: None,
                cursor: PhysicalPosition::new(0.0, 0.0),
                start: Instant::now(),
                failure: None,
            },
        })
    }

    /// Runs the event loop until the window closes or startup fails
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self.event_loop.take().context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_config = &self.config.window;
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(window_config.title.clone())
                    .with_inner_size(LogicalSize::new(window_config.width, window_config.height)),
            )?,
        );
        let (width, height) = window.inner_size().into();

        let window_clone = window.clone();
        let mut backend = pollster::block_on(async move { WgpuBackend::new(window_clone, width, height).await })?;

        let assets = SceneAssets::load(&self.config.assets)?;
        let mut scene = build_scene(&mut backend, &assets, &self.config.assets.shaders, window_config);
        scene.on_resize(width, height);

        info!("Viewer ready ({}x{})", width, height);
        self.window = Some(window);
        self.backend = Some(backend);
        self.scene = Some(scene);
        self.start = Instant::now();
        Ok(())
    }

    /// Hides and confines the cursor while mouse look is on
    ///
    /// Called after every input that can switch cameras or toggle the look.
    fn sync_cursor(&self) {
        let (Some(window), Some(scene)) = (self.window.as_ref(), self.scene.as_ref()) else {
            return;
        };
        let looking = scene.is_mouse_looking();
        let grab = if looking {
            window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            warn!("Cursor grab unavailable: {}", e);
        }
        window.set_cursor_visible(!looking);
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.initialize(event_loop) {
            error!("Startup failed: {:#}", e);
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let (Some(backend), Some(scene)) = (self.backend.as_mut(), self.scene.as_mut()) else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => {
                let Some(key) = Key::from_key_code(key_code) else {
                    return;
                };
                if key == Key::Escape {
                    event_loop.exit();
                    return;
                }
                scene.on_key(backend, key, state == ElementState::Pressed);
                self.sync_cursor();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = MouseButton::from_winit(button) {
                    scene.on_mouse_button(button, state == ElementState::Pressed, (self.cursor.x, self.cursor.y));
                    self.sync_cursor();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                backend.resize(width, height);
                scene.on_resize(width, height);
            }
            WindowEvent::Focused(false) => {
                scene.release_keys();
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let elapsed = self.start.elapsed().as_secs_f32();
                scene.frame(backend, elapsed);
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            scene.on_mouse_motion(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
