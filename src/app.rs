use std::{path::PathBuf, sync::Arc};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::ViewerConfig, error::ViewerError, gfx::rendering::RenderEngine, viewer::ModelViewer,
};

/// Desktop host: one window, one canvas, one model at a time.
///
/// Events only trigger redraws when something visible changed, so the loop
/// sleeps between user interactions.
pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    viewer: ModelViewer,
    initial_model: Option<PathBuf>,
    dragging: bool,
    fatal: Option<ViewerError>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig, initial_model: Option<PathBuf>) -> Result<Self, ViewerError> {
        let event_loop = EventLoop::new().map_err(|e| ViewerError::Window(e.to_string()))?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                viewer: ModelViewer::new(config),
                initial_model,
                dragging: false,
                fatal: None,
            },
        })
    }

    /// Runs the event loop until the window closes
    pub fn run(mut self) -> Result<(), ViewerError> {
        let event_loop = self
            .event_loop
            .take()
            .ok_or_else(|| ViewerError::Window("event loop already consumed".to_string()))?;
        event_loop.set_control_flow(ControlFlow::Wait);

        event_loop
            .run_app(&mut self.app_state)
            .map_err(|e| ViewerError::Window(e.to_string()))?;

        match self.app_state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn load(&mut self, path: PathBuf) {
        // failures are logged by the viewer and leave the window usable
        if let Ok(summary) = self.viewer.load(&path) {
            if let Some(window) = &self.window {
                let name = summary
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                window.set_title(&format!("{} - {}", self.viewer.config().title, name));
            }
        }
        self.request_redraw();
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        log::error!("{}", err);
        self.fatal = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let config = self.viewer.config();
        let attributes = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, ViewerError::Window(e.to_string()));
                return;
            }
        };
        self.window = Some(window.clone());

        let (width, height) = window.inner_size().into();
        let engine = {
            let config = self.viewer.config().clone();
            pollster::block_on(async move { RenderEngine::new(window, width, height, &config).await })
        };

        match engine {
            Ok(engine) => self.render_engine = Some(engine),
            Err(err) => {
                self.fail(event_loop, err);
                return;
            }
        }
        self.viewer.resize(width, height);

        if let Some(path) = self.initial_model.take() {
            self.load(path);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.render_engine.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                self.viewer.resize(width, height);
                self.request_redraw();
            }
            WindowEvent::DroppedFile(path) => self.load(path),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self
                    .viewer
                    .mouse_move(position.x as f32, position.y as f32, self.dragging)
                {
                    self.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(render_engine) = self.render_engine.as_mut() else {
                    return;
                };
                match render_engine.render(self.viewer.frame()) {
                    Ok(true) => {}
                    Ok(false) => self.request_redraw(),
                    Err(err) => self.fail(event_loop, err),
                }
            }
            _ => (),
        }
    }
}
