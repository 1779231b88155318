use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::AppConfig,
    context::AppContext,
    error::{Error, Result},
    frame::{FrameLoop, FrameStep, StopSignal},
    gfx::rendering::RenderEngine,
    ui::{debug_panel, FrameInfo, UiManager},
};

/// Weight of the newest frame in the displayed frame rate
const FPS_SMOOTHING: f32 = 0.1;

/// The windowed haunted house
pub struct HauntedApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    config: AppConfig,
    context: AppContext,
    frames: FrameLoop,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    fps: f32,
    error: Option<Error>,
}

impl HauntedApp {
    /// Builds the scene and the event loop; the window opens in [`run`](Self::run)
    pub fn new(config: AppConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;
        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        let context = AppContext::new(&config, aspect)?;

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                context,
                frames: FrameLoop::new(),
                window: None,
                render_engine: None,
                ui_manager: None,
                fps: 0.0,
                error: None,
            },
        })
    }

    /// Stops the app after the current frame
    pub fn stop_signal(&self) -> StopSignal {
        self.app_state.frames.stop_signal()
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.app_state.context
    }

    /// Runs until the window closes or a stop is requested
    ///
    /// A start-up failure inside the event loop ends the loop and is returned
    /// here.
    pub fn run(self) -> Result<()> {
        let Self {
            event_loop,
            mut app_state,
        } = self;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut app_state)?;

        match app_state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_config = &self.config.window;
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(window_config.title.clone())
                    .with_inner_size(LogicalSize::new(window_config.width, window_config.height)),
            )?,
        );

        let (width, height) = window.inner_size().into();
        let mut renderer = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            window_config.vsync,
        ))?;
        renderer.prepare_scene(&mut self.context.scene)?;

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);
        self.context
            .scene
            .camera_manager
            .camera
            .resize_projection(width, height);

        log::info!("Window opened at {width}x{height}");
        self.window = Some(window);
        self.render_engine = Some(renderer);
        self.ui_manager = Some(ui_manager);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state == ElementState::Pressed
            && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
        {
            log::info!("Escape pressed, stopping");
            self.frames.stop_signal().request_stop();
            return;
        }
        self.context.scene.camera_manager.process_keyboard_event(event);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(step) = self.frames.step(&mut self.context) else {
            log::info!("Stopped after {} frames", self.frames.frame());
            event_loop.exit();
            return;
        };
        let info = self.frame_info(step);

        let (Some(window), Some(render_engine), Some(ui_manager)) = (
            self.window.as_ref(),
            self.render_engine.as_mut(),
            self.ui_manager.as_mut(),
        ) else {
            return;
        };

        let context = &mut self.context;
        ui_manager.update_logic(window, |ui| {
            debug_panel(ui, &mut context.scene, info);
            context.simulations.render_ui(ui, &mut context.scene);
        });

        render_engine.update(&mut context.scene);
        render_engine.render_frame(
            &context.scene,
            Some(|device: &wgpu::Device,
                  queue: &wgpu::Queue,
                  encoder: &mut wgpu::CommandEncoder,
                  view: &wgpu::TextureView| {
                ui_manager.render_display_only(device, queue, encoder, view);
            }),
        );
    }

    fn frame_info(&mut self, step: FrameStep) -> FrameInfo {
        if step.delta_time > 0.0 {
            let instant = 1.0 / step.delta_time;
            self.fps = if self.fps == 0.0 {
                instant
            } else {
                self.fps + (instant - self.fps) * FPS_SMOOTHING
            };
        }
        FrameInfo {
            fps: self.fps,
            frame: step.frame,
            simulation_steps: step.simulation_steps,
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(error) = self.start(event_loop) {
            self.fail(event_loop, error);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI gets input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.context
                    .scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                log::info!("Window closed");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // Dragging a UI slider must not orbit the camera
        if self.ui_manager.as_ref().is_some_and(UiManager::wants_mouse) {
            return;
        }

        self.context
            .scene
            .camera_manager
            .process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
