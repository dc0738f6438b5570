//! Application driver: window lifecycle and the frame loop.

use std::path::Path;

use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

use lantern_core::Timer;
use lantern_platform::Window;
use lantern_renderer::{GlobalUbo, Renderer};

use crate::scene_setup::{Scene, load_scene};
use crate::systems::{MeshRenderSystem, PointLightSystem};

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;
const SHADER_DIR: &str = "shaders";

struct Systems {
    mesh: MeshRenderSystem,
    point_light: PointLightSystem,
}

pub struct App {
    // Declaration order is destruction order: GPU resources (scene,
    // systems) go before the renderer that owns the device
    window: Option<Window>,
    scene: Option<Scene>,
    systems: Option<Systems>,
    renderer: Option<Renderer>,
    timer: Timer,
}

impl App {
    pub fn new() -> Self {
        Self {
            window: None,
            scene: None,
            systems: None,
            renderer: None,
            timer: Timer::new(),
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = Window::new(event_loop, WINDOW_WIDTH, WINDOW_HEIGHT, "lantern")?;
        let renderer = Renderer::new(&window)?;

        let scene = load_scene(&renderer)?;

        let shader_dir = Path::new(SHADER_DIR);
        let systems = Systems {
            mesh: MeshRenderSystem::new(&renderer, shader_dir)?,
            point_light: PointLightSystem::new(&renderer, shader_dir)?,
        };

        self.window = Some(window);
        self.scene = Some(scene);
        self.systems = Some(systems);
        self.renderer = Some(renderer);

        info!("Initialization complete, entering main loop");
        Ok(())
    }

    fn render_frame(&mut self) {
        let (Some(renderer), Some(scene), Some(systems)) =
            (&mut self.renderer, &mut self.scene, &self.systems)
        else {
            return;
        };

        let frame_time = self.timer.delta_secs();

        scene.camera.set_perspective_projection(
            50f32.to_radians(),
            renderer.aspect_ratio(),
            0.1,
            100.0,
        );

        let mut ubo = GlobalUbo::from_camera(&scene.camera);
        systems
            .point_light
            .update(&mut scene.world, frame_time, &mut ubo);

        let world = &scene.world;
        let arena = &scene.arena;

        let result = renderer.run_frame(
            frame_time,
            |_frame_index| ubo,
            |context| {
                // Order matters: light billboards blend against the
                // opaque geometry
                systems.mesh.render(context, world, arena);
                systems.point_light.render(context, world);
            },
        );

        if let Err(e) = result {
            error!("Render error: {:?}", e);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.initialize(event_loop) {
                error!("Failed to initialize: {:?}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                // Drain the GPU before scene resources start dropping
                if let Some(renderer) = &self.renderer {
                    let _ = renderer.wait_idle();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = &mut self.window {
                    window.resize(size.width, size.height);
                }
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Scene and systems drop before the renderer (declaration order);
        // the GPU must be done with them first
        if let Some(renderer) = &self.renderer {
            let _ = renderer.wait_idle();
        }
    }
}
