//! lantern - demo application entry point.

mod app;
mod scene_setup;
mod systems;

use anyhow::Result;
use tracing::info;
use winit::event_loop::{ControlFlow, EventLoop};

use app::App;

fn main() -> Result<()> {
    lantern_core::init_logging();
    info!("Starting lantern");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
