use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use std::time::{Duration, Instant};
use tracing::{error, info};
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

use crate::driver::{DriverStatus, EvolutionDriver};
use crate::draw::{Canvas, Rgba};
use crate::evolution::EvolutionService;
use crate::generation::GenerationState;

const BACKGROUND: Rgba = (255, 255, 255, 255);
const INK: Rgba = (0, 0, 0, 255);
const SCORE_INK: Rgba = (230, 230, 230, 255);
const HINT_INK: Rgba = (200, 200, 200, 255);

/// Caps dt after stalls such as window drags. The spawn clock still gets the full stall.
const MAX_DT: f32 = 4.0;

/// Open a window and run the driver until every generation is evaluated or the window
/// is closed. `on_finish` runs once after the last generation.
pub fn run<S, F>(mut driver: EvolutionDriver<S>, mut on_finish: F) -> Result<()>
where
    S: EvolutionService + 'static,
    S::Controller: 'static,
    F: FnMut(&EvolutionDriver<S>) + 'static,
{
    let width = driver.config().screen.width;
    let height = driver.config().screen.height;
    let reference_fps = driver.config().screen.reference_fps;
    let frame_budget = Duration::from_secs_f32(1.0 / driver.config().screen.max_fps.max(1) as f32);

    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();

    let window = WindowBuilder::new()
        .with_title("Flappy Bird Neuroevolution")
        .with_inner_size(LogicalSize::new(width, height))
        .with_resizable(true)
        .build(&event_loop)
        .context("failed to create window")?;

    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(width, height, surface_texture).context("failed to create pixel surface")?
    };

    let mut started = false;
    let mut last_tick = Instant::now();
    let mut next_frame = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        if let Event::RedrawRequested(_) = event {
            let mut canvas = Canvas::new(pixels.frame_mut(), width, height);
            match driver.current() {
                Some(state) if started => draw_generation(&mut canvas, state),
                _ if started => canvas.clear(BACKGROUND),
                _ => draw_title(&mut canvas),
            }
            if let Err(err) = pixels.render() {
                error!(%err, "failed to render frame");
                *control_flow = ControlFlow::Exit;
                return;
            }
        }

        if input.update(&event) {
            if input.key_pressed(VirtualKeyCode::Escape) || input.close_requested() || input.destroyed() {
                info!("window closed, exiting");
                *control_flow = ControlFlow::Exit;
                return;
            }

            if let Some(size) = input.window_resized() {
                if let Err(err) = pixels.resize_surface(size.width, size.height) {
                    error!(%err, "failed to resize surface");
                    *control_flow = ControlFlow::Exit;
                    return;
                }
            }

            if !started {
                if input.key_pressed(VirtualKeyCode::Space) || input.mouse_pressed(0) {
                    started = true;
                    window.set_resizable(false);
                    last_tick = Instant::now();
                    next_frame = last_tick;
                    info!("simulation started");
                }
                window.request_redraw();
                *control_flow = ControlFlow::Wait;
                return;
            }

            let now = Instant::now();
            if now >= next_frame {
                let elapsed = (now - last_tick).as_secs_f32();
                let dt = (elapsed * reference_fps).min(MAX_DT);
                last_tick = now;
                if driver.tick_timed(dt, elapsed * 1000.0) == DriverStatus::Finished {
                    on_finish(&driver);
                    *control_flow = ControlFlow::Exit;
                    return;
                }
                next_frame = now + frame_budget;
                window.request_redraw();
            }
            *control_flow = ControlFlow::WaitUntil(next_frame);
        }
    });
}

pub fn draw_title(canvas: &mut Canvas) {
    let cx = canvas.width() as f32 / 2.0;
    let cy = canvas.height() as f32 / 2.0;
    canvas.clear(BACKGROUND);
    canvas.draw_text_centered("FLAPPY BIRD", cx, cy, 17, INK);
    canvas.draw_text_centered("Click or press space to start simulation", cx, cy + 200.0, 3, HINT_INK);
}

pub fn draw_generation<C>(canvas: &mut Canvas, state: &GenerationState<C>) {
    let cx = canvas.width() as f32 / 2.0;
    let cy = canvas.height() as f32 / 2.0;
    canvas.clear(BACKGROUND);
    canvas.draw_text_centered(&state.score().to_string(), cx, cy, 40, SCORE_INK);

    for pilot in state.pilots() {
        let bounds = pilot.agent.bounds();
        let [r, g, b] = pilot.agent.color;
        canvas.fill_ellipse(bounds.left(), bounds.top(), bounds.right(), bounds.bottom(), (r, g, b, 255));
    }

    let obstacles = state.obstacles();
    for obstacle in obstacles.top().iter().chain(obstacles.bottom()) {
        let bounds = obstacle.bounds();
        canvas.fill_rect(bounds.left(), bounds.top(), bounds.right(), bounds.bottom(), INK);
    }

    canvas.draw_text(&format!("Generation: {}", state.generation()), 16, 16, 3, INK);
    canvas.draw_text(&format!("Alive: {}", state.alive()), 16, 48, 3, INK);
}
