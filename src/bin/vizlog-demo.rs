//! Headless demo: a few producer threads feed image and plot windows while
//! the main thread plays the frame owner at a fixed tick. Useful for
//! eyeballing the task/registry traffic with RUST_LOG=debug.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use vizlog::model::window::{ImageBuffer, WindowProps};
use vizlog::toolkit::HeadlessToolkit;
use vizlog::{Overlay, Toolkit, Vec2};

const FRAMES: usize = 120;
const FRAME_TIME: Duration = Duration::from_millis(16);

fn main() -> Result<()> {
    vizlog::common::log::init();

    let mut overlay = Overlay::new();
    overlay.initialize(None);
    let handle = overlay.handle();

    handle.set_window_properties("Camera", WindowProps {
        category: Some("Sensors".to_owned()),
        help_text: Some("Synthetic camera frames".to_owned()),
        preferred_size: Some(Vec2::new(480.0, 360.0)),
    });

    let camera = {
        let handle = handle.clone();
        thread::spawn(move || {
            for frame in 0..FRAMES as u32 {
                let mut data = vec![0u8; 64 * 64];
                for (i, px) in data.iter_mut().enumerate() {
                    *px = ((i as u32 + frame * 7) % 255) as u8;
                }
                handle.update_image(
                    "Camera",
                    Arc::new(ImageBuffer { width: 64, height: 64, data }),
                );
                thread::sleep(FRAME_TIME);
            }
        })
    };

    let timings = {
        let handle = handle.clone();
        thread::spawn(move || {
            for i in 0..FRAMES {
                let x = i as f64;
                let render_ms = 16.0 + (x / 9.0).sin() * 3.0;
                let upload_ms = 4.0 + (x / 5.0).cos();
                handle.add_plot_sample("Timings", "render", x, render_ms, Some("#2aa198ff"));
                handle.add_plot_sample("Timings", "upload", x, upload_ms, None);
                thread::sleep(FRAME_TIME);
            }
        })
    };

    overlay.find_or_create_custom(
        "Status",
        Box::new(|ui: &mut dyn Toolkit| {
            ui.button("ok");
        }),
    );

    let mut ui = HeadlessToolkit::new(Vec2::new(1280.0, 720.0));
    for frame in 0..FRAMES {
        if frame == 30 {
            ui.press("Auto-Tile");
        }
        overlay.render(&mut ui);
        ui.calls.clear();
        if let Some(settings) = overlay.save_settings() {
            tracing::debug!(bytes = settings.len(), "settings would be rewritten");
        }
        thread::sleep(FRAME_TIME);
    }

    camera.join().expect("camera producer panicked");
    timings.join().expect("plot producer panicked");

    tracing::info!(windows = overlay.registry().len(), "demo finished");
    Ok(())
}
