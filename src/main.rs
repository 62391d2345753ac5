// main.rs — window, event loop, input routing and overlay UI

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod camera;
mod config;
mod device;
mod error;
mod fullscreen;
mod hotspot;
mod mesh;
mod renderer;
mod spherical;
mod viewer;

use config::{HotspotAnnotation, Tour, ViewerConfig};
use device::inconclusive_probe;
use error::ViewerError;
use fullscreen::FullscreenManager;
use hotspot::{hovered_index, MarkerState};
use renderer::Renderer;
use viewer::{Viewer, ViewerState};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{CursorIcon, WindowBuilder},
};

use image::io::Reader as ImageReader;
use image::{GenericImageView, RgbaImage};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// A decode that finished on the worker thread. Hotspots travel with the
/// image so overlapping loads can never mix annotations across panoramas.
struct LoadedPanorama {
    image: RgbaImage,
    hotspots: Vec<HotspotAnnotation>,
}

/// Worker-thread result, quoting the mount generation it was started for.
/// The viewer rejects results whose generation is no longer current, so a
/// slow decode overtaken by a newer open cannot land on the wrong mount.
struct LoadOutcome {
    generation: u64,
    result: Result<LoadedPanorama, ViewerError>,
}

fn main() {
    env_logger::init();

    // A tour parsed up front sizes the window; everything else loads once
    // the renderer exists.
    let initial = resolve_source_from_args().map(|p| (Tour::load(&p), p));
    let config = match &initial {
        Some((Ok(tour), _)) => tour.config,
        _ => ViewerConfig::default(),
    };

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Panorama Tour")
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .build(&event_loop)
            .unwrap(),
    );
    window.set_cursor_icon(CursorIcon::Grab);

    let mut renderer = pollster::block_on(Renderer::new(window.clone()));
    let mut viewer = Viewer::new(config, inconclusive_probe());
    let mut fullscreen = FullscreenManager::new();

    let (tx, rx): (Sender<LoadOutcome>, Receiver<LoadOutcome>) = channel();

    match initial {
        Some((Ok(tour), _)) => {
            let generation = viewer.begin_loading(tour.config);
            start_load(tour, generation, tx.clone());
        }
        Some((Err(e), path)) => {
            log::error!("cannot open {path:?}: {e}");
            let generation = viewer.generation();
            viewer.texture_failed(generation, &e);
        }
        None => {}
    }

    // mouse drag state
    let mut last_mouse_pos: Option<PhysicalPosition<f64>> = None;
    let mut cursor_pos: Option<PhysicalPosition<f64>> = None;

    // touch gesture state
    let mut touches: BTreeMap<u64, PhysicalPosition<f64>> = BTreeMap::new();
    let mut last_touch_pos: Option<PhysicalPosition<f64>> = None;
    let mut pinch_baseline: Option<(f32, [f32; 2])> = None;

    // frame timing
    let mut last_frame = Instant::now();
    let mut fps_window_start = Instant::now();
    let mut frame_count = 0u32;
    let mut fps = 0.0f32;
    let mut show_fps = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Ok(outcome) = rx.try_recv() {
            match outcome.result {
                Ok(loaded) => {
                    if viewer.texture_ready(outcome.generation, &loaded.hotspots) {
                        renderer.load_panorama(loaded.image);
                        log::info!("panorama ready, {} hotspot(s)", viewer.markers.len());
                    } else {
                        log::info!("discarding decode result for a superseded load");
                    }
                }
                Err(e) => {
                    if viewer.texture_failed(outcome.generation, &e) {
                        log::error!("{e}");
                    } else {
                        log::info!("superseded load failed late: {e}");
                    }
                }
            }
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        viewer.shutdown();
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        viewer.handle_resize();
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = rfd::FileDialog::new()
                                        .add_filter("Panoramas", &["jpg", "jpeg", "png", "bmp"])
                                        .add_filter("Tour files", &["json"])
                                        .pick_file()
                                    {
                                        begin_tour_load(&path, &mut viewer, &mut renderer, &tx);
                                    }
                                }
                                Some(VirtualKeyCode::F11) => {
                                    window.set_fullscreen(fullscreen.toggle());
                                }
                                Some(VirtualKeyCode::R) => {
                                    viewer.camera.reset();
                                }
                                Some(VirtualKeyCode::F) => {
                                    show_fps = !show_fps;
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            if state == ElementState::Pressed {
                                viewer.start_drag();
                                window.set_cursor_icon(CursorIcon::Grabbing);
                            } else {
                                viewer.end_drag();
                                last_mouse_pos = None;
                                window.set_cursor_icon(CursorIcon::Grab);
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor_pos = Some(position);
                        if viewer.is_dragging() {
                            if let Some(last) = last_mouse_pos {
                                let dx = (position.x - last.x) as f32;
                                let dy = (position.y - last.y) as f32;
                                viewer.drag_delta(
                                    dx,
                                    dy,
                                    renderer.size.width as f32,
                                    renderer.size.height as f32,
                                );
                            }
                            last_mouse_pos = Some(position);
                        }
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let steps = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        viewer.zoom_steps(steps);
                    }

                    WindowEvent::Touch(touch) => {
                        viewer.note_touch_event();
                        handle_touch(
                            touch,
                            &mut touches,
                            &mut last_touch_pos,
                            &mut pinch_baseline,
                            &mut viewer,
                            renderer.size,
                        );
                    }

                    WindowEvent::DroppedFile(path) => {
                        begin_tour_load(&path, &mut viewer, &mut renderer, &tx);
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame).as_secs_f32().min(0.1);
                last_frame = now;

                frame_count += 1;
                let window_secs = now.duration_since(fps_window_start).as_secs_f32();
                if window_secs >= 1.0 {
                    fps = frame_count as f32 / window_secs;
                    frame_count = 0;
                    fps_window_start = now;
                }

                viewer.update(dt);

                if fullscreen.sync_with(window.fullscreen().is_some()) {
                    log::info!(
                        "fullscreen {}",
                        if fullscreen.is_active() { "entered" } else { "left" }
                    );
                }
                if let Some(e) = fullscreen.poll_denied() {
                    log::warn!("{e}");
                }

                let view_proj = viewer.camera.view_proj(renderer.aspect());
                renderer.update_scene(view_proj);

                // Hover resolution + marker buffer, Ready only.
                let mut hovered_label: Option<(String, [f32; 2])> = None;
                let interactive = viewer.is_interactive();
                if interactive {
                    let (w, h) = (renderer.size.width as f32, renderer.size.height as f32);
                    let hovered = cursor_pos.and_then(|c| {
                        hovered_index(
                            &viewer.markers,
                            [c.x as f32, c.y as f32],
                            &view_proj,
                            w,
                            h,
                        )
                    });
                    for (i, marker) in viewer.markers.iter_mut().enumerate() {
                        marker.state = if Some(i) == hovered {
                            MarkerState::Hovered
                        } else {
                            MarkerState::Idle
                        };
                    }
                    if let Some(i) = hovered {
                        if let Some(pos) = viewer.markers[i].project(&view_proj, w, h) {
                            hovered_label =
                                Some((viewer.markers[i].annotation.text.clone(), pos));
                        }
                    }
                    renderer.update_markers(&viewer.markers);
                }

                let window_ref = window.clone();
                let viewer_ref = &viewer;
                let fullscreen_ref = &mut fullscreen;
                let render_result = renderer.render_with_ui(&window, interactive, |ctx| {
                    draw_ui(
                        ctx,
                        viewer_ref,
                        fullscreen_ref,
                        &window_ref,
                        hovered_label.as_ref().map(|(t, p)| (t.as_str(), *p)),
                        fps,
                        show_fps,
                    );
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

/// First free CLI argument names a tour file or panorama image.
fn resolve_source_from_args() -> Option<PathBuf> {
    std::env::args_os().skip(1).map(PathBuf::from).find(|a| {
        !a.to_string_lossy().starts_with('-')
    })
}

/// Parse a tour (or wrap a bare image), reset the mount and kick off the
/// background decode.
fn begin_tour_load(
    path: &Path,
    viewer: &mut Viewer,
    renderer: &mut Renderer,
    tx: &Sender<LoadOutcome>,
) {
    renderer.clear_panorama();
    match Tour::load(path) {
        Ok(tour) => {
            let generation = viewer.begin_loading(tour.config);
            start_load(tour, generation, tx.clone());
        }
        Err(e) => {
            log::error!("{e}");
            let generation = viewer.generation();
            viewer.texture_failed(generation, &e);
        }
    }
}

fn start_load(tour: Tour, generation: u64, tx: Sender<LoadOutcome>) {
    thread::spawn(move || {
        log::info!("decoding panorama {:?}", tour.image);
        let result = decode_panorama(&tour.image).map(|image| LoadedPanorama {
            image,
            hotspots: tour.hotspots,
        });
        if tx.send(LoadOutcome { generation, result }).is_err() {
            log::warn!("viewer went away before the panorama finished decoding");
        }
    });
}

fn decode_panorama(path: &Path) -> Result<RgbaImage, ViewerError> {
    let wrap = |source| ViewerError::TextureLoad {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| wrap(image::ImageError::IoError(e)))?;
    let reader = BufReader::new(file);

    let img = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map_err(wrap)?;

    let (w, h) = img.dimensions();
    log::info!("decoded {w}x{h} panorama");
    Ok(img.to_rgba8())
}

/// Route a touch event into drag or pinch handling. One finger orbits; two
/// fingers drive whatever the device-class bindings say.
fn handle_touch(
    touch: Touch,
    touches: &mut BTreeMap<u64, PhysicalPosition<f64>>,
    last_touch_pos: &mut Option<PhysicalPosition<f64>>,
    pinch_baseline: &mut Option<(f32, [f32; 2])>,
    viewer: &mut Viewer,
    size: winit::dpi::PhysicalSize<u32>,
) {
    match touch.phase {
        TouchPhase::Started => {
            touches.insert(touch.id, touch.location);
            match touches.len() {
                1 => {
                    viewer.start_drag();
                    *last_touch_pos = Some(touch.location);
                }
                2 => {
                    viewer.end_drag();
                    viewer.start_pinch();
                    *last_touch_pos = None;
                    *pinch_baseline = pinch_measure(touches);
                }
                _ => {}
            }
        }

        TouchPhase::Moved => {
            touches.insert(touch.id, touch.location);
            if touches.len() == 1 {
                if viewer.is_dragging() {
                    if let Some(last) = *last_touch_pos {
                        let dx = (touch.location.x - last.x) as f32;
                        let dy = (touch.location.y - last.y) as f32;
                        viewer.drag_delta(dx, dy, size.width as f32, size.height as f32);
                    }
                    *last_touch_pos = Some(touch.location);
                }
            } else if touches.len() == 2 {
                if let (Some((dist, centroid)), Some((prev_dist, prev_centroid))) =
                    (pinch_measure(touches), *pinch_baseline)
                {
                    viewer.pinch_update(
                        dist - prev_dist,
                        centroid[0] - prev_centroid[0],
                        centroid[1] - prev_centroid[1],
                        size.width as f32,
                        size.height as f32,
                    );
                    *pinch_baseline = Some((dist, centroid));
                }
            }
        }

        TouchPhase::Ended | TouchPhase::Cancelled => {
            touches.remove(&touch.id);
            if touches.len() < 2 {
                viewer.end_pinch();
                *pinch_baseline = None;
            }
            match touches.len() {
                0 => {
                    viewer.end_drag();
                    *last_touch_pos = None;
                }
                1 => {
                    // Back to a single finger: restart the orbit from its
                    // current position so the view does not jump.
                    viewer.start_drag();
                    *last_touch_pos = touches.values().next().copied();
                }
                _ => {}
            }
        }
    }
}

fn pinch_measure(touches: &BTreeMap<u64, PhysicalPosition<f64>>) -> Option<(f32, [f32; 2])> {
    let mut it = touches.values();
    let a = it.next()?;
    let b = it.next()?;
    let dist = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt() as f32;
    let centroid = [
        ((a.x + b.x) / 2.0) as f32,
        ((a.y + b.y) / 2.0) as f32,
    ];
    Some((dist, centroid))
}

fn draw_ui(
    ctx: &egui::Context,
    viewer: &Viewer,
    fullscreen: &mut FullscreenManager,
    window: &winit::window::Window,
    hovered_label: Option<(&str, [f32; 2])>,
    fps: f32,
    show_fps: bool,
) {
    let ppp = ctx.pixels_per_point();

    if viewer.config.show_controls {
        egui::Area::new("viewer_controls")
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
            .show(ctx, |ui| {
                let label = if fullscreen.is_active() {
                    "⛶ Exit fullscreen"
                } else {
                    "⛶ Fullscreen"
                };
                if ui.button(label).clicked() {
                    // Issued right here in the input handler, as the
                    // fullscreen contract requires.
                    window.set_fullscreen(fullscreen.toggle());
                }
            });
    }

    match &viewer.state {
        ViewerState::Unmounted => {
            overlay_message(
                ctx,
                "Drop a panorama here, or press O to open one",
                egui::Color32::LIGHT_GRAY,
            );
        }
        ViewerState::Loading => {
            overlay_message(ctx, "Loading panorama…", egui::Color32::YELLOW);
        }
        ViewerState::Error(msg) => {
            overlay_message(
                ctx,
                &format!("Could not show this panorama\n{msg}"),
                egui::Color32::LIGHT_RED,
            );
        }
        ViewerState::Ready => {
            if let Some((text, [x, y])) = hovered_label {
                egui::Area::new("hotspot_label")
                    .fixed_pos(egui::pos2(x / ppp, y / ppp + 18.0))
                    .show(ctx, |ui| {
                        egui::Frame::popup(ui.style()).show(ui, |ui| {
                            ui.label(egui::RichText::new(text).strong());
                        });
                    });
            }
        }
    }

    if show_fps {
        egui::Area::new("fps_counter")
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new(format!("FPS: {fps:.1}")).color(egui::Color32::GREEN),
                );
            });
    }
}

fn overlay_message(ctx: &egui::Context, text: &str, color: egui::Color32) {
    egui::Area::new("viewer_status")
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.label(egui::RichText::new(text).color(color).heading());
            });
        });
}
