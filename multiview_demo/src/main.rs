//! Multi-view demo application
//!
//! Mounts a headless canvas with three scenes stacked on a page taller than
//! the canvas, scrolls the page and prints what the renderer was asked to do
//! each frame.
//!
//! Usage: `multiview_demo [config.toml|config.ron]`

use std::rc::Rc;

use multiview_engine::config::{Config, ConfigError, MultiViewConfig};
use multiview_engine::foundation::logging;
use multiview_engine::prelude::*;
use multiview_engine::render::{BackendCommand, CommandLog};
use thiserror::Error;

const CANVAS_WIDTH: f32 = 800.0;
const CANVAS_HEIGHT: f32 = 600.0;
const SCENE_HEIGHT: f32 = 350.0;
const SCENE_GAP: f32 = 50.0;
const SCROLL_STEP: f32 = 200.0;
const FRAME_MS: f64 = 16.0;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

struct Demo {
    canvas: MultiViewCanvas,
    observer: QueuedResizeObserver,
    log: CommandLog,
    containers: Vec<Rc<LayoutElement>>,
    timestamp: f64,
}

impl Demo {
    fn new(config: MultiViewConfig) -> Result<Self, DemoError> {
        let backend = RecordingBackend::new();
        let log = backend.command_log();
        let observer = QueuedResizeObserver::new();
        let options = CanvasOptions::new(CanvasSize::new(CANVAS_WIDTH, CANVAS_HEIGHT))
            .with_config(config)
            .with_backend(backend);
        let mut canvas = MultiViewCanvas::mount(options, observer.clone())?;

        let mut containers = Vec::new();
        for index in 0..3u8 {
            let top = f32::from(index) * (SCENE_HEIGHT + SCENE_GAP);
            let container = LayoutElement::new(BoundingBox::from_origin_size(
                0.0,
                top,
                CANVAS_WIDTH,
                SCENE_HEIGHT,
            ));
            let record = canvas.add_scene(&container)?;
            log::info!("Scene {} bound to rows {}..{}", record.borrow().id(), top, top + SCENE_HEIGHT);
            containers.push(container);
        }

        Ok(Self {
            canvas,
            observer,
            log,
            containers,
            timestamp: 0.0,
        })
    }

    fn scroll(&self, dy: f32) {
        for container in &self.containers {
            container.set_bounding_rect(container.bounding_rect().translated(0.0, -dy));
            self.observer.notify_element(container);
        }
    }

    fn run_frame(&mut self, label: &str) {
        if !self.canvas.needs_frame() {
            println!("[{label}] idle, no frame needed");
            return;
        }
        self.log.clear();
        self.canvas.frame(self.timestamp);
        self.timestamp += FRAME_MS;

        println!("[{label}] t={:.0}ms", self.timestamp);
        for command in self.log.commands() {
            println!("    {}", describe(&command));
        }
    }
}

fn describe(command: &BackendCommand) -> String {
    match command {
        BackendCommand::CreateSceneGraph { handle, .. } => {
            format!("create scene graph {:?}", handle.key())
        }
        BackendCommand::SetViewport(rect) => format!(
            "viewport x={} y={} {}x{}",
            rect.x, rect.y, rect.width, rect.height
        ),
        BackendCommand::SetScissor(rect) => format!(
            "scissor  x={} y={} {}x{}",
            rect.x, rect.y, rect.width, rect.height
        ),
        BackendCommand::Render { scene, .. } => format!("render {:?}", scene.key()),
        BackendCommand::SetSize { width, height } => format!("set size {width}x{height}"),
        BackendCommand::SetColorManagement(enabled) => format!("color management {enabled}"),
        BackendCommand::ApplyOutputSettings(settings) => format!("output {settings:?}"),
        BackendCommand::Dispose => "dispose".to_string(),
    }
}

fn load_config() -> Result<MultiViewConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {path}");
            Ok(MultiViewConfig::load_from_file(path)?)
        }
        None => Ok(MultiViewConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter("info");

    let config = load_config()?;
    let mut demo = Demo::new(config)?;

    demo.run_frame("mount");
    demo.run_frame("steady");

    for step in 1..=4 {
        demo.scroll(SCROLL_STEP);
        demo.run_frame(&format!("scroll {step}"));
    }

    demo.canvas.resize(CanvasSize::new(CANVAS_WIDTH, CANVAS_HEIGHT / 2.0));
    demo.run_frame("resize");

    demo.canvas
        .renderer()
        .borrow_mut()
        .set_shadows(ShadowMapType::Vsm);
    demo.canvas
        .renderer()
        .borrow_mut()
        .set_tone_mapping(ToneMapping::Neutral);
    demo.run_frame("settings");

    demo.canvas.renderer().borrow_mut().set_auto_render(false);
    demo.canvas.scheduler().borrow_mut().invalidate();
    demo.run_frame("auto-render off");

    let Demo { canvas, log, .. } = demo;
    log.clear();
    canvas.unmount();
    for command in log.commands() {
        println!("[unmount] {}", describe(&command));
    }

    Ok(())
}
