//! Cross-module scenarios driving a mounted canvas end to end


use std::rc::Rc;

use crate::canvas::{CanvasOptions, MultiViewCanvas};
use crate::config::MultiViewConfig;
use crate::foundation::rect::{BoundingBox, CanvasSize};
use crate::platform::{LayoutElement, QueuedResizeObserver};
use crate::render::{BackendCapabilities, CommandLog, RecordingBackend};

/// A mounted canvas with its recording backend and resize observer
pub(crate) struct Harness {
    pub canvas: MultiViewCanvas,
    pub log: CommandLog,
    pub observer: QueuedResizeObserver,
}

pub(crate) const CANVAS: CanvasSize = CanvasSize::new(800.0, 600.0);

pub(crate) fn mount() -> Harness {
    mount_with(MultiViewConfig::default(), BackendCapabilities::all())
}

pub(crate) fn mount_with(config: MultiViewConfig, capabilities: BackendCapabilities) -> Harness {
    let backend = RecordingBackend::with_capabilities(capabilities);
    let log = backend.command_log();
    let observer = QueuedResizeObserver::new();
    let options = CanvasOptions::new(CANVAS)
        .with_config(config)
        .with_backend(backend);
    let canvas = MultiViewCanvas::mount(options, observer.clone()).unwrap();
    Harness {
        canvas,
        log,
        observer,
    }
}

pub(crate) fn element(left: f32, top: f32, width: f32, height: f32) -> Rc<LayoutElement> {
    LayoutElement::new(BoundingBox::from_origin_size(left, top, width, height))
}

impl Harness {
    /// Run frames until the canvas is idle, returning how many ran
    pub fn settle(&mut self, start: f64) -> usize {
        let mut frames = 0;
        while self.canvas.needs_frame() && frames < 10 {
            self.canvas.frame(start + 16.0 * frames as f64);
            frames += 1;
        }
        frames
    }
}
