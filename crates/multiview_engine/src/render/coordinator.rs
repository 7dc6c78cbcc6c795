//! Renderer coordinator
//!
//! Owns the canvas' single backend and drives it through two scheduler tasks:
//!
//! - **auto-render** (render stage): draws every visible scene into its own
//!   viewport, in registration order
//! - **canvas-resize** (main stage, before auto-render): resizes the backend
//!   once per canvas size change, then stops itself
//!
//! Setting changes are recorded and applied before the next frame is drawn.

use std::cell::RefCell;
use std::rc::Rc;

use super::backend::{BackendCapabilities, RenderBackend, SceneGraphDescriptor, SceneGraphHandle};
use super::backends::RecordingBackend;
use super::disposal::{use_disposal, DisposalQueue};
use super::pass::render_scenes;
use super::settings::{ColorSpace, RendererSettings, ShadowsConfig, ToneMapping};
use super::RenderResult;
use crate::canvas::{use_canvas, CanvasState};
use crate::context::{ContextError, ContextKey, ContextTree, ScopeId};
use crate::error::EngineError;
use crate::foundation::rect::CanvasSize;
use crate::scene::{use_scenes, SharedRegistry};
use crate::scheduler::{use_scheduler, SharedScheduler, Stage, TaskId, TaskOptions};

type SharedBackend = Rc<RefCell<Box<dyn RenderBackend>>>;

/// Creates the backend of a canvas
pub type RendererFactory = Box<dyn FnOnce(&CanvasState) -> RenderResult<Box<dyn RenderBackend>>>;

/// How the host should drive [`RendererCoordinator::frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// Every animation frame
    Continuous,
    /// Only while [`RendererCoordinator::needs_frame`] is true
    OnDemand,
}

/// Options of a new coordinator
pub struct RendererOptions {
    /// Initial settings
    pub settings: RendererSettings,
    /// Backend factory; a headless [`RecordingBackend`] is used when unset
    pub create_renderer: Option<RendererFactory>,
    /// Whether the auto-render task starts enabled
    pub auto_render: bool,
}

impl RendererOptions {
    /// Options with the given settings and no factory
    pub fn new(settings: RendererSettings) -> Self {
        Self {
            settings,
            create_renderer: None,
            auto_render: true,
        }
    }

    /// Create the backend with `factory`
    #[must_use]
    pub fn with_factory(
        mut self,
        factory: impl FnOnce(&CanvasState) -> RenderResult<Box<dyn RenderBackend>> + 'static,
    ) -> Self {
        self.create_renderer = Some(Box::new(factory));
        self
    }

    /// Use an already constructed backend
    #[must_use]
    pub fn with_backend(self, backend: impl RenderBackend + 'static) -> Self {
        self.with_factory(move |_| Ok(Box::new(backend) as Box<dyn RenderBackend>))
    }

    /// Set whether the auto-render task starts enabled
    #[must_use]
    pub fn auto_render(mut self, enabled: bool) -> Self {
        self.auto_render = enabled;
        self
    }
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self::new(RendererSettings::default())
    }
}

/// Renderer state of one canvas
pub struct RendererCoordinator {
    backend: SharedBackend,
    capabilities: BackendCapabilities,
    settings: RendererSettings,
    settings_dirty: bool,
    applied_pixel_ratio: f32,
    canvas: Rc<CanvasState>,
    scheduler: SharedScheduler,
    registry: SharedRegistry,
    disposal: Rc<DisposalQueue>,
    auto_render_task: TaskId,
    resize_task: TaskId,
    auto_render: bool,
    last_size: CanvasSize,
    disposed: bool,
}

impl RendererCoordinator {
    /// Create the backend and register the coordinator's tasks
    pub fn new(
        options: RendererOptions,
        canvas: Rc<CanvasState>,
        scheduler: SharedScheduler,
        registry: SharedRegistry,
        disposal: Rc<DisposalQueue>,
    ) -> Result<Self, EngineError> {
        let backend: Box<dyn RenderBackend> = match options.create_renderer {
            Some(factory) => factory(canvas.as_ref())?,
            None => {
                log::info!("No renderer factory given, using the headless recording backend");
                Box::new(RecordingBackend::new())
            }
        };
        let capabilities = backend.capabilities();
        log::info!(
            "Renderer '{}' initialized with {:?}",
            backend.name(),
            capabilities
        );
        let backend: SharedBackend = Rc::new(RefCell::new(backend));

        let auto_render_task = {
            let backend = Rc::clone(&backend);
            let registry = Rc::clone(&registry);
            let canvas = Rc::clone(&canvas);
            scheduler.borrow_mut().create_task(
                "auto-render",
                Stage::Render,
                TaskOptions::new()
                    .auto_start(options.auto_render)
                    .auto_invalidate(false),
                move |_ctx| {
                    let scenes = registry.borrow().snapshot();
                    let mut backend = backend.borrow_mut();
                    let summary = render_scenes(&scenes, &mut **backend, canvas.size());
                    log::trace!("Render pass: {summary:?}");
                },
            )?
        };

        let resize_task = {
            let backend = Rc::clone(&backend);
            let canvas = Rc::clone(&canvas);
            scheduler.borrow_mut().create_task(
                "canvas-resize",
                Stage::Main,
                TaskOptions::new()
                    .before(auto_render_task)
                    .auto_start(false)
                    .auto_invalidate(false),
                move |ctx| {
                    let size = canvas.size();
                    backend.borrow_mut().set_size(size.width, size.height);
                    ctx.invalidate();
                    ctx.stop();
                },
            )?
        };

        let last_size = canvas.size();
        let applied_pixel_ratio = options.settings.dpr.unwrap_or(canvas.pixel_ratio());
        let mut coordinator = Self {
            backend,
            capabilities,
            settings: options.settings,
            settings_dirty: true,
            applied_pixel_ratio,
            canvas,
            scheduler,
            registry,
            disposal,
            auto_render_task,
            resize_task,
            auto_render: options.auto_render,
            last_size,
            disposed: false,
        };
        coordinator.apply_settings();
        coordinator.arm_resize_task();
        Ok(coordinator)
    }

    /// Name of the backend
    pub fn backend_name(&self) -> String {
        self.backend.borrow().name().to_string()
    }

    /// Capabilities of the backend
    pub fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    /// How the host should drive frames
    pub fn frame_mode(&self) -> FrameMode {
        if self.capabilities.contains(BackendCapabilities::ANIMATION_LOOP) {
            FrameMode::Continuous
        } else {
            FrameMode::OnDemand
        }
    }

    /// Whether an on-demand host should schedule a frame
    pub fn needs_frame(&self) -> bool {
        !self.disposed
            && (self.settings_dirty
                || self.pixel_ratio_changed()
                || self.registry.borrow().has_pending_notifications()
                || self.scheduler.borrow().needs_frame())
    }

    /// Create a scene graph on the backend
    pub fn create_scene_graph(
        &mut self,
        descriptor: SceneGraphDescriptor,
    ) -> RenderResult<SceneGraphHandle> {
        self.backend.borrow_mut().create_scene_graph(descriptor)
    }

    /// Run one frame at `timestamp` (milliseconds), returning the number of
    /// task bodies executed
    ///
    /// Deferred resources are released, pending resize notifications and
    /// setting changes are applied, then the scheduler runs.
    pub fn frame(&mut self, timestamp: f64) -> usize {
        if self.disposed {
            log::warn!("frame() after dispose");
            return 0;
        }

        self.disposal.dispose();

        let resized = self.registry.borrow_mut().process_resize_notifications();
        if resized > 0 {
            log::trace!("Applied {resized} scene bound updates");
            self.scheduler.borrow_mut().invalidate();
        }

        if self.pixel_ratio_changed() {
            log::debug!(
                "Pixel ratio changed: {} -> {}",
                self.applied_pixel_ratio,
                self.effective_pixel_ratio()
            );
            self.mark_settings_changed();
        }
        if self.settings_dirty {
            self.apply_settings();
        }

        let mut scheduler = self.scheduler.borrow_mut();
        let executed = scheduler.run(timestamp);
        scheduler.reset_frame_invalidation();
        executed
    }

    /// Resize the canvas; the backend follows on the next frame
    pub fn resize_canvas(&mut self, size: CanvasSize) {
        self.canvas.set_size(size);
        if size != self.last_size {
            log::debug!(
                "Canvas resized to {}x{}",
                size.width,
                size.height
            );
            self.last_size = size;
            self.arm_resize_task();
        }
    }

    fn arm_resize_task(&mut self) {
        if let Err(err) = self.scheduler.borrow_mut().start(self.resize_task) {
            log::error!("Failed to arm canvas resize: {err}");
        }
    }

    /// Enable or disable the auto-render task
    pub fn set_auto_render(&mut self, enabled: bool) {
        if self.auto_render == enabled {
            return;
        }
        self.auto_render = enabled;
        if self.disposed {
            return;
        }

        let mut scheduler = self.scheduler.borrow_mut();
        let result = if enabled {
            scheduler.invalidate();
            scheduler.start(self.auto_render_task)
        } else {
            scheduler.stop(self.auto_render_task)
        };
        if let Err(err) = result {
            log::error!("Failed to toggle auto-render: {err}");
        }
        log::debug!("Auto-render {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Whether auto-render is enabled
    pub fn auto_render(&self) -> bool {
        self.auto_render
    }

    /// The auto-render task
    pub fn auto_render_task(&self) -> TaskId {
        self.auto_render_task
    }

    /// The canvas-resize task
    pub fn resize_task(&self) -> TaskId {
        self.resize_task
    }

    /// Current settings
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Replace every setting
    pub fn set_settings(&mut self, settings: RendererSettings) {
        if self.settings != settings {
            self.settings = settings;
            self.mark_settings_changed();
        }
    }

    /// Enable or disable color management
    pub fn set_color_management_enabled(&mut self, enabled: bool) {
        if self.settings.color_management_enabled != enabled {
            self.settings.color_management_enabled = enabled;
            self.mark_settings_changed();
        }
    }

    /// Change the output color space
    pub fn set_color_space(&mut self, color_space: ColorSpace) {
        if self.settings.color_space != color_space {
            self.settings.color_space = color_space;
            self.mark_settings_changed();
        }
    }

    /// Change the tone mapping operator
    pub fn set_tone_mapping(&mut self, tone_mapping: ToneMapping) {
        if self.settings.tone_mapping != tone_mapping {
            self.settings.tone_mapping = tone_mapping;
            self.mark_settings_changed();
        }
    }

    /// Change shadows; accepts a switch or a map type
    pub fn set_shadows(&mut self, shadows: impl Into<ShadowsConfig>) {
        let shadows = shadows.into();
        if self.settings.shadows != shadows {
            self.settings.shadows = shadows;
            self.mark_settings_changed();
        }
    }

    /// Override the pixel ratio; `None` follows the platform
    pub fn set_dpr(&mut self, dpr: Option<f32>) {
        if self.settings.dpr != dpr {
            self.settings.dpr = dpr;
            self.mark_settings_changed();
        }
    }

    /// Pixel ratio the backend should render at: the override, or the
    /// canvas' platform ratio
    pub fn effective_pixel_ratio(&self) -> f32 {
        self.settings.dpr.unwrap_or_else(|| self.canvas.pixel_ratio())
    }

    fn pixel_ratio_changed(&self) -> bool {
        (self.effective_pixel_ratio() - self.applied_pixel_ratio).abs() > f32::EPSILON
    }

    fn mark_settings_changed(&mut self) {
        self.settings_dirty = true;
        self.scheduler.borrow_mut().invalidate();
    }

    fn apply_settings(&mut self) {
        let mut backend = self.backend.borrow_mut();
        backend.set_color_management(self.settings.color_management_enabled);
        if self.capabilities.contains(BackendCapabilities::OUTPUT_SETTINGS) {
            let output = self.settings.output_settings(self.canvas.pixel_ratio());
            backend.apply_output_settings(&output);
        }
        self.applied_pixel_ratio = self.effective_pixel_ratio();
        self.settings_dirty = false;
        log::debug!("Applied renderer settings {:?}", self.settings);
    }

    /// Stop both tasks and release the backend; idempotent
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        {
            let mut scheduler = self.scheduler.borrow_mut();
            for task in [self.auto_render_task, self.resize_task] {
                if let Err(err) = scheduler.stop(task) {
                    log::warn!("Failed to stop renderer task: {err}");
                }
            }
        }

        if self.capabilities.contains(BackendCapabilities::DISPOSE) {
            self.backend.borrow_mut().dispose();
        }
        log::info!("Renderer disposed");
    }

    /// Whether [`dispose`](Self::dispose) was called
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Coordinator shared by everything below a canvas
pub type SharedRenderer = Rc<RefCell<RendererCoordinator>>;

/// Key of the renderer context
pub const RENDERER_KEY: ContextKey<RefCell<RendererCoordinator>> =
    ContextKey::new("multiview-renderer", "use_renderer", "<Canvas>");

/// Create the coordinator of the canvas above `scope` and provide it there
///
/// Needs the canvas, scheduler, scene registry and disposal contexts. The
/// coordinator is disposed when `scope` is destroyed.
pub fn create_renderer_context(
    tree: &mut ContextTree,
    scope: ScopeId,
    options: RendererOptions,
) -> Result<SharedRenderer, EngineError> {
    let canvas = use_canvas(tree, scope)?;
    let scheduler = use_scheduler(tree, scope)?;
    let registry = use_scenes(tree, scope)?;
    let disposal = use_disposal(tree, scope)?;

    let coordinator = RendererCoordinator::new(options, canvas, scheduler, registry, disposal)?;
    let renderer = Rc::new(RefCell::new(coordinator));
    tree.provide(scope, &RENDERER_KEY, Rc::clone(&renderer))?;

    let hook = Rc::clone(&renderer);
    tree.on_destroy(scope, move || hook.borrow_mut().dispose())?;
    Ok(renderer)
}

/// Nearest coordinator above `scope`
pub fn use_renderer(tree: &ContextTree, scope: ScopeId) -> Result<SharedRenderer, ContextError> {
    tree.require(scope, &RENDERER_KEY)
}
