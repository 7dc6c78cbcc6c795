//! Canvas bootstrap
//!
//! A [`MultiViewCanvas`] is one drawing surface shared by any number of
//! scenes. Mounting it provides every canvas-level context in one scope;
//! scenes are mounted in child scopes and unmounted with them.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::MultiViewConfig;
use crate::context::{create_user_context, ContextError, ContextKey, ContextTree, ScopeId, UserContext};
use crate::error::EngineError;
use crate::foundation::rect::CanvasSize;
use crate::platform::{LayoutElement, ResizeObserver};
use crate::render::{
    create_camera_context, create_disposal_context, create_renderer_context, DisposalQueue,
    FrameMode, RenderBackend, RenderResult, RendererFactory, RendererOptions, SharedCamera,
    SharedRenderer,
};
use crate::scene::{create_scene_context, create_scenes_context, SceneId, SharedRegistry, SharedSceneRecord};
use crate::scheduler::{create_scheduler_context, SharedScheduler};

/// Size and pixel density of the drawing surface
#[derive(Debug)]
pub struct CanvasState {
    size: Cell<CanvasSize>,
    pixel_ratio: Cell<f32>,
}

impl CanvasState {
    /// Create a canvas state
    pub fn new(size: CanvasSize, pixel_ratio: f32) -> Self {
        Self {
            size: Cell::new(size),
            pixel_ratio: Cell::new(pixel_ratio),
        }
    }

    /// Current size in CSS pixels
    pub fn size(&self) -> CanvasSize {
        self.size.get()
    }

    /// Record a new size
    pub fn set_size(&self, size: CanvasSize) {
        self.size.set(size);
    }

    /// Pixel ratio reported by the platform
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio.get()
    }

    /// Record a new platform pixel ratio
    pub fn set_pixel_ratio(&self, pixel_ratio: f32) {
        self.pixel_ratio.set(pixel_ratio);
    }
}

/// Key of the canvas context
pub const CANVAS_KEY: ContextKey<CanvasState> =
    ContextKey::new("multiview-canvas", "use_canvas", "<Canvas>");

/// Provide a canvas state in `scope`
pub fn create_canvas_context(
    tree: &mut ContextTree,
    scope: ScopeId,
    size: CanvasSize,
    pixel_ratio: f32,
) -> Result<Rc<CanvasState>, ContextError> {
    let canvas = Rc::new(CanvasState::new(size, pixel_ratio));
    tree.provide(scope, &CANVAS_KEY, Rc::clone(&canvas))?;
    Ok(canvas)
}

/// Nearest canvas state above `scope`
pub fn use_canvas(tree: &ContextTree, scope: ScopeId) -> Result<Rc<CanvasState>, ContextError> {
    tree.require(scope, &CANVAS_KEY)
}

/// Options of [`MultiViewCanvas::mount`]
pub struct CanvasOptions {
    /// Initial canvas size
    pub size: CanvasSize,
    /// Settings
    pub config: MultiViewConfig,
    /// Backend factory, headless when unset
    pub create_renderer: Option<RendererFactory>,
}

impl CanvasOptions {
    /// Default settings for a canvas of `size`
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            config: MultiViewConfig::default(),
            create_renderer: None,
        }
    }

    /// Use `config` instead of the defaults
    #[must_use]
    pub fn with_config(mut self, config: MultiViewConfig) -> Self {
        self.config = config;
        self
    }

    /// Create the backend with `factory`
    #[must_use]
    pub fn with_renderer(
        mut self,
        factory: impl FnOnce(&CanvasState) -> RenderResult<Box<dyn RenderBackend>> + 'static,
    ) -> Self {
        self.create_renderer = Some(Box::new(factory));
        self
    }

    /// Draw through an already constructed backend
    #[must_use]
    pub fn with_backend(self, backend: impl RenderBackend + 'static) -> Self {
        self.with_renderer(move |_| Ok(Box::new(backend) as Box<dyn RenderBackend>))
    }
}

/// A mounted canvas and its scenes
pub struct MultiViewCanvas {
    tree: ContextTree,
    scope: ScopeId,
    canvas: Rc<CanvasState>,
    scheduler: SharedScheduler,
    registry: SharedRegistry,
    renderer: SharedRenderer,
    camera: SharedCamera,
    user: Rc<UserContext>,
    disposal: Rc<DisposalQueue>,
    scene_scopes: HashMap<SceneId, ScopeId>,
    mounted: bool,
}

impl MultiViewCanvas {
    /// Mount a canvas whose scene containers are watched by `observer`
    pub fn mount(
        options: CanvasOptions,
        observer: impl ResizeObserver + 'static,
    ) -> Result<Self, EngineError> {
        let CanvasOptions {
            size,
            config,
            create_renderer,
        } = options;

        let mut tree = ContextTree::new();
        let scope = tree.create_scope(tree.root())?;

        let scheduler = create_scheduler_context(&mut tree, scope, config.render_mode)?;
        let canvas = create_canvas_context(&mut tree, scope, size, config.device_pixel_ratio)?;
        let disposal = create_disposal_context(&mut tree, scope)?;
        let camera = create_camera_context(&mut tree, scope, size)?;
        let user = create_user_context(&mut tree, scope)?;
        let registry = create_scenes_context(&mut tree, scope, Box::new(observer))?;

        let renderer_options = RendererOptions {
            settings: config.renderer,
            create_renderer,
            auto_render: config.auto_render,
        };
        let renderer = create_renderer_context(&mut tree, scope, renderer_options)?;

        log::info!("Mounted canvas {}x{}", size.width, size.height);
        Ok(Self {
            tree,
            scope,
            canvas,
            scheduler,
            registry,
            renderer,
            camera,
            user,
            disposal,
            scene_scopes: HashMap::new(),
            mounted: true,
        })
    }

    /// Mount a scene bound to `container` in a new child scope
    pub fn add_scene(&mut self, container: &Rc<LayoutElement>) -> Result<SharedSceneRecord, EngineError> {
        let scope = self.tree.create_scope(self.scope)?;
        match create_scene_context(&mut self.tree, scope, container) {
            Ok(record) => {
                let id = record.borrow().id().clone();
                self.scene_scopes.insert(id, scope);
                Ok(record)
            }
            Err(err) => {
                self.tree.destroy_scope(scope);
                Err(err)
            }
        }
    }

    /// Unmount a scene, returning whether it was mounted
    pub fn remove_scene(&mut self, id: &SceneId) -> bool {
        match self.scene_scopes.remove(id) {
            Some(scope) => {
                self.tree.destroy_scope(scope);
                self.scheduler.borrow_mut().invalidate();
                true
            }
            None => false,
        }
    }

    /// Scope of a mounted scene, for providing scene-level contexts
    pub fn scene_scope(&self, id: &SceneId) -> Option<ScopeId> {
        self.scene_scopes.get(id).copied()
    }

    /// Resize the canvas and the default camera's aspect ratio
    pub fn resize(&mut self, size: CanvasSize) {
        self.renderer.borrow_mut().resize_canvas(size);
        self.camera.borrow_mut().set_aspect_ratio(size.aspect_ratio());
    }

    /// Run one frame
    pub fn frame(&mut self, timestamp: f64) -> usize {
        self.renderer.borrow_mut().frame(timestamp)
    }

    /// Whether an on-demand host should schedule a frame
    pub fn needs_frame(&self) -> bool {
        self.renderer.borrow().needs_frame()
    }

    /// How the host should drive frames
    pub fn frame_mode(&self) -> FrameMode {
        self.renderer.borrow().frame_mode()
    }

    /// Tear everything down: scenes first, then the renderer and registry
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.mounted {
            self.mounted = false;
            self.scene_scopes.clear();
            self.tree.destroy_scope(self.scope);
            log::info!("Unmounted canvas");
        }
    }

    /// Context tree holding the canvas scope
    pub fn tree(&self) -> &ContextTree {
        &self.tree
    }

    /// Mutable context tree, for child scopes and contexts
    pub fn tree_mut(&mut self) -> &mut ContextTree {
        &mut self.tree
    }

    /// Canvas scope
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Canvas state
    pub fn canvas(&self) -> &Rc<CanvasState> {
        &self.canvas
    }

    /// Frame scheduler
    pub fn scheduler(&self) -> &SharedScheduler {
        &self.scheduler
    }

    /// Scene registry
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Renderer coordinator
    pub fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }

    /// Default camera of new scenes
    pub fn camera(&self) -> &SharedCamera {
        &self.camera
    }

    /// Application data store
    pub fn user(&self) -> &Rc<UserContext> {
        &self.user
    }

    /// Deferred release queue
    pub fn disposal(&self) -> &Rc<DisposalQueue> {
        &self.disposal
    }
}

impl Drop for MultiViewCanvas {
    fn drop(&mut self) {
        self.teardown();
    }
}
