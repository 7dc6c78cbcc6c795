//! Frame scheduling
//!
//! Tasks are grouped in stages that run in order every frame. Within a stage
//! the order follows the tasks' `before`/`after` constraints. The render stage
//! runs only when the [`RenderMode`] says a frame is due.

pub mod graph;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::{ContextError, ContextKey, ContextTree, ScopeId};
use crate::foundation::time::FrameClock;
use graph::{DependencyGraph, ExecutionPlan, TaskNode};

/// Unique identifier for tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Raw id value
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Task execution stages with explicit ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Work that prepares the frame
    Main = 0,
    /// Draw calls, gated by [`FrameScheduler::should_render`]
    Render = 1,
}

/// When the render stage runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Every frame
    Always,
    /// Only after something invalidated the frame
    #[default]
    OnDemand,
    /// Only after an explicit [`FrameScheduler::advance`]
    Manual,
}

/// Scheduler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The task id is not registered
    #[error("Unknown task: {0:?}")]
    UnknownTask(TaskId),

    /// Ordering constraints form a cycle
    #[error("Circular ordering between tasks {0:?}")]
    CircularDependency(Vec<TaskId>),

    /// A constraint asks a later stage to run before an earlier one
    #[error("Task {first:?} cannot run before {second:?}: its stage runs later")]
    InvalidOrdering {
        /// Task that would have to run first
        first: TaskId,
        /// Task that would have to run second
        second: TaskId,
    },
}

/// Options of a new task
#[derive(Debug, Clone)]
pub struct TaskOptions {
    /// Tasks this one runs before
    pub before: Vec<TaskId>,
    /// Tasks this one runs after
    pub after: Vec<TaskId>,
    /// Start running immediately
    pub auto_start: bool,
    /// Invalidate the frame every time the task runs
    pub auto_invalidate: bool,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
            auto_start: true,
            auto_invalidate: true,
        }
    }
}

impl TaskOptions {
    /// Default options: auto start, auto invalidate, no ordering
    pub fn new() -> Self {
        Self::default()
    }

    /// Run before `task`
    pub fn before(mut self, task: TaskId) -> Self {
        self.before.push(task);
        self
    }

    /// Run after `task`
    pub fn after(mut self, task: TaskId) -> Self {
        self.after.push(task);
        self
    }

    /// Set whether the task starts running on creation
    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Set whether running the task invalidates the frame
    pub fn auto_invalidate(mut self, auto_invalidate: bool) -> Self {
        self.auto_invalidate = auto_invalidate;
        self
    }
}

/// What a task body sees while it runs
#[derive(Debug)]
pub struct FrameContext {
    task: TaskId,
    timestamp: f64,
    delta: f32,
    invalidate_requested: bool,
    stop_requested: bool,
}

impl FrameContext {
    fn new(task: TaskId, timestamp: f64, delta: f32) -> Self {
        Self {
            task,
            timestamp,
            delta,
            invalidate_requested: false,
            stop_requested: false,
        }
    }

    /// The running task
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Timestamp of the frame in milliseconds
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Seconds since the previous frame
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Request another frame
    pub fn invalidate(&mut self) {
        self.invalidate_requested = true;
    }

    /// Stop this task after the current run
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }
}

type TaskBody = Box<dyn FnMut(&mut FrameContext)>;

struct Task {
    label: String,
    stage: Stage,
    before: Vec<TaskId>,
    after: Vec<TaskId>,
    running: bool,
    auto_invalidate: bool,
    body: TaskBody,
}

impl Task {
    fn node(&self, id: TaskId) -> TaskNode {
        TaskNode {
            id,
            stage: self.stage,
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

/// Staged task runner driven once per frame
pub struct FrameScheduler {
    tasks: HashMap<TaskId, Task>,
    plan: ExecutionPlan,
    next_id: u64,
    render_mode: RenderMode,
    invalidated: bool,
    advance_requested: bool,
    clock: FrameClock,
}

impl FrameScheduler {
    /// Create an empty scheduler
    pub fn new(render_mode: RenderMode) -> Self {
        Self {
            tasks: HashMap::new(),
            plan: ExecutionPlan::default(),
            next_id: 1,
            render_mode,
            // The first frame is always due.
            invalidated: true,
            advance_requested: false,
            clock: FrameClock::new(),
        }
    }

    /// Register a task
    ///
    /// Fails when an ordering constraint names an unknown task, forms a cycle
    /// or contradicts stage order. A failed registration leaves the scheduler
    /// unchanged.
    pub fn create_task(
        &mut self,
        label: impl Into<String>,
        stage: Stage,
        options: TaskOptions,
        body: impl FnMut(&mut FrameContext) + 'static,
    ) -> Result<TaskId, SchedulerError> {
        let id = TaskId(self.next_id);
        let task = Task {
            label: label.into(),
            stage,
            before: options.before,
            after: options.after,
            running: options.auto_start,
            auto_invalidate: options.auto_invalidate,
            body: Box::new(body),
        };

        self.tasks.insert(id, task);
        match self.build_plan() {
            Ok(plan) => self.plan = plan,
            Err(err) => {
                self.tasks.remove(&id);
                return Err(err);
            }
        }
        self.next_id += 1;

        let task = &self.tasks[&id];
        log::debug!("Created task '{}' ({:?}) in {:?} stage", task.label, id, stage);
        if task.running && task.auto_invalidate {
            self.invalidated = true;
        }
        Ok(id)
    }

    /// Remove a task, returning whether it existed
    ///
    /// Constraints of other tasks that name the removed task are dropped.
    pub fn remove_task(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.remove(&id) else {
            return false;
        };
        for other in self.tasks.values_mut() {
            other.before.retain(|t| *t != id);
            other.after.retain(|t| *t != id);
        }
        match self.build_plan() {
            Ok(plan) => self.plan = plan,
            // Removing constraints cannot introduce new conflicts.
            Err(err) => log::error!("Failed to rebuild task order: {err}"),
        }
        log::debug!("Removed task '{}' ({:?})", task.label, id);
        true
    }

    fn build_plan(&self) -> Result<ExecutionPlan, SchedulerError> {
        let mut graph = DependencyGraph::new();
        for (&id, task) in &self.tasks {
            graph.add_task(task.node(id));
        }
        graph.generate_execution_plan()
    }

    /// Start a task
    pub fn start(&mut self, id: TaskId) -> Result<(), SchedulerError> {
        let task = self.tasks.get_mut(&id).ok_or(SchedulerError::UnknownTask(id))?;
        if !task.running {
            task.running = true;
            log::trace!("Started task '{}'", task.label);
            if task.auto_invalidate {
                self.invalidated = true;
            }
        }
        Ok(())
    }

    /// Stop a task; stopping a stopped task does nothing
    pub fn stop(&mut self, id: TaskId) -> Result<(), SchedulerError> {
        let task = self.tasks.get_mut(&id).ok_or(SchedulerError::UnknownTask(id))?;
        if task.running {
            task.running = false;
            log::trace!("Stopped task '{}'", task.label);
        }
        Ok(())
    }

    /// Whether the task exists and is running
    pub fn is_running(&self, id: TaskId) -> bool {
        self.tasks.get(&id).is_some_and(|t| t.running)
    }

    /// Label given at creation
    pub fn label(&self, id: TaskId) -> Option<&str> {
        self.tasks.get(&id).map(|t| t.label.as_str())
    }

    /// Number of registered tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Task order of the next frame
    pub fn execution_order(&self) -> Vec<TaskId> {
        self.plan.flattened()
    }

    /// Request a frame in on-demand mode
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    /// Request a frame in manual mode
    pub fn advance(&mut self) {
        self.advance_requested = true;
    }

    /// Whether something requested a frame since the last reset
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Current render mode
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Change the render mode
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if self.render_mode != mode {
            log::debug!("Render mode {:?} -> {:?}", self.render_mode, mode);
            self.render_mode = mode;
            self.invalidated = true;
        }
    }

    /// Whether the render stage runs this frame
    pub fn should_render(&self) -> bool {
        match self.render_mode {
            RenderMode::Always => true,
            RenderMode::OnDemand => self.invalidated || self.advance_requested,
            RenderMode::Manual => self.advance_requested,
        }
    }

    /// Whether a host driving frames on demand should schedule one
    pub fn needs_frame(&self) -> bool {
        self.should_render() || self.has_running_main_tasks()
    }

    fn has_running_main_tasks(&self) -> bool {
        self.tasks
            .values()
            .any(|t| t.running && t.stage == Stage::Main)
    }

    /// Time source used for task deltas
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Run one frame, returning the number of task bodies executed
    pub fn run(&mut self, timestamp: f64) -> usize {
        let delta = self.clock.tick(timestamp);
        let mut executed = 0;

        for (stage, ids) in self.plan.stages().to_vec() {
            if stage == Stage::Render && !self.should_render() {
                log::trace!("Skipping render stage");
                continue;
            }

            for id in ids {
                let Some(task) = self.tasks.get_mut(&id) else {
                    continue;
                };
                if !task.running {
                    continue;
                }

                log::trace!("Running task '{}'", task.label);
                let mut ctx = FrameContext::new(id, timestamp, delta);
                (task.body)(&mut ctx);
                executed += 1;

                if ctx.stop_requested {
                    task.running = false;
                }
                if task.auto_invalidate || ctx.invalidate_requested {
                    self.invalidated = true;
                }
            }
        }

        executed
    }

    /// Clear the requests that the previous frame consumed
    pub fn reset_frame_invalidation(&mut self) {
        self.invalidated = false;
        self.advance_requested = false;
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(RenderMode::default())
    }
}

/// Scheduler shared by everything below a canvas
pub type SharedScheduler = Rc<RefCell<FrameScheduler>>;

/// Key of the scheduler context
pub const SCHEDULER_KEY: ContextKey<RefCell<FrameScheduler>> =
    ContextKey::new("multiview-scheduler", "use_scheduler", "<Canvas>");

/// Provide a new scheduler in `scope`
pub fn create_scheduler_context(
    tree: &mut ContextTree,
    scope: ScopeId,
    render_mode: RenderMode,
) -> Result<SharedScheduler, ContextError> {
    let scheduler = Rc::new(RefCell::new(FrameScheduler::new(render_mode)));
    tree.provide(scope, &SCHEDULER_KEY, Rc::clone(&scheduler))?;
    Ok(scheduler)
}

/// Nearest scheduler above `scope`
pub fn use_scheduler(tree: &ContextTree, scope: ScopeId) -> Result<SharedScheduler, ContextError> {
    tree.require(scope, &SCHEDULER_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(&mut FrameContext) + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        (count, move |_ctx: &mut FrameContext| handle.set(handle.get() + 1))
    }

    #[test]
    fn test_render_stage_gated_on_demand() {
        let mut scheduler = FrameScheduler::new(RenderMode::OnDemand);
        let (draws, body) = counter();
        scheduler
            .create_task("draw", Stage::Render, TaskOptions::new().auto_invalidate(false), body)
            .unwrap();

        scheduler.run(0.0);
        scheduler.reset_frame_invalidation();
        assert_eq!(draws.get(), 1);

        scheduler.run(16.0);
        scheduler.reset_frame_invalidation();
        assert_eq!(draws.get(), 1);

        scheduler.invalidate();
        scheduler.run(32.0);
        assert_eq!(draws.get(), 2);
    }

    #[test]
    fn test_manual_mode_needs_advance() {
        let mut scheduler = FrameScheduler::new(RenderMode::Manual);
        let (draws, body) = counter();
        scheduler
            .create_task("draw", Stage::Render, TaskOptions::new().auto_invalidate(false), body)
            .unwrap();

        scheduler.invalidate();
        scheduler.run(0.0);
        scheduler.reset_frame_invalidation();
        assert_eq!(draws.get(), 0);

        scheduler.advance();
        scheduler.run(16.0);
        scheduler.reset_frame_invalidation();
        assert_eq!(draws.get(), 1);
    }

    #[test]
    fn test_always_mode_renders_every_frame() {
        let mut scheduler = FrameScheduler::new(RenderMode::Always);
        let (draws, body) = counter();
        scheduler
            .create_task("draw", Stage::Render, TaskOptions::new().auto_invalidate(false), body)
            .unwrap();

        for frame in 0..3 {
            scheduler.run(f64::from(frame) * 16.0);
            scheduler.reset_frame_invalidation();
        }
        assert_eq!(draws.get(), 3);
    }

    #[test]
    fn test_ordering_is_respected_when_run() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = FrameScheduler::new(RenderMode::Always);

        let log_a = Rc::clone(&order);
        let a = scheduler
            .create_task("a", Stage::Render, TaskOptions::new(), move |_| {
                log_a.borrow_mut().push("a");
            })
            .unwrap();
        let log_b = Rc::clone(&order);
        scheduler
            .create_task("b", Stage::Render, TaskOptions::new().before(a), move |_| {
                log_b.borrow_mut().push("b");
            })
            .unwrap();
        let log_c = Rc::clone(&order);
        scheduler
            .create_task("c", Stage::Main, TaskOptions::new(), move |_| {
                log_c.borrow_mut().push("c");
            })
            .unwrap();

        scheduler.run(0.0);
        assert_eq!(*order.borrow(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_task_can_stop_itself() {
        let mut scheduler = FrameScheduler::new(RenderMode::Always);
        let runs = Rc::new(Cell::new(0));
        let handle = Rc::clone(&runs);
        let id = scheduler
            .create_task("once", Stage::Main, TaskOptions::new().auto_start(false), move |ctx| {
                handle.set(handle.get() + 1);
                ctx.stop();
            })
            .unwrap();

        scheduler.run(0.0);
        assert_eq!(runs.get(), 0);

        scheduler.start(id).unwrap();
        scheduler.run(16.0);
        scheduler.run(32.0);
        assert_eq!(runs.get(), 1);
        assert!(!scheduler.is_running(id));
    }

    #[test]
    fn test_task_invalidation_requests_render() {
        let mut scheduler = FrameScheduler::new(RenderMode::OnDemand);
        let (draws, body) = counter();
        scheduler
            .create_task("invalidate", Stage::Main, TaskOptions::new().auto_invalidate(false), |ctx| {
                ctx.invalidate();
            })
            .unwrap();
        scheduler
            .create_task("draw", Stage::Render, TaskOptions::new().auto_invalidate(false), body)
            .unwrap();
        scheduler.reset_frame_invalidation();

        scheduler.run(0.0);
        assert_eq!(draws.get(), 1);
    }

    #[test]
    fn test_delta_is_passed_to_tasks() {
        let mut scheduler = FrameScheduler::new(RenderMode::Always);
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let handle = Rc::clone(&deltas);
        scheduler
            .create_task("delta", Stage::Main, TaskOptions::new(), move |ctx| {
                handle.borrow_mut().push(ctx.delta());
            })
            .unwrap();

        scheduler.run(1000.0);
        scheduler.run(1500.0);
        let deltas = deltas.borrow();
        approx::assert_relative_eq!(deltas[0], 0.0);
        approx::assert_relative_eq!(deltas[1], 0.5);
    }

    #[test]
    fn test_failed_creation_leaves_scheduler_unchanged() {
        let mut scheduler = FrameScheduler::default();
        let main = scheduler
            .create_task("main", Stage::Main, TaskOptions::new(), |_| {})
            .unwrap();

        let err = scheduler
            .create_task("late", Stage::Render, TaskOptions::new().before(main), |_| {})
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidOrdering { .. }));
        assert_eq!(scheduler.task_count(), 1);

        let next = scheduler
            .create_task("next", Stage::Main, TaskOptions::new(), |_| {})
            .unwrap();
        assert_eq!(next.value(), main.value() + 1);
    }

    #[test]
    fn test_unknown_task_errors() {
        let mut scheduler = FrameScheduler::default();
        let ghost = TaskId(42);
        assert_eq!(scheduler.start(ghost), Err(SchedulerError::UnknownTask(ghost)));
        assert_eq!(scheduler.stop(ghost), Err(SchedulerError::UnknownTask(ghost)));
        assert!(!scheduler.remove_task(ghost));
    }

    #[test]
    fn test_remove_task_drops_constraints() {
        let mut scheduler = FrameScheduler::default();
        let a = scheduler.create_task("a", Stage::Main, TaskOptions::new(), |_| {}).unwrap();
        let b = scheduler
            .create_task("b", Stage::Main, TaskOptions::new().before(a), |_| {})
            .unwrap();

        assert!(scheduler.remove_task(a));
        assert_eq!(scheduler.execution_order(), vec![b]);
    }

    #[test]
    fn test_scheduler_context_missing() {
        let tree = ContextTree::new();
        let err = use_scheduler(&tree, tree.root()).err().unwrap();
        assert_eq!(
            err.to_string(),
            "use_scheduler can only be used in a child component to <Canvas>."
        );
    }
}
