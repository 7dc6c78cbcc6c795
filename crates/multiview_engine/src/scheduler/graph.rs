//! Task ordering
//!
//! Resolves `before`/`after` constraints into a deterministic execution order
//! per stage. Ties are broken by creation order.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::{SchedulerError, Stage, TaskId};

/// Ordering information of one task
#[derive(Debug, Clone)]
pub struct TaskNode {
    /// Task identifier (creation order)
    pub id: TaskId,
    /// Stage the task belongs to
    pub stage: Stage,
    /// Tasks this one must run before
    pub before: Vec<TaskId>,
    /// Tasks this one must run after
    pub after: Vec<TaskId>,
}

/// Dependency graph for task scheduling
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: HashMap<TaskId, TaskNode>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task to the dependency graph
    pub fn add_task(&mut self, node: TaskNode) {
        self.nodes.insert(node.id, node);
    }

    /// Generate the execution plan, stage by stage
    pub fn generate_execution_plan(&self) -> Result<ExecutionPlan, SchedulerError> {
        // Edges point from the task that runs first to the task that runs second.
        let mut edges: Vec<(TaskId, TaskId)> = Vec::new();
        for node in self.nodes.values() {
            for &other in &node.before {
                edges.push((node.id, other));
            }
            for &other in &node.after {
                edges.push((other, node.id));
            }
        }

        let mut same_stage_edges = Vec::new();
        for (first, second) in edges {
            let first_stage = self.stage_of(first)?;
            let second_stage = self.stage_of(second)?;
            if first_stage == second_stage {
                same_stage_edges.push((first, second));
            } else if first_stage > second_stage {
                return Err(SchedulerError::InvalidOrdering {
                    first,
                    second,
                });
            }
            // Constraints between stages are satisfied by stage order.
        }

        let mut stages: Vec<Stage> = self.nodes.values().map(|n| n.stage).collect();
        stages.sort();
        stages.dedup();

        let mut plan = ExecutionPlan::default();
        for stage in stages {
            let members: HashSet<TaskId> = self
                .nodes
                .values()
                .filter(|n| n.stage == stage)
                .map(|n| n.id)
                .collect();
            let stage_edges: Vec<_> = same_stage_edges
                .iter()
                .copied()
                .filter(|(first, _)| members.contains(first))
                .collect();
            plan.stages.push((stage, Self::order_stage(&members, &stage_edges)?));
        }
        Ok(plan)
    }

    fn stage_of(&self, id: TaskId) -> Result<Stage, SchedulerError> {
        self.nodes
            .get(&id)
            .map(|n| n.stage)
            .ok_or(SchedulerError::UnknownTask(id))
    }

    /// Kahn's algorithm with the lowest id first among ready tasks
    fn order_stage(
        members: &HashSet<TaskId>,
        edges: &[(TaskId, TaskId)],
    ) -> Result<Vec<TaskId>, SchedulerError> {
        let mut in_degree: HashMap<TaskId, usize> = members.iter().map(|&id| (id, 0)).collect();
        let mut dependents: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        for &(first, second) in edges {
            *in_degree.entry(second).or_insert(0) += 1;
            dependents.entry(first).or_default().push(second);
        }

        let mut ready: BTreeSet<TaskId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(members.len());

        while let Some(id) = ready.pop_first() {
            order.push(id);
            for next in dependents.get(&id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*next);
                    }
                }
            }
        }

        if order.len() < members.len() {
            let mut stuck: Vec<TaskId> = members
                .iter()
                .copied()
                .filter(|id| !order.contains(id))
                .collect();
            stuck.sort();
            return Err(SchedulerError::CircularDependency(stuck));
        }
        Ok(order)
    }
}

/// Complete execution plan across all stages
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    stages: Vec<(Stage, Vec<TaskId>)>,
}

impl ExecutionPlan {
    /// Stages in execution order with their task order
    pub fn stages(&self) -> &[(Stage, Vec<TaskId>)] {
        &self.stages
    }

    /// Every task in execution order
    pub fn flattened(&self) -> Vec<TaskId> {
        self.stages
            .iter()
            .flat_map(|(_, tasks)| tasks.iter().copied())
            .collect()
    }
}
