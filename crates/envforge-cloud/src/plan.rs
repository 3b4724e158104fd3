//! Provisioning plans
//!
//! A [`Plan`] is the dependency-ordered list of [`Step`]s for one run.
//! Ordering is a stable topological sort: among the steps whose
//! dependencies are already placed, the one declared first goes next.

use crate::descriptor::{ResourceDescriptor, ResourceId};
use crate::error::{CloudError, Result};
use crate::provider::Handle;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One node of a provisioning plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    descriptor: ResourceDescriptor,
    #[serde(default)]
    depends_on: BTreeSet<ResourceId>,
}

impl Step {
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor,
            depends_on: BTreeSet::new(),
        }
    }

    pub fn depends_on(mut self, id: ResourceId) -> Self {
        self.depends_on.insert(id);
        self
    }

    pub fn after(mut self, ids: impl IntoIterator<Item = ResourceId>) -> Self {
        self.depends_on.extend(ids);
        self
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn dependencies(&self) -> &BTreeSet<ResourceId> {
        &self.depends_on
    }

    pub fn id(&self) -> ResourceId {
        self.descriptor.id()
    }
}

/// Validated, dependency-ordered steps
#[derive(Debug, Clone)]
pub struct Plan {
    steps: Vec<Step>,
    /// Dependency depth of each step, parallel to `steps`
    levels: Vec<usize>,
    positions: HashMap<ResourceId, usize>,
}

impl Plan {
    /// Validate the steps and order them.
    ///
    /// Fails with `InvalidInput` for invalid descriptors, duplicate
    /// identities or dangling dependencies, and with `CircularDependency`
    /// when the graph has a cycle.
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        let mut declared: HashMap<ResourceId, usize> = HashMap::new();
        for (index, step) in steps.iter().enumerate() {
            step.descriptor.validate()?;
            if declared.insert(step.id(), index).is_some() {
                return Err(CloudError::InvalidInput(format!(
                    "duplicate resource {}",
                    step.id()
                )));
            }
        }

        let mut remaining: Vec<usize> = vec![0; steps.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];
        for (index, step) in steps.iter().enumerate() {
            for dep in &step.depends_on {
                let dep_index = *declared.get(dep).ok_or_else(|| {
                    CloudError::InvalidInput(format!(
                        "{} depends on unknown resource {}",
                        step.id(),
                        dep
                    ))
                })?;
                if dep_index == index {
                    return Err(CloudError::CircularDependency(step.id().to_string()));
                }
                remaining[index] += 1;
                dependents[dep_index].push(index);
            }
        }

        let mut ready: BTreeSet<usize> = (0..steps.len())
            .filter(|&i| remaining[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(steps.len());
        while let Some(index) = ready.pop_first() {
            order.push(index);
            for &dependent in &dependents[index] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != steps.len() {
            let cycle: Vec<String> = (0..steps.len())
                .filter(|i| remaining[*i] > 0)
                .map(|i| steps[i].id().to_string())
                .collect();
            return Err(CloudError::CircularDependency(cycle.join(", ")));
        }

        let mut slots: Vec<Option<Step>> = steps.into_iter().map(Some).collect();
        let ordered: Vec<Step> = order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();

        let positions: HashMap<ResourceId, usize> = ordered
            .iter()
            .enumerate()
            .map(|(i, step)| (step.id(), i))
            .collect();

        let mut levels = Vec::with_capacity(ordered.len());
        for step in &ordered {
            let level = step
                .depends_on
                .iter()
                .filter_map(|dep| positions.get(dep).map(|&p| levels[p] + 1))
                .max()
                .unwrap_or(0);
            levels.push(level);
        }

        Ok(Self {
            steps: ordered,
            levels,
            positions,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Position of a step in execution order
    pub fn position(&self, id: &ResourceId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Step positions grouped by dependency depth.
    ///
    /// Steps of the same wave never depend on each other.
    pub fn waves(&self) -> Vec<Vec<usize>> {
        let depth = self.levels.iter().max().map_or(0, |m| m + 1);
        let mut waves = vec![Vec::new(); depth];
        for (position, &level) in self.levels.iter().enumerate() {
            waves[level].push(position);
        }
        waves
    }
}

/// What a run would do to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// The resource does not exist yet
    Create,
    /// The resource exists and will be updated in place
    Update,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
        }
    }
}

/// Previewed action for one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedAction {
    pub resource: ResourceId,
    pub action_type: ActionType,
    /// Handle of the existing resource, if any
    pub existing: Option<Handle>,
}

/// Summary of previewed actions
#[derive(Debug, Clone, Default)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
}

impl PlanSummary {
    pub fn from_actions(actions: &[PlannedAction]) -> Self {
        actions
            .iter()
            .fold(Self::default(), |mut summary, action| {
                match action.action_type {
                    ActionType::Create => summary.create += 1,
                    ActionType::Update => summary.update += 1,
                }
                summary
            })
    }
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to create, {} to update", self.create, self.update)
    }
}
