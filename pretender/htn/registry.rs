use std::{cmp::Reverse, sync::Arc};

use indexmap::IndexMap;

use crate::{
    decomposition::DecompositionMethod,
    errors::PlanningError,
    oracle::vocabulary::{match_template, normalize},
    task::Task,
};

/// Name resolution used by the decomposition contract.
pub trait TaskLookup {
    /// Resolves a subtask descriptor to a task instance.
    fn lookup(&self, name: &str) -> Option<Arc<Task>>;
}

/// Write-once registries of tasks and decomposition methods.
///
/// Both maps keep registration order; method order is the search tie-break.
#[derive(Debug, Default)]
pub struct Catalog {
    tasks: IndexMap<String, Arc<Task>>,
    methods: IndexMap<String, Vec<DecompositionMethod>>,
    next_method_index: usize,
}

impl Catalog {
    /// Registers a primitive or compound task.
    pub fn register_task(&mut self, task: Task) -> Result<(), PlanningError> {
        if self.tasks.contains_key(task.name()) {
            return Err(PlanningError::DuplicateName(task.name().to_string()));
        }
        task.declared_effects().validate()?;
        self.tasks.insert(task.name().to_string(), Arc::new(task));
        Ok(())
    }

    /// Registers a method for a compound task.
    pub fn register_method(
        &mut self,
        task_name: &str,
        method: DecompositionMethod,
    ) -> Result<(), PlanningError> {
        let task = self
            .tasks
            .get(task_name)
            .ok_or_else(|| PlanningError::UnknownTask(task_name.to_string()))?;
        if task.is_primitive() {
            return Err(PlanningError::InvalidMethod {
                method: method.name().to_string(),
                reason: format!("`{task_name}` is primitive"),
            });
        }
        if method.candidates().is_empty() || method.candidates().iter().any(Vec::is_empty) {
            return Err(PlanningError::InvalidMethod {
                method: method.name().to_string(),
                reason: "every candidate must name at least one subtask".into(),
            });
        }
        let existing = self.methods.entry(task_name.to_string()).or_default();
        if existing.iter().any(|m| m.name() == method.name()) {
            return Err(PlanningError::DuplicateName(format!(
                "{task_name}::{}",
                method.name()
            )));
        }
        existing.push(method.bind_to(task_name, self.next_method_index));
        self.next_method_index += 1;
        Ok(())
    }

    /// Registered task by exact name.
    #[must_use]
    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name)
    }

    /// Methods registered under a template name, in registration order.
    #[must_use]
    pub fn methods_for(&self, task_name: &str) -> &[DecompositionMethod] {
        self.methods.get(task_name).map_or(&[], Vec::as_slice)
    }

    /// Methods applicable to a (possibly bound) task instance, with its
    /// arguments substituted into the candidates.
    #[must_use]
    pub fn methods_for_task(&self, task: &Task) -> Vec<DecompositionMethod> {
        let bindings = task.bindings();
        self.methods_for(task.template_name())
            .iter()
            .map(|method| method.instantiate(&bindings))
            .collect()
    }

    /// Primitive capability names in registration order.
    #[must_use]
    pub fn capabilities(&self) -> Vec<String> {
        self.tasks
            .values()
            .filter(|task| task.is_primitive())
            .map(|task| task.name().to_string())
            .collect()
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resolves a descriptor such as `Go to the Sink.` to a task instance.
    ///
    /// Exact names win. Otherwise the longest parameterised template whose name
    /// prefixes the descriptor is bound to the remaining words; parameterless
    /// names then match case-insensitively. A template named without its
    /// arguments fails with `ArityMismatch`.
    pub fn resolve(&self, descriptor: &str) -> Result<Arc<Task>, PlanningError> {
        let descriptor = normalize(descriptor);
        if let Some(task) = self.tasks.get(descriptor.as_str()) {
            if task.is_template() {
                return task.bind(&[]).map(Arc::new);
            }
            return Ok(Arc::clone(task));
        }
        let mut templates: Vec<&Arc<Task>> = self
            .tasks
            .values()
            .filter(|task| !task.parameter_names().is_empty())
            .collect();
        templates.sort_by_key(|task| Reverse(task.name().len()));
        for template in templates {
            if let Some(args) =
                match_template(&descriptor, template.name(), template.parameter_names().len())
            {
                return template.bind(&args).map(Arc::new);
            }
        }
        self.tasks
            .values()
            .find(|task| {
                task.parameter_names().is_empty() && task.name().eq_ignore_ascii_case(&descriptor)
            })
            .cloned()
            .ok_or(PlanningError::UnknownTask(descriptor))
    }
}

impl TaskLookup for Catalog {
    fn lookup(&self, name: &str) -> Option<Arc<Task>> {
        self.resolve(name).ok()
    }
}
