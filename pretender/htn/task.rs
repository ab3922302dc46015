use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{
    errors::PlanningError,
    execution::{ExecutionLog, ExecutionLogEntry, Outcome},
    module::ExecutionPolicy,
    state::{apply_effects, diff, EffectSet, State, Term},
};

type CapabilityFn = dyn Fn(&State, &[String]) -> State + Send + Sync;

/// Executable behaviour of a primitive task.
///
/// Receives the current state and the task's bound arguments.
#[derive(Clone)]
pub struct Capability(Arc<CapabilityFn>);

impl Capability {
    /// Wraps a capability that reads its bound arguments.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&State, &[String]) -> State + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps a plain `(State) -> State` transition.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&State) -> State + Send + Sync + 'static,
    {
        Self(Arc::new(move |state: &State, _: &[String]| f(state)))
    }

    /// Runs the capability.
    #[must_use]
    pub fn invoke(&self, state: &State, args: &[String]) -> State {
        (self.0)(state, args)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Capability(..)")
    }
}

/// Primitive XOR compound.
#[derive(Debug, Clone)]
pub enum TaskKind {
    /// Directly executable.
    Primitive(Capability),
    /// Committed subtasks; empty until decomposition succeeds.
    Compound(Vec<Arc<Task>>),
}

/// A named unit of work with requirements and declared effects.
#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    terms: Vec<Term>,
    effects: EffectSet,
    parameters: Vec<String>,
    arguments: Vec<String>,
    kind: TaskKind,
}

impl Task {
    /// Primitive task backed by a capability.
    #[must_use]
    pub fn primitive(name: impl Into<String>, capability: Capability) -> Self {
        Self::with_kind(name, TaskKind::Primitive(capability))
    }

    /// Compound task awaiting decomposition.
    #[must_use]
    pub fn compound(name: impl Into<String>) -> Self {
        Self::with_kind(name, TaskKind::Compound(Vec::new()))
    }

    fn with_kind(name: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            name: name.into(),
            terms: Vec::new(),
            effects: EffectSet::default(),
            parameters: Vec::new(),
            arguments: Vec::new(),
            kind,
        }
    }

    /// Adds a required term.
    #[must_use]
    pub fn requires(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    /// Declares the task's effects.
    #[must_use]
    pub fn effects(mut self, effects: EffectSet) -> Self {
        self.effects = effects;
        self
    }

    /// Declares positional parameters such as `?target`.
    #[must_use]
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Task name (includes bound arguments for bound instances).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required terms in declaration order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Declared effects.
    #[must_use]
    pub fn declared_effects(&self) -> &EffectSet {
        &self.effects
    }

    /// Declared parameter names.
    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.parameters
    }

    /// Arguments bound by [`Task::bind`].
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Name of the registered template this instance was bound from.
    #[must_use]
    pub fn template_name(&self) -> &str {
        if self.arguments.is_empty() {
            return &self.name;
        }
        let suffix: usize = self.arguments.iter().map(|arg| arg.len() + 1).sum();
        self.name
            .get(..self.name.len().saturating_sub(suffix))
            .unwrap_or(&self.name)
    }

    /// Parameter to argument table of a bound instance.
    #[must_use]
    pub fn bindings(&self) -> IndexMap<String, String> {
        self.parameters
            .iter()
            .cloned()
            .zip(self.arguments.iter().cloned())
            .collect()
    }

    /// Variant tag.
    #[must_use]
    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// True for primitive tasks.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TaskKind::Primitive(_))
    }

    /// Committed subtasks (always empty for primitives).
    #[must_use]
    pub fn subtasks(&self) -> &[Arc<Task>] {
        match &self.kind {
            TaskKind::Primitive(_) => &[],
            TaskKind::Compound(subtasks) => subtasks,
        }
    }

    /// True when the template still has unbound parameters.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.arguments.len() < self.parameters.len()
    }

    /// Produces a new instance with parameters bound to `args`.
    ///
    /// The instance is named `"<name> <arg> ..."`; compound instances start undecomposed.
    pub fn bind(&self, args: &[String]) -> Result<Self, PlanningError> {
        if args.len() != self.parameters.len() {
            return Err(PlanningError::ArityMismatch {
                task: self.name.clone(),
                expected: self.parameters.len(),
                found: args.len(),
            });
        }
        if args.is_empty() {
            return Ok(self.clone());
        }
        let bindings: IndexMap<String, String> = self
            .parameters
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        Ok(Self {
            name: format!("{} {}", self.name, args.join(" ")),
            terms: self.terms.iter().map(|t| t.bind(&bindings)).collect(),
            effects: self.effects.bind(&bindings),
            parameters: self.parameters.clone(),
            arguments: args.to_vec(),
            kind: match &self.kind {
                TaskKind::Primitive(capability) => TaskKind::Primitive(capability.clone()),
                TaskKind::Compound(_) => TaskKind::Compound(Vec::new()),
            },
        })
    }

    /// Returns a new compound instance holding `subtasks`.
    pub fn with_subtasks(&self, subtasks: Vec<Arc<Self>>) -> Result<Self, PlanningError> {
        match self.kind {
            TaskKind::Primitive(_) => Err(PlanningError::InvalidMethod {
                method: self.name.clone(),
                reason: "primitive tasks cannot hold subtasks".into(),
            }),
            TaskKind::Compound(_) => Ok(Self {
                kind: TaskKind::Compound(subtasks),
                ..self.clone()
            }),
        }
    }

    /// Executes the task against `state`.
    ///
    /// Primitives compare the capability's result with their declared effects and
    /// log `EffectMismatch` without failing. Compounds run their committed subtasks
    /// in order, threading the state, and stop early only under a halting policy.
    pub fn execute(
        &self,
        state: &State,
        policy: &ExecutionPolicy,
    ) -> Result<(State, ExecutionLog), PlanningError> {
        let mut log = ExecutionLog::new();
        match &self.kind {
            TaskKind::Primitive(capability) => {
                let expected = apply_effects(state, &self.effects)?;
                let actual = capability.invoke(state, &self.arguments);
                let missing = diff(&expected, &actual);
                if missing.is_empty() {
                    log.push(ExecutionLogEntry::ok(&self.name));
                } else {
                    let detail = format!("{} declared effect(s) missing", missing.len());
                    log.push(
                        ExecutionLogEntry::new(&self.name, Outcome::EffectMismatch, missing)
                            .with_detail(detail),
                    );
                }
                Ok((actual, log))
            }
            TaskKind::Compound(subtasks) => {
                if subtasks.is_empty() {
                    return Err(PlanningError::NotDecomposed(self.name.clone()));
                }
                let mut current = state.clone();
                for subtask in subtasks {
                    let (next, sub_log) = subtask.execute(&current, policy)?;
                    let mismatched = sub_log.has_mismatch();
                    log.extend(sub_log);
                    current = next;
                    if mismatched && policy.halt_on_mismatch {
                        break;
                    }
                }
                Ok((current, log))
            }
        }
    }
}
