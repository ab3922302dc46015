use std::{
    collections::BTreeSet,
    fmt,
    str::FromStr,
    sync::Arc,
};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::PlanningError;

/// Atomic fact about the world, e.g. `at(Robot, Kitchen)`.
///
/// Arguments beginning with `?` are parameters, substituted by [`Predicate::bind`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Predicate {
    name: String,
    args: Vec<String>,
}

impl Predicate {
    /// Builds a predicate from a name and its arguments.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses `name(arg, arg)` or a bare `name`.
    pub fn parse(text: &str) -> Result<Self, PlanningError> {
        let invalid = || PlanningError::InvalidPredicate(text.to_string());
        let trimmed = text.trim();
        let Some(open) = trimmed.find('(') else {
            if trimmed.is_empty() || trimmed.contains([')', ',']) {
                return Err(invalid());
            }
            return Ok(Self::new(trimmed, Vec::<String>::new()));
        };
        let name = trimmed[..open].trim();
        let inner = trimmed[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
        if name.is_empty() || name.contains([')', ',']) || inner.contains(['(', ')']) {
            return Err(invalid());
        }
        if inner.trim().is_empty() {
            return Ok(Self::new(name, Vec::<String>::new()));
        }
        let args = inner
            .split(',')
            .map(str::trim)
            .map(|arg| {
                if arg.is_empty() {
                    Err(invalid())
                } else {
                    Ok(arg.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, args))
    }

    /// Predicate name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// True when the symbol is the name or one of the arguments.
    #[must_use]
    pub fn mentions(&self, symbol: &str) -> bool {
        self.name == symbol || self.args.iter().any(|arg| arg == symbol)
    }

    /// Substitutes bound parameters; unbound ones are left in place.
    #[must_use]
    pub fn bind(&self, bindings: &IndexMap<String, String>) -> Self {
        Self {
            name: self.name.clone(),
            args: self
                .args
                .iter()
                .map(|arg| bindings.get(arg).cloned().unwrap_or_else(|| arg.clone()))
                .collect(),
        }
    }
}

/// True when `symbol` names a parameter slot.
#[must_use]
pub fn is_parameter(symbol: &str) -> bool {
    symbol.len() > 1 && symbol.starts_with('?')
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.args.join(", "))
        }
    }
}

impl FromStr for Predicate {
    type Err = PlanningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Predicate> for String {
    fn from(value: Predicate) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Predicate {
    type Error = PlanningError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Requirement a task places on the state before it applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Term {
    /// An object that must exist somewhere in the state.
    Symbol(String),
    /// A fact that must hold.
    Fact(Predicate),
}

impl Term {
    /// Parses a term; anything with parentheses is a fact.
    pub fn parse(text: &str) -> Result<Self, PlanningError> {
        let trimmed = text.trim();
        if trimmed.contains('(') {
            Predicate::parse(trimmed).map(Self::Fact)
        } else if trimmed.is_empty() || trimmed.contains([')', ',']) {
            Err(PlanningError::InvalidPredicate(text.to_string()))
        } else {
            Ok(Self::Symbol(trimmed.to_string()))
        }
    }

    /// Checks the term against a state, falling back to the parent task's terms.
    #[must_use]
    pub fn satisfied_by(&self, state: &State, context: &[Term]) -> bool {
        if context.contains(self) {
            return true;
        }
        match self {
            Self::Symbol(symbol) => {
                state.mentions(symbol)
                    || context
                        .iter()
                        .any(|term| matches!(term, Self::Fact(p) if p.mentions(symbol)))
            }
            Self::Fact(predicate) => state.holds(predicate),
        }
    }

    /// Substitutes bound parameters.
    #[must_use]
    pub fn bind(&self, bindings: &IndexMap<String, String>) -> Self {
        match self {
            Self::Symbol(symbol) => {
                Self::Symbol(bindings.get(symbol).cloned().unwrap_or_else(|| symbol.clone()))
            }
            Self::Fact(predicate) => Self::Fact(predicate.bind(bindings)),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(symbol) => write!(f, "{symbol}"),
            Self::Fact(predicate) => write!(f, "{predicate}"),
        }
    }
}

impl From<Term> for String {
    fn from(value: Term) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Term {
    type Error = PlanningError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Declared outcome of a task: predicates it adds and predicates it retracts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSet {
    /// Predicates expected to hold afterwards.
    #[serde(default)]
    pub additions: BTreeSet<Predicate>,
    /// Predicates expected to be gone afterwards.
    #[serde(default)]
    pub retractions: BTreeSet<Predicate>,
}

impl EffectSet {
    /// Empty effect set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assertion.
    #[must_use]
    pub fn add(mut self, predicate: Predicate) -> Self {
        self.additions.insert(predicate);
        self
    }

    /// Adds a retraction.
    #[must_use]
    pub fn retract(mut self, predicate: Predicate) -> Self {
        self.retractions.insert(predicate);
        self
    }

    /// Parses textual additions and retractions.
    pub fn parse(additions: &[&str], retractions: &[&str]) -> Result<Self, PlanningError> {
        Ok(Self {
            additions: additions
                .iter()
                .map(|text| Predicate::parse(text))
                .collect::<Result<_, _>>()?,
            retractions: retractions
                .iter()
                .map(|text| Predicate::parse(text))
                .collect::<Result<_, _>>()?,
        })
    }

    /// True when nothing is asserted or retracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.retractions.is_empty()
    }

    /// First predicate both asserted and retracted, if any.
    #[must_use]
    pub fn conflict(&self) -> Option<&Predicate> {
        self.additions.intersection(&self.retractions).next()
    }

    /// Rejects sets that assert and retract the same predicate.
    pub fn validate(&self) -> Result<(), PlanningError> {
        match self.conflict() {
            Some(predicate) => Err(PlanningError::EffectConflict {
                predicate: predicate.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Substitutes bound parameters on both sides.
    #[must_use]
    pub fn bind(&self, bindings: &IndexMap<String, String>) -> Self {
        Self {
            additions: self.additions.iter().map(|p| p.bind(bindings)).collect(),
            retractions: self.retractions.iter().map(|p| p.bind(bindings)).collect(),
        }
    }
}

/// Immutable snapshot of the world.
///
/// Cloning shares the underlying set; every transition builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    predicates: Arc<BTreeSet<Predicate>>,
}

impl State {
    /// Builds a state from predicates; duplicates collapse.
    #[must_use]
    pub fn new(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self {
            predicates: Arc::new(predicates.into_iter().collect()),
        }
    }

    /// Empty world.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses textual predicates into a state.
    pub fn parse(predicates: &[&str]) -> Result<Self, PlanningError> {
        predicates
            .iter()
            .map(|text| Predicate::parse(text))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(|set| Self {
                predicates: Arc::new(set),
            })
    }

    /// True when the predicate holds.
    #[must_use]
    pub fn holds(&self, predicate: &Predicate) -> bool {
        self.predicates.contains(predicate)
    }

    /// True when any predicate mentions the symbol.
    #[must_use]
    pub fn mentions(&self, symbol: &str) -> bool {
        self.predicates.iter().any(|p| p.mentions(symbol))
    }

    /// True when every addition holds and no retraction does.
    #[must_use]
    pub fn satisfies(&self, effects: &EffectSet) -> bool {
        effects.additions.iter().all(|p| self.holds(p))
            && !effects.retractions.iter().any(|p| self.holds(p))
    }

    /// Number of predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// True when no predicate holds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Iterates predicates in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Predicate> + '_ {
        self.predicates.iter()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<_> = self.predicates.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", rendered.join(", "))
    }
}

impl FromIterator<Predicate> for State {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.predicates.iter())
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeSet::<Predicate>::deserialize(deserializer).map(|set| Self {
            predicates: Arc::new(set),
        })
    }
}

/// Returns a new state with `effects` applied; `state` is left untouched.
pub fn apply_effects(state: &State, effects: &EffectSet) -> Result<State, PlanningError> {
    effects.validate()?;
    Ok(apply_validated(state, effects))
}

/// Applies an effect set already known to be conflict-free.
pub(crate) fn apply_validated(state: &State, effects: &EffectSet) -> State {
    if effects.is_empty() {
        return state.clone();
    }
    let mut next = (*state.predicates).clone();
    for predicate in &effects.retractions {
        next.remove(predicate);
    }
    next.extend(effects.additions.iter().cloned());
    State {
        predicates: Arc::new(next),
    }
}

/// Predicates present in `a` but absent in `b`.
#[must_use]
pub fn diff(a: &State, b: &State) -> BTreeSet<Predicate> {
    a.predicates.difference(&b.predicates).cloned().collect()
}
