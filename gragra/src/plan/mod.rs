mod engine;
mod policy;

pub use engine::{EngineConfig, EngineError, EngineResult, GrammarEngine, PlanReport, StepReport};
pub use policy::{Policy, PolicyKind};

use crate::rule::Rule;

/// One step of a [`Plan`]: a rule and how to choose among its matches.
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub rule: Rule,
    pub policy: Policy,
}

/// An ordered sequence of rule applications.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    name: String,
    steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(name: impl Into<String>) -> Self {
        Plan {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_rule(&mut self, rule: Rule, policy: impl Into<Policy>) {
        self.steps.push(PlanStep {
            rule,
            policy: policy.into(),
        });
    }

    /// Builder-style [`Plan::add_rule`].
    pub fn with_rule(mut self, rule: Rule, policy: impl Into<Policy>) -> Self {
        self.add_rule(rule, policy);
        self
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&PlanStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
