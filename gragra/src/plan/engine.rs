use super::{Plan, PlanStep};
use crate::graph::Graph;
use crate::matcher::{SearchLimits, find_pattern_matches_with};
use crate::rewrite::apply_rule;
use crate::util::log;
use error_stack::ResultExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("step {step}: rule {rule:?} is malformed")]
    InvalidRule { step: usize, rule: String },
    #[error("step {step}: searching for rule {rule:?} was interrupted")]
    Search { step: usize, rule: String },
    #[error("step {step}: applying rule {rule:?} to match #{match_index} failed")]
    Rewrite {
        step: usize,
        rule: String,
        match_index: usize,
    },
}

pub type EngineResult<T> = error_stack::Result<T, EngineError>;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seed of the random source used by the random selection policies.
    pub seed: u64,
    /// Bounds applied to every pattern search of a plan run.
    pub search_limits: SearchLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            seed: 1,
            search_limits: SearchLimits::unbounded(),
        }
    }
}

impl EngineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_search_limits(mut self, search_limits: SearchLimits) -> Self {
        self.search_limits = search_limits;
        self
    }
}

/// What one plan step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub rule: String,
    /// Number of matches found before any rewriting of this step.
    pub match_count: usize,
    /// Indices of the applied matches, in application order.
    pub applied: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanReport {
    pub steps: Vec<StepReport>,
}

impl PlanReport {
    /// Total number of rule applications over all steps.
    pub fn applications(&self) -> usize {
        self.steps.iter().map(|s| s.applied.len()).sum()
    }
}

/// Owns a working graph and rewrites it by running plans.
pub struct GrammarEngine {
    working: Graph,
    rng: ChaCha8Rng,
    config: EngineConfig,
}

impl Default for GrammarEngine {
    fn default() -> Self {
        GrammarEngine::new()
    }
}

impl GrammarEngine {
    pub fn new() -> Self {
        GrammarEngine::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        GrammarEngine {
            working: Graph::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Restarts the random source from `seed`.
    pub fn set_random_seed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn set_search_limits(&mut self, search_limits: SearchLimits) {
        self.config.search_limits = search_limits;
    }

    /// Replaces the working graph, returning the previous one.
    pub fn load_working_graph(&mut self, graph: Graph) -> Graph {
        log::debug!(
            "loading working graph {:?} ({} nodes, {} edges)",
            graph.name(),
            graph.node_count(),
            graph.edge_count()
        );
        std::mem::replace(&mut self.working, graph)
    }

    pub fn working_graph(&self) -> &Graph {
        &self.working
    }

    pub fn working_graph_mut(&mut self) -> &mut Graph {
        &mut self.working
    }

    pub fn into_working_graph(self) -> Graph {
        self.working
    }

    /// Runs every step of `plan` against the working graph, in order.
    ///
    /// All rules are validated before the graph is touched. Each step then searches once and
    /// applies the selected matches one after the other, without searching again in between.
    /// Matches invalidated by an earlier application of the same step abort the run with the
    /// graph left as it is.
    pub fn run_plan(&mut self, plan: &Plan) -> EngineResult<PlanReport> {
        for (step, PlanStep { rule, .. }) in plan.steps().iter().enumerate() {
            rule.validate().change_context_lazy(|| EngineError::InvalidRule {
                step,
                rule: rule.name().to_string(),
            })?;
        }

        log::info!("running plan {:?} ({} steps)", plan.name(), plan.len());
        let mut report = PlanReport::default();
        for (step, plan_step) in plan.steps().iter().enumerate() {
            report.steps.push(self.run_step(step, plan_step)?);
        }
        log::info!(
            "plan {:?} finished after {} rule applications",
            plan.name(),
            report.applications()
        );
        Ok(report)
    }

    /// Runs a single step. The rule is not validated.
    pub fn run_step(&mut self, step: usize, plan_step: &PlanStep) -> EngineResult<StepReport> {
        let PlanStep { rule, policy } = plan_step;
        let matches =
            find_pattern_matches_with(&self.working, rule.lhs(), &self.config.search_limits)
                .change_context_lazy(|| EngineError::Search {
                    step,
                    rule: rule.name().to_string(),
                })?;
        let selected = policy.select(matches.len(), &mut self.rng);
        log::debug!(
            "step {step}: rule {:?} has {} matches, {} ({:?}) selected {:?}",
            rule.name(),
            matches.len(),
            policy.kind,
            policy.modifier,
            selected
        );

        for &match_index in &selected {
            apply_rule(&mut self.working, rule, &matches[match_index]).change_context_lazy(
                || EngineError::Rewrite {
                    step,
                    rule: rule.name().to_string(),
                    match_index,
                },
            )?;
        }

        Ok(StepReport {
            rule: rule.name().to_string(),
            match_count: matches.len(),
            applied: selected,
        })
    }
}
