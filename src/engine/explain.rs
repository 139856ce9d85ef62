//! Per-rule explanations
//!
//! Replays the fuzzify, combine and implicate steps for individual rules so
//! a caller can show why a classification came out the way it did. The
//! numbers come from [`InferenceModel::activate`], the same code path
//! inference uses.
//!
//! Replaying every rule of a large set is embarrassingly parallel: rules
//! only read the model. [`explain_all`] splits the rule list into
//! contiguous chunks, one per worker, and returns results in rule order.

use std::fmt;
use std::thread;

use serde::Serialize;
use tracing::{debug, warn};

use super::InferenceModel;
use crate::error::{FuzzyError, FuzzyResult};
use crate::fuzzy::{Channel, FuzzyValue, MembershipCurve};
use crate::rules::Rule;

/// One antecedent condition of an explained rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AntecedentTrace {
    pub channel: Channel,
    pub label: String,
    /// The input term's curve over the color universe
    pub curve: MembershipCurve,
    /// Crisp input for this channel
    pub crisp: f64,
    /// Membership of `crisp` in `label`
    pub degree: FuzzyValue,
    /// `curve` cut at `degree`
    pub active: MembershipCurve,
}

/// Everything needed to draw one rule's contribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleExplanation {
    pub rule: Rule,
    pub description: String,
    pub antecedents: [AntecedentTrace; 3],
    /// Firing strength after the connective
    pub strength: FuzzyValue,
    /// The consequent's full curve
    pub output_curve: MembershipCurve,
    /// The consequent cut at `strength`
    pub clipped_output: MembershipCurve,
}

impl RuleExplanation {
    pub fn fired(&self) -> bool {
        self.strength.fired()
    }
}

impl fmt::Display for RuleExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.description)?;
        for trace in &self.antecedents {
            writeln!(
                f,
                "  {:<6} {:>7.2} is {:<10} {:.3}",
                trace.channel.variable_name(),
                trace.crisp,
                trace.label,
                trace.degree.value()
            )?;
        }
        writeln!(
            f,
            "  strength {:.3} ({}) → {} clipped at {:.3}",
            self.strength.value(),
            self.rule.connective.keyword(),
            self.rule.consequent,
            self.clipped_output.height()
        )
    }
}

/// Replay a single rule against the crisp input `(r, g, b)`
pub fn explain_rule(model: &InferenceModel, rule: &Rule, r: f64, g: f64, b: f64) -> FuzzyResult<RuleExplanation> {
    let crisp = [r, g, b];
    let activation = model.activate(rule, crisp)?;

    let mut antecedents = Vec::with_capacity(3);
    for channel in Channel::ALL {
        let label = rule.label(channel);
        let curve = model.input(channel).require(label)?.clone();
        let degree = activation.degrees[channel.index()];
        antecedents.push(AntecedentTrace {
            channel,
            label: label.to_string(),
            active: curve.clipped(degree),
            curve,
            crisp: crisp[channel.index()],
            degree,
        });
    }
    let antecedents: [AntecedentTrace; 3] = antecedents
        .try_into()
        .map_err(|_| FuzzyError::internal("rule has more than three antecedents"))?;

    Ok(RuleExplanation {
        rule: rule.clone(),
        description: rule.describe(),
        antecedents,
        strength: activation.strength,
        output_curve: model.output().require(&rule.consequent)?.clone(),
        clipped_output: activation.implied,
    })
}

/// Replay every rule of `model`, in rule order.
///
/// `workers` is the number of threads to use; 0 picks one per CPU.
pub fn explain_all(model: &InferenceModel, r: f64, g: f64, b: f64, workers: usize) -> Vec<FuzzyResult<RuleExplanation>> {
    let rules = model.rules().as_slice();
    let workers = effective_workers(workers).min(rules.len()).max(1);

    if workers == 1 {
        return rules.iter().map(|rule| explain_rule(model, rule, r, g, b)).collect();
    }

    let chunk_size = rules.len().div_ceil(workers);
    debug!(rules = rules.len(), workers, chunk_size, "explaining rules in parallel");

    thread::scope(|scope| {
        let handles: Vec<_> = rules
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|rule| explain_rule(model, rule, r, g, b))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .zip(rules.chunks(chunk_size))
            .flat_map(|(handle, chunk)| match handle.join() {
                Ok(results) => results,
                Err(_) => chunk
                    .iter()
                    .map(|rule| Err(FuzzyError::internal(format!("worker panicked explaining '{}'", rule))))
                    .collect(),
            })
            .collect()
    })
}

/// Explanations of the rules that fired, in rule order.
///
/// Rules that cannot be replayed are left out and logged.
pub fn fired_explanations(model: &InferenceModel, r: f64, g: f64, b: f64, workers: usize) -> Vec<RuleExplanation> {
    explain_all(model, r, g, b, workers)
        .into_iter()
        .enumerate()
        .filter_map(|(index, explanation)| match explanation {
            Ok(explanation) => explanation.fired().then_some(explanation),
            Err(err) => {
                warn!(index, error = %err, "rule not shown");
                None
            }
        })
        .collect()
}

/// Worker count with 0 meaning one per CPU
pub fn effective_workers(workers: usize) -> usize {
    if workers == 0 {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        workers
    }
}
