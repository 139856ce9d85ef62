//! Mamdani inference engine
//!
//! # Pipeline
//!
//! ```text
//!  crisp (r, g, b)
//!        │
//!        ▼
//!  ┌────────────┐   per rule: degree of each antecedent label
//!  │  fuzzify   │   (interpolated on the sampled input curves)
//!  └─────┬──────┘
//!        ▼
//!  ┌────────────┐   AND = min, OR = max
//!  │  combine   │   → firing strength
//!  └─────┬──────┘
//!        ▼
//!  ┌────────────┐   consequent curve cut at the firing strength
//!  │ implicate  │
//!  └─────┬──────┘
//!        ▼
//!  ┌────────────┐   elementwise max over all rules
//!  │ aggregate  │
//!  └─────┬──────┘
//!        ▼
//!  ┌────────────┐   centroid (default), bisector or mean of maximum
//!  │ defuzzify  │   → score in [0, 100], or undefined
//!  └────────────┘
//! ```
//!
//! The first three steps live in [`InferenceModel::activate`], which both
//! [`infer`] and the per-rule replay in [`explain`] call, so the two can
//! never disagree.

pub mod defuzz;
pub mod explain;

pub use defuzz::{defuzzify, defuzzify_with, DefuzzificationMethod};
pub use explain::{explain_all, explain_rule, fired_explanations, AntecedentTrace, RuleExplanation};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, TermSpec};
use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use crate::fuzzy::membership::{INPUT_SHOULDER, OUTPUT_SHOULDER};
use crate::fuzzy::{build_mf, Channel, FuzzyValue, LinguisticVariable, MembershipCurve, ShapeKind, Universe};
use crate::fuzzy_ensure;
use crate::rules::{Rule, RuleSet};

/// Name of the output variable
pub const OUTPUT_VARIABLE: &str = "ColorOutput";

/// Shape parameters that every curve of a model depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Membership function family for inputs and outputs
    pub shape: ShapeKind,
    /// Half-width of the input trapezoid plateau
    pub input_shoulder: f64,
    /// Half-width of the output trapezoid plateau
    pub output_shoulder: f64,
    pub defuzzification: DefuzzificationMethod,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Triangular,
            input_shoulder: INPUT_SHOULDER,
            output_shoulder: OUTPUT_SHOULDER,
            defuzzification: DefuzzificationMethod::Centroid,
        }
    }
}

impl ModelSettings {
    pub fn with_shape(shape: ShapeKind) -> Self {
        Self { shape, ..Self::default() }
    }

    /// Shoulder widths must be finite and non-negative
    pub fn validate(&self) -> FuzzyResult<()> {
        for (name, width) in [("input_shoulder", self.input_shoulder), ("output_shoulder", self.output_shoulder)] {
            if !width.is_finite() || width < 0.0 {
                return Err(FuzzyError::validation(format!("{} must be a non-negative number, got {}", name, width))
                    .with_code(ErrorCode::InvalidValue)
                    .with_context("setting", name));
            }
        }
        Ok(())
    }
}

/// An immutable, fully built inference model.
///
/// Changing the shape kind or the rule set means assembling a new model;
/// a model is never modified after construction, so it can be shared
/// freely between threads.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceModel {
    settings: ModelSettings,
    inputs: [LinguisticVariable; 3],
    output: LinguisticVariable,
    rules: RuleSet,
    fallback: bool,
}

/// Assemble a model from the canonical catalog
pub fn assemble(rule_set: RuleSet, shape: ShapeKind) -> FuzzyResult<InferenceModel> {
    InferenceModel::assemble(&Catalog::canonical(), rule_set, &ModelSettings::with_shape(shape))
}

fn build_variable(
    name: &str,
    universe: &Universe,
    table: &[TermSpec],
    shape: ShapeKind,
    shoulder: f64,
) -> FuzzyResult<LinguisticVariable> {
    let mut var = LinguisticVariable::new(name, universe.clone());
    for term in table {
        var.add_term(term.label.as_str(), build_mf(shape, term.points, universe, shoulder))?;
    }
    Ok(var)
}

impl InferenceModel {
    /// Build every curve from `catalog` and bundle it with `rule_set`.
    ///
    /// Rules naming labels missing from the catalog are dropped. If no rule
    /// is left, the model runs on [`Rule::fallback`] alone.
    pub fn assemble(catalog: &Catalog, rule_set: RuleSet, settings: &ModelSettings) -> FuzzyResult<Self> {
        catalog.validate()?;
        settings.validate()?;

        let color = Universe::color_intensity();
        let levels = build_variable("levels", &color, &catalog.inputs, settings.shape, settings.input_shoulder)?;
        let inputs = Channel::ALL.map(|channel| levels.renamed(channel.variable_name()));

        let output = build_variable(
            OUTPUT_VARIABLE,
            &Universe::output_score(),
            &catalog.outputs,
            settings.shape,
            settings.output_shoulder,
        )?;

        let mut rules = RuleSet::new();
        for (index, rule) in rule_set.iter().enumerate() {
            let unknown = Channel::ALL
                .iter()
                .find(|c| !catalog.has_input_label(rule.label(**c)))
                .map(|c| rule.label(*c))
                .or_else(|| (!catalog.has_output_label(&rule.consequent)).then_some(rule.consequent.as_str()));
            match unknown {
                Some(label) => warn!(index, rule = %rule, label, "rule references an unknown label, dropped"),
                None => rules.push(rule.clone()),
            }
        }

        let fallback = rules.is_empty();
        if fallback {
            warn!("rule set is empty, using the fallback rule: {}", Rule::fallback());
            rules = RuleSet::fallback();
        }

        info!(
            shape = settings.shape.as_str(),
            rules = rules.len(),
            input_terms = levels.len(),
            output_terms = output.len(),
            "model assembled"
        );

        Ok(Self {
            settings: settings.clone(),
            inputs,
            output,
            rules,
            fallback,
        })
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn shape(&self) -> ShapeKind {
        self.settings.shape
    }

    pub fn input(&self, channel: Channel) -> &LinguisticVariable {
        &self.inputs[channel.index()]
    }

    pub fn output(&self) -> &LinguisticVariable {
        &self.output
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Whether the rule set was replaced by the fallback rule
    pub fn uses_fallback(&self) -> bool {
        self.fallback
    }

    /// Fuzzify, combine and implicate one rule.
    pub fn activate(&self, rule: &Rule, crisp: [f64; 3]) -> FuzzyResult<RuleActivation> {
        if let Some(bad) = crisp.iter().find(|v| !v.is_finite()) {
            return Err(FuzzyError::numeric(format!("crisp input {} is not finite", bad))
                .with_context("input", format!("({}, {}, {})", crisp[0], crisp[1], crisp[2])));
        }

        let mut degrees = [FuzzyValue::ZERO; 3];
        for channel in Channel::ALL {
            degrees[channel.index()] = self
                .input(channel)
                .membership(rule.label(channel), crisp[channel.index()])?;
        }

        let strength = rule.connective.combine(&degrees);
        fuzzy_ensure!(
            strength.is_finite(),
            ErrorCode::NumericFailure,
            "firing strength of '{}' is not finite",
            rule
        );

        let implied = self.output.require(&rule.consequent)?.clipped(strength);
        Ok(RuleActivation { degrees, strength, implied })
    }

    /// Run one inference pass. Failures become an undefined result.
    pub fn infer(&self, r: f64, g: f64, b: f64) -> InferenceResult {
        match self.try_infer(r, g, b) {
            Ok(result) => result,
            Err(err) => {
                warn!(r, g, b, error = %err, "inference failed");
                InferenceResult::failed(err.message)
            }
        }
    }

    /// Run one inference pass, reporting failures as errors.
    pub fn try_infer(&self, r: f64, g: f64, b: f64) -> FuzzyResult<InferenceResult> {
        let crisp = [r, g, b];
        let mut aggregate = MembershipCurve::zeros(self.output.universe.len());
        let mut fired = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let activation = self.activate(rule, crisp)?;
            if activation.strength.fired() {
                fired.push(index);
            }
            aggregate.union_with(&activation.implied)?;
        }

        fuzzy_ensure!(aggregate.is_finite(), ErrorCode::NumericFailure, "aggregate set is not finite");

        let score = defuzzify_with(self.settings.defuzzification, &aggregate, &self.output.universe);
        debug!(r, g, b, fired = fired.len(), ?score, "inference pass");

        Ok(match score {
            Some(score) => {
                let label = self.output.dominant_term(score).map(|(l, _)| l.to_string());
                InferenceResult {
                    score: Some(score),
                    label,
                    aggregate: Some(aggregate),
                    fired,
                    status: InferenceStatus::Classified,
                }
            }
            None => InferenceResult {
                score: None,
                label: None,
                aggregate: Some(aggregate),
                fired,
                status: InferenceStatus::NoActivation,
            },
        })
    }
}

/// Run one inference pass on `model`
pub fn infer(model: &InferenceModel, r: f64, g: f64, b: f64) -> InferenceResult {
    model.infer(r, g, b)
}

/// Elementwise maximum of `contributions` over a universe of `len` points.
///
/// With no contributions the result is the all-zero curve.
pub fn aggregate<'a, I>(len: usize, contributions: I) -> FuzzyResult<MembershipCurve>
where
    I: IntoIterator<Item = &'a MembershipCurve>,
{
    let mut acc = MembershipCurve::zeros(len);
    for curve in contributions {
        acc.union_with(curve)?;
    }
    Ok(acc)
}

/// Fuzzify/combine/implicate output for one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleActivation {
    /// Antecedent degree per channel, in Red, Green, Blue order
    pub degrees: [FuzzyValue; 3],
    pub strength: FuzzyValue,
    /// Consequent curve cut at `strength`
    pub implied: MembershipCurve,
}

/// How an inference pass ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InferenceStatus {
    /// A score was computed
    Classified,
    /// No rule fired; the aggregate is all zero
    NoActivation,
    /// The engine could not run
    Failed { message: String },
}

/// Result of one inference pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    /// Defuzzified score, `None` when undefined
    pub score: Option<f64>,
    /// Output color with the highest membership at `score`
    pub label: Option<String>,
    /// Aggregated output set, `None` when the engine failed
    pub aggregate: Option<MembershipCurve>,
    /// Indices of rules with positive firing strength
    pub fired: Vec<usize>,
    #[serde(flatten)]
    pub status: InferenceStatus,
}

impl InferenceResult {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            score: None,
            label: None,
            aggregate: None,
            fired: Vec::new(),
            status: InferenceStatus::Failed { message: message.into() },
        }
    }

    pub fn is_defined(&self) -> bool {
        self.score.is_some()
    }

    /// Text for the result display
    pub fn summary(&self) -> String {
        match (&self.status, self.score) {
            (InferenceStatus::Classified, Some(score)) => match &self.label {
                Some(label) => format!("Clasificación Fuzzy: {:.2} / 100 ({})", score, label),
                None => format!("Clasificación Fuzzy: {:.2} / 100", score),
            },
            (InferenceStatus::Failed { message }, _) => {
                format!("Clasificación no generada: {}", message)
            }
            _ => "Clasificación no generada: ninguna regla se activó".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RULES_100: &str = include_str!("../../rules_data/rules_100.json");

    fn model(rules: Vec<Rule>, shape: ShapeKind) -> InferenceModel {
        assemble(RuleSet::from_rules(rules), shape).unwrap()
    }

    fn full_model(shape: ShapeKind) -> InferenceModel {
        let report = crate::rules::parse_rules(RULES_100, &Catalog::canonical()).unwrap();
        assemble(report.rules, shape).unwrap()
    }

    #[test]
    fn test_assembly_shares_input_curves() {
        let m = full_model(ShapeKind::Triangular);
        assert_eq!(m.input(Channel::Red).name, "Rojo");
        assert_eq!(m.input(Channel::Blue).name, "Azul");
        for label in ["Bajo", "MedioBajo", "MedioAlto", "Alto"] {
            assert_eq!(m.input(Channel::Red).term(label), m.input(Channel::Green).term(label));
            assert_eq!(m.input(Channel::Red).term(label), m.input(Channel::Blue).term(label));
        }
        assert_eq!(m.output().len(), 8);
        assert_eq!(m.rules().len(), 64);
        assert!(!m.uses_fallback());
    }

    #[test]
    fn test_black_fires_azul_unclipped() {
        let m = model(vec![Rule::new("Bajo", "Bajo", "Bajo", "Azul")], ShapeKind::Triangular);
        let result = m.infer(0.0, 0.0, 0.0);

        assert_eq!(result.status, InferenceStatus::Classified);
        assert_eq!(result.fired, vec![0]);
        assert_eq!(result.aggregate.as_ref(), m.output().term("Azul"));

        // Azul = [0, 15, 15]: centroid = Σx²/Σx over 0..=15
        let expected = 1240.0 / 120.0;
        assert!((result.score.unwrap() - expected).abs() < 1e-9);
        assert_eq!(result.label.as_deref(), Some("Azul"));
    }

    #[test]
    fn test_white_fires_magenta() {
        let m = full_model(ShapeKind::Triangular);
        let result = m.infer(255.0, 255.0, 255.0);

        let magenta_rule = m
            .rules()
            .iter()
            .position(|r| r == &Rule::new("Alto", "Alto", "Alto", "Magenta"))
            .unwrap();
        assert_eq!(result.fired, vec![magenta_rule]);
        assert_eq!(result.aggregate.as_ref(), m.output().term("Magenta"));

        // Magenta = [0, 100, 100]: centroid = Σx²/Σx over 0..=100
        let expected = 338350.0 / 5050.0;
        assert!((result.score.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_rule_fires() {
        let m = model(vec![Rule::new("Alto", "Alto", "Alto", "Rojo")], ShapeKind::Triangular);
        let result = m.infer(0.0, 0.0, 0.0);

        assert_eq!(result.status, InferenceStatus::NoActivation);
        assert!(result.score.is_none());
        assert!(result.aggregate.as_ref().unwrap().is_zero());
        assert!(result.fired.is_empty());
        assert!(result.summary().contains("no generada"));
    }

    #[test]
    fn test_empty_rule_set_uses_fallback() {
        let m = model(vec![], ShapeKind::Triangular);
        assert!(m.uses_fallback());
        assert_eq!(m.rules().as_slice(), &[Rule::fallback()]);

        // Only red is low: the OR rule still fires fully
        let result = m.infer(0.0, 255.0, 255.0);
        assert_eq!(result.fired, vec![0]);
        assert_eq!(result.aggregate.as_ref(), m.output().term("Azul"));
    }

    #[test]
    fn test_unknown_labels_dropped_at_assembly() {
        let m = model(
            vec![
                Rule::new("Altisimo", "Bajo", "Bajo", "Azul"),
                Rule::new("Bajo", "Bajo", "Bajo", "Blanco"),
                Rule::new("Bajo", "Bajo", "Bajo", "Azul"),
            ],
            ShapeKind::Triangular,
        );
        assert_eq!(m.rules().len(), 1);
        assert!(!m.uses_fallback());
    }

    #[test]
    fn test_non_finite_input_is_undefined() {
        let m = full_model(ShapeKind::Triangular);
        let result = m.infer(f64::NAN, 0.0, 0.0);
        assert!(matches!(result.status, InferenceStatus::Failed { .. }));
        assert!(result.score.is_none());
        assert!(result.aggregate.is_none());

        let err = m.try_infer(0.0, f64::INFINITY, 0.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::NumericFailure);
    }

    #[test]
    fn test_out_of_range_inputs_clamp() {
        let m = full_model(ShapeKind::Triangular);
        assert_eq!(m.infer(-40.0, -1.0, -300.0), m.infer(0.0, 0.0, 0.0));
        assert_eq!(m.infer(300.0, 256.0, 1000.0), m.infer(255.0, 255.0, 255.0));
    }

    #[test]
    fn test_determinism() {
        let m = full_model(ShapeKind::Trapezoidal);
        let a = m.infer(128.0, 128.0, 128.0);
        let b = m.infer(128.0, 128.0, 128.0);
        assert_eq!(a, b);
        assert_eq!(a.score.map(f64::to_bits), b.score.map(f64::to_bits));
    }

    #[test]
    fn test_activation_clips_consequent() {
        let m = full_model(ShapeKind::Triangular);
        let rule = Rule::new("MedioBajo", "Bajo", "Bajo", "Rojo");
        // MedioBajo(42.5) = 0.5, Bajo(0) = 1
        let act = m.activate(&rule, [42.5, 0.0, 0.0]).unwrap();
        assert!((act.strength.value() - 0.5).abs() < 1e-12);
        assert!((act.implied.height() - 0.5).abs() < 1e-12);
        assert_eq!(act.degrees[1], FuzzyValue::ONE);
    }

    #[test]
    fn test_mid_grey_classifies() {
        for shape in ShapeKind::ALL {
            let m = full_model(shape);
            let result = m.infer(128.0, 128.0, 128.0);
            let score = result.score.unwrap();
            assert!((0.0..=100.0).contains(&score));
            assert!(result.label.is_some());
            assert!(result.summary().starts_with("Clasificación Fuzzy:"));
        }
    }

    #[test]
    fn test_rejects_negative_shoulder() {
        let settings = ModelSettings {
            input_shoulder: -1.0,
            ..ModelSettings::with_shape(ShapeKind::Trapezoidal)
        };
        let err = InferenceModel::assemble(&Catalog::canonical(), RuleSet::new(), &settings).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidValue);
        assert_eq!(err.code.category(), "validation");
    }

    #[test]
    fn test_aggregate_of_nothing_is_zero() {
        let agg = aggregate(101, std::iter::empty()).unwrap();
        assert!(agg.is_zero());
        assert_eq!(agg.len(), 101);
    }

    #[test]
    fn test_result_serializes_with_status() {
        let m = model(vec![Rule::new("Alto", "Alto", "Alto", "Rojo")], ShapeKind::Triangular);
        let json = serde_json::to_string(&m.infer(0.0, 0.0, 0.0)).unwrap();
        assert!(json.contains(r#""status":"no_activation""#));
        assert!(json.contains(r#""score":null"#));
    }

    proptest! {
        #[test]
        fn prop_aggregation_is_monotone(
            r in 0.0f64..=255.0,
            g in 0.0f64..=255.0,
            b in 0.0f64..=255.0,
        ) {
            let m = full_model(ShapeKind::Triangular);
            let implied: Vec<MembershipCurve> = m
                .rules()
                .iter()
                .map(|rule| m.activate(rule, [r, g, b]).unwrap().implied)
                .collect();

            let mut previous = MembershipCurve::zeros(101);
            for k in 1..=implied.len() {
                let current = aggregate(101, &implied[..k]).unwrap();
                prop_assert!(current
                    .values()
                    .iter()
                    .zip(previous.values())
                    .all(|(now, before)| now >= before));
                previous = current;
            }
        }

        #[test]
        fn prop_rule_order_does_not_matter(
            r in 0.0f64..=255.0,
            g in 0.0f64..=255.0,
            b in 0.0f64..=255.0,
            rotation in 0usize..64,
        ) {
            let forward = full_model(ShapeKind::Trapezoidal);
            let mut rules: Vec<Rule> = forward.rules().as_slice().to_vec();
            rules.reverse();
            rules.rotate_left(rotation);
            let shuffled = assemble(RuleSet::from_rules(rules), ShapeKind::Trapezoidal).unwrap();

            let a = forward.infer(r, g, b);
            let c = shuffled.infer(r, g, b);
            prop_assert_eq!(a.aggregate, c.aggregate);
            prop_assert_eq!(a.score, c.score);
        }

        #[test]
        fn prop_score_within_output_universe(
            r in -100.0f64..400.0,
            g in -100.0f64..400.0,
            b in -100.0f64..400.0,
        ) {
            let m = full_model(ShapeKind::Triangular);
            if let Some(score) = m.infer(r, g, b).score {
                prop_assert!((0.0..=100.0).contains(&score));
            }
        }
    }
}
