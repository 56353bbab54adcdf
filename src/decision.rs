use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::ArchetypeFavor;
use crate::config::{Cutoffs, DecisionConfig, DriverThresholds, ModelConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Green,
    #[default]
    Yellow,
    Red,
}

/// Green at or above the green cutoff, red below the red cutoff. Missing or
/// non-finite values are neutral.
pub fn classify_driver(value: Option<f64>, cut: &Cutoffs) -> DriverStatus {
    match value {
        Some(v) if v.is_finite() && v >= cut.green => DriverStatus::Green,
        Some(v) if v.is_finite() && v < cut.red => DriverStatus::Red,
        _ => DriverStatus::Yellow,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Driver {
    pub value: Option<f64>,
    pub status: DriverStatus,
    pub target: String,
}

/// The three live drivers. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverSet {
    pub ft_points: Option<Driver>,
    pub paint_points: Option<Driver>,
    pub efg: Option<Driver>,
}

impl DriverSet {
    pub fn from_values(
        ft_points: Option<f64>,
        paint_points: Option<f64>,
        efg: Option<f64>,
        t: &DriverThresholds,
    ) -> Self {
        Self {
            ft_points: Some(driver(ft_points, &t.ft_points, format!("{:.0}+ FT pts", t.ft_points.green))),
            paint_points: Some(driver(
                paint_points,
                &t.paint_points,
                format!("{:.0}+ paint pts", t.paint_points.green),
            )),
            efg: Some(driver(efg, &t.efg, format!("{:.0}%+ eFG", t.efg.green))),
        }
    }
}

fn driver(value: Option<f64>, cut: &Cutoffs, target: String) -> Driver {
    Driver {
        value,
        status: classify_driver(value, cut),
        target,
    }
}

/// A value, when present, is re-classified against the configured cutoffs;
/// otherwise the carried status is used.
fn resolve(driver: Option<&Driver>, cut: &Cutoffs) -> DriverStatus {
    match driver {
        Some(d) if d.value.is_some_and(f64::is_finite) => classify_driver(d.value, cut),
        Some(d) => d.status,
        None => DriverStatus::Yellow,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArchetypeContext {
    pub label: String,
    pub tier: ConfidenceTier,
    pub sample_size: u32,
    pub favor: ArchetypeFavor,
}

impl Default for ArchetypeContext {
    fn default() -> Self {
        Self {
            label: String::new(),
            tier: ConfidenceTier::Medium,
            sample_size: 0,
            favor: ArchetypeFavor::Neutral,
        }
    }
}

/// Volatility on a 0-10 index. Input may carry just the index; the label is
/// then derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VolatilityInput")]
pub struct Volatility {
    pub index: f64,
    pub label: String,
}

#[derive(Deserialize)]
struct VolatilityInput {
    #[serde(default)]
    index: Option<f64>,
    #[serde(default)]
    label: Option<String>,
}

impl From<VolatilityInput> for Volatility {
    fn from(input: VolatilityInput) -> Self {
        let mut v = Volatility::from_index(input.index.unwrap_or(DEFAULT_VOLATILITY_INDEX));
        if let Some(label) = input.label.filter(|l| !l.trim().is_empty()) {
            v.label = label;
        }
        v
    }
}

const DEFAULT_VOLATILITY_INDEX: f64 = 5.0;

impl Default for Volatility {
    fn default() -> Self {
        Self::from_index(DEFAULT_VOLATILITY_INDEX)
    }
}

impl Volatility {
    pub fn from_index(index: f64) -> Self {
        let index = if index.is_finite() { index.clamp(0.0, 10.0) } else { DEFAULT_VOLATILITY_INDEX };
        let label = if index <= 3.0 {
            "Stable"
        } else if index <= 6.0 {
            "Normal"
        } else {
            "Volatile"
        };
        Self {
            index,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarginRisk {
    Competitive,
    Moderate,
    #[serde(rename = "Blowout Risk", alias = "BlowoutRisk")]
    BlowoutRisk,
}

impl MarginRisk {
    pub fn label(self) -> &'static str {
        match self {
            MarginRisk::Competitive => "Competitive",
            MarginRisk::Moderate => "Moderate",
            MarginRisk::BlowoutRisk => "Blowout Risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Call {
    Over,
    Under,
    Pass,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Call::Over => "OVER",
            Call::Under => "UNDER",
            Call::Pass => "PASS",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLabel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
    Warning,
}

impl Polarity {
    pub fn icon(self) -> &'static str {
        match self {
            Polarity::Positive => "✓",
            Polarity::Negative => "✗",
            Polarity::Neutral => "•",
            Polarity::Warning => "⚠",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonEntry {
    pub icon: String,
    pub text: String,
    pub polarity: Polarity,
}

impl ReasonEntry {
    fn new(polarity: Polarity, text: impl Into<String>) -> Self {
        Self {
            icon: polarity.icon().to_string(),
            text: text.into(),
            polarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub call: Call,
    pub confidence: i32,
    pub confidence_label: ConfidenceLabel,
    pub reason: String,
    pub reasoning: Vec<ReasonEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Statuses {
    ft_points: DriverStatus,
    paint_points: DriverStatus,
    efg: DriverStatus,
}

impl Statuses {
    fn all(&self) -> [DriverStatus; 3] {
        [self.ft_points, self.paint_points, self.efg]
    }

    fn count(&self, status: DriverStatus) -> usize {
        self.all().iter().filter(|s| **s == status).count()
    }
}

/// Context the PASS rules look at.
struct PassContext {
    greens: usize,
    yellows: usize,
    reds: usize,
    low_tier: bool,
    volatility: f64,
    pass_volatility_above: f64,
}

type PassRule = fn(&PassContext) -> bool;

/// Checked after OVER/UNDER and take precedence; first match names the reason.
const PASS_RULES: [(PassRule, &str); 3] = [
    (|c| c.yellows >= 2, "too many neutral drivers"),
    (|c| c.greens >= 1 && c.reds >= 1, "drivers point in opposite directions"),
    (
        |c| c.low_tier && c.volatility > c.pass_volatility_above,
        "unproven archetype in a volatile spot",
    ),
];

/// Turn the live drivers plus optional context into an OVER/UNDER/PASS call.
///
/// Total over its inputs: absent drivers count as yellow, absent volatility
/// uses the configured default index, absent margin risk is treated as not a
/// blowout, and absent archetype context adds no adjustment. Reasoning keeps
/// generation order (base signal, archetype, margin, volatility, mixed-signal
/// penalty, driver notes) and is cut to `max_reasons` entries.
pub fn make_decision(
    drivers: &DriverSet,
    archetype: Option<&ArchetypeContext>,
    volatility: Option<&Volatility>,
    margin: Option<MarginRisk>,
    cfg: &ModelConfig,
) -> Decision {
    let d = &cfg.decision;
    let statuses = Statuses {
        ft_points: resolve(drivers.ft_points.as_ref(), &cfg.drivers.ft_points),
        paint_points: resolve(drivers.paint_points.as_ref(), &cfg.drivers.paint_points),
        efg: resolve(drivers.efg.as_ref(), &cfg.drivers.efg),
    };
    let greens = statuses.count(DriverStatus::Green);
    let yellows = statuses.count(DriverStatus::Yellow);
    let reds = statuses.count(DriverStatus::Red);

    let vol_index = volatility
        .map(|v| v.index)
        .filter(|v| v.is_finite())
        .unwrap_or(d.default_volatility);
    let blowout = margin == Some(MarginRisk::BlowoutRisk);
    let low_tier = archetype.is_some_and(|a| a.tier == ConfidenceTier::Low);

    let leans_over = greens >= 2;
    let over = leans_over && !blowout;
    let under = reds >= 2 && statuses.ft_points != DriverStatus::Green;

    let pass_ctx = PassContext {
        greens,
        yellows,
        reds,
        low_tier,
        volatility: vol_index,
        pass_volatility_above: d.pass_volatility_above,
    };
    let pass_reason = PASS_RULES
        .iter()
        .find(|(rule, _)| rule(&pass_ctx))
        .map(|(_, reason)| *reason);

    let call = match (pass_reason, over, under) {
        (Some(_), _, _) => Call::Pass,
        (None, true, _) => Call::Over,
        (None, false, true) => Call::Under,
        (None, false, false) => Call::Pass,
    };

    let mut reasoning = Vec::new();
    let (mut confidence, reason) = match call {
        Call::Over => {
            let text = format!("{greens} of 3 drivers green");
            reasoning.push(ReasonEntry::new(Polarity::Positive, format!("{text}: OVER signal")));
            (d.signal_base + d.per_matching_driver * greens as i32, text)
        }
        Call::Under => {
            let text = format!("{reds} of 3 drivers red");
            reasoning.push(ReasonEntry::new(Polarity::Positive, format!("{text}: UNDER signal")));
            (d.signal_base + d.per_matching_driver * reds as i32, text)
        }
        Call::Pass => {
            let text = match pass_reason {
                Some(r) => r.to_string(),
                None if leans_over && blowout => "blowout risk blocks the OVER".to_string(),
                None => "no clear driver signal".to_string(),
            };
            reasoning.push(ReasonEntry::new(Polarity::Neutral, format!("No bet: {text}")));
            (d.pass_base, text)
        }
    };

    if let Some(a) = archetype {
        confidence += archetype_adjustment(a, call, d, &mut reasoning);
    }

    confidence += margin_adjustment(margin, call, leans_over, d, &mut reasoning);

    if vol_index > d.high_volatility_above {
        confidence -= d.high_volatility_penalty;
        reasoning.push(ReasonEntry::new(
            Polarity::Warning,
            format!("High volatility ({vol_index:.1}/10)"),
        ));
    } else if vol_index <= d.low_volatility_at_most {
        confidence += d.low_volatility_bonus;
        reasoning.push(ReasonEntry::new(
            Polarity::Positive,
            format!("Low volatility ({vol_index:.1}/10)"),
        ));
    }

    if (greens >= 2 && reds >= 1) || (reds >= 2 && greens >= 1) {
        confidence -= d.mixed_signal_penalty;
        reasoning.push(ReasonEntry::new(
            Polarity::Warning,
            format!("Mixed signals: {greens} green vs {reds} red"),
        ));
    }

    driver_notes(drivers, &statuses, call, &mut reasoning);

    // An inverted range resolves to the ceiling rather than panicking.
    let confidence = confidence.max(d.min_confidence).min(d.max_confidence);
    reasoning.truncate(d.max_reasons);

    Decision {
        call,
        confidence,
        confidence_label: confidence_label(confidence, d),
        reason: format!("{call}: {reason}"),
        reasoning,
    }
}

fn archetype_adjustment(
    a: &ArchetypeContext,
    call: Call,
    d: &DecisionConfig,
    reasoning: &mut Vec<ReasonEntry>,
) -> i32 {
    let name = if a.label.is_empty() { "Matchup" } else { a.label.as_str() };
    let supports = matches!(
        (a.favor, call),
        (ArchetypeFavor::OverFavorable, Call::Over) | (ArchetypeFavor::UnderFavorable, Call::Under)
    );
    if a.tier == ConfidenceTier::High && supports {
        reasoning.push(ReasonEntry::new(
            Polarity::Positive,
            format!("{name} archetype favors the {call}"),
        ));
        d.archetype_bonus
    } else if a.tier == ConfidenceTier::Low {
        reasoning.push(ReasonEntry::new(
            Polarity::Warning,
            format!("{name} archetype is low confidence (n={})", a.sample_size),
        ));
        -d.low_tier_penalty
    } else {
        reasoning.push(ReasonEntry::new(
            Polarity::Neutral,
            format!("{name} archetype adds no lean"),
        ));
        0
    }
}

fn margin_adjustment(
    margin: Option<MarginRisk>,
    call: Call,
    leans_over: bool,
    d: &DecisionConfig,
    reasoning: &mut Vec<ReasonEntry>,
) -> i32 {
    match margin {
        Some(MarginRisk::BlowoutRisk) if call == Call::Over || leans_over => {
            reasoning.push(ReasonEntry::new(
                Polarity::Negative,
                "Blowout risk: starters may sit late",
            ));
            -d.blowout_over_penalty
        }
        Some(MarginRisk::BlowoutRisk) if call == Call::Under => {
            reasoning.push(ReasonEntry::new(
                Polarity::Positive,
                "Blowout risk supports a slower finish",
            ));
            d.blowout_under_bonus
        }
        Some(MarginRisk::BlowoutRisk) => {
            reasoning.push(ReasonEntry::new(Polarity::Warning, "Blowout risk"));
            0
        }
        Some(MarginRisk::Competitive) => {
            reasoning.push(ReasonEntry::new(Polarity::Neutral, "Competitive margin expected"));
            0
        }
        Some(MarginRisk::Moderate) => {
            reasoning.push(ReasonEntry::new(Polarity::Neutral, "Moderate margin risk"));
            0
        }
        None => 0,
    }
}

fn driver_notes(drivers: &DriverSet, statuses: &Statuses, call: Call, reasoning: &mut Vec<ReasonEntry>) {
    let wanted = match call {
        Call::Over => DriverStatus::Green,
        Call::Under => DriverStatus::Red,
        Call::Pass => return,
    };
    let notes = [
        ("FT points", drivers.ft_points.as_ref(), statuses.ft_points),
        ("Paint points", drivers.paint_points.as_ref(), statuses.paint_points),
    ];
    for (name, driver, status) in notes {
        if status != wanted {
            continue;
        }
        let text = match driver.and_then(|d| d.value) {
            Some(v) => format!("{name} projected at {v:.1}"),
            None => format!("{name} driver {}", status_word(status)),
        };
        reasoning.push(ReasonEntry::new(Polarity::Positive, text));
    }
}

fn status_word(status: DriverStatus) -> &'static str {
    match status {
        DriverStatus::Green => "green",
        DriverStatus::Yellow => "yellow",
        DriverStatus::Red => "red",
    }
}

pub fn confidence_label(confidence: i32, d: &DecisionConfig) -> ConfidenceLabel {
    if confidence >= d.high_label_at {
        ConfidenceLabel::High
    } else if confidence >= d.medium_label_at {
        ConfidenceLabel::Medium
    } else {
        ConfidenceLabel::Low
    }
}

/// One game's inputs as a UI or a JSON file hands them over. Every field
/// may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecisionCase {
    pub drivers: DriverSet,
    pub archetype: Option<ArchetypeContext>,
    pub volatility: Option<Volatility>,
    pub margin_risk: Option<MarginRisk>,
}

impl DecisionCase {
    pub fn decide(&self, cfg: &ModelConfig) -> Decision {
        make_decision(
            &self.drivers,
            self.archetype.as_ref(),
            self.volatility.as_ref(),
            self.margin_risk,
            cfg,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ModelConfig {
        ModelConfig::default()
    }

    fn drivers(ft: f64, paint: f64, efg: f64) -> DriverSet {
        DriverSet::from_values(Some(ft), Some(paint), Some(efg), &cfg().drivers)
    }

    #[test]
    fn driver_thresholds_are_two_sided() {
        let t = DriverThresholds::default();
        assert_eq!(classify_driver(Some(38.0), &t.ft_points), DriverStatus::Green);
        assert_eq!(classify_driver(Some(37.9), &t.ft_points), DriverStatus::Yellow);
        assert_eq!(classify_driver(Some(33.0), &t.ft_points), DriverStatus::Yellow);
        assert_eq!(classify_driver(Some(32.9), &t.ft_points), DriverStatus::Red);
        assert_eq!(classify_driver(None, &t.ft_points), DriverStatus::Yellow);
        assert_eq!(classify_driver(Some(f64::NAN), &t.efg), DriverStatus::Yellow);
    }

    #[test]
    fn carried_status_is_used_without_value() {
        let set = DriverSet {
            ft_points: Some(Driver {
                value: None,
                status: DriverStatus::Green,
                target: String::new(),
            }),
            paint_points: Some(Driver {
                value: None,
                status: DriverStatus::Green,
                target: String::new(),
            }),
            efg: None,
        };
        let decision = make_decision(&set, None, None, None, &cfg());
        assert_eq!(decision.call, Call::Over);
        assert_eq!(decision.confidence, 70);
    }

    #[test]
    fn under_blocked_when_free_throws_run_hot() {
        let decision = make_decision(&drivers(40.0, 50.0, 50.0), None, None, None, &cfg());
        // One green plus two reds is mixed: PASS wins.
        assert_eq!(decision.call, Call::Pass);
    }

    #[test]
    fn blowout_blocks_two_green_over() {
        let set = drivers(40.0, 70.0, 55.0);
        let competitive = make_decision(&set, None, None, Some(MarginRisk::Competitive), &cfg());
        let blowout = make_decision(&set, None, None, Some(MarginRisk::BlowoutRisk), &cfg());
        assert_eq!(competitive.call, Call::Over);
        assert_eq!(competitive.confidence, 70);
        assert_eq!(blowout.call, Call::Pass);
        assert_eq!(blowout.confidence, 30);
        assert!(blowout.reasoning.iter().any(|r| r.polarity == Polarity::Negative));
    }

    #[test]
    fn blowout_helps_under() {
        let set = drivers(30.0, 55.0, 50.0);
        let base = make_decision(&set, None, None, Some(MarginRisk::Competitive), &cfg());
        let blowout = make_decision(&set, None, None, Some(MarginRisk::BlowoutRisk), &cfg());
        assert_eq!(base.call, Call::Under);
        assert_eq!(blowout.confidence, base.confidence + 5);
    }

    #[test]
    fn volatility_adjusts_both_ways() {
        let set = drivers(40.0, 70.0, 60.0);
        let calm = make_decision(&set, None, Some(&Volatility::from_index(2.0)), None, &cfg());
        let wild = make_decision(&set, None, Some(&Volatility::from_index(8.0)), None, &cfg());
        assert_eq!(calm.confidence, 80);
        assert_eq!(wild.confidence, 65);
    }

    #[test]
    fn low_tier_in_volatile_spot_passes() {
        let set = drivers(40.0, 70.0, 60.0);
        let arch = ArchetypeContext {
            label: "Low TO / High OREB / High FTr".to_string(),
            tier: ConfidenceTier::Low,
            sample_size: 4,
            favor: ArchetypeFavor::OverFavorable,
        };
        let decision = make_decision(&set, Some(&arch), Some(&Volatility::from_index(5.5)), None, &cfg());
        assert_eq!(decision.call, Call::Pass);
        assert!(decision.reason.contains("volatile"));
    }

    #[test]
    fn labels_follow_thresholds() {
        let d = DecisionConfig::default();
        assert_eq!(confidence_label(75, &d), ConfidenceLabel::High);
        assert_eq!(confidence_label(74, &d), ConfidenceLabel::Medium);
        assert_eq!(confidence_label(60, &d), ConfidenceLabel::Medium);
        assert_eq!(confidence_label(59, &d), ConfidenceLabel::Low);
    }

    #[test]
    fn reasoning_is_capped_in_generation_order() {
        let set = drivers(45.0, 75.0, 50.0);
        let arch = ArchetypeContext {
            label: "Low TO / High OREB / High FTr".to_string(),
            tier: ConfidenceTier::Medium,
            sample_size: 30,
            favor: ArchetypeFavor::OverFavorable,
        };
        let mut config = cfg();
        config.decision.max_reasons = 3;
        let decision = make_decision(
            &set,
            Some(&arch),
            Some(&Volatility::from_index(9.0)),
            Some(MarginRisk::Competitive),
            &config,
        );
        assert_eq!(decision.reasoning.len(), 3);
        assert!(decision.reasoning[0].text.contains("drivers"));
        assert!(decision.reasoning[1].text.contains("archetype"));
        assert!(decision.reasoning[2].text.contains("Competitive"));
    }

    #[test]
    fn serializes_for_the_ui() {
        let decision = make_decision(&drivers(40.0, 70.0, 60.0), None, None, None, &cfg());
        let json = serde_json::to_value(&decision).expect("serialize decision");
        assert_eq!(json["call"], "OVER");
        assert_eq!(json["confidenceLabel"], "HIGH");
        assert_eq!(json["reasoning"][0]["polarity"], "positive");
    }

    #[test]
    fn volatility_label_follows_a_bare_index() {
        let v: Volatility = serde_json::from_str(r#"{ "index": 9 }"#).expect("parse");
        assert_eq!(v, Volatility::from_index(9.0));
        assert_eq!(v.label, "Volatile");

        let calm: Volatility = serde_json::from_str(r#"{ "index": 2.5 }"#).expect("parse");
        assert_eq!(calm.label, "Stable");

        let empty: Volatility = serde_json::from_str("{}").expect("parse");
        assert_eq!(empty, Volatility::default());

        let named: Volatility =
            serde_json::from_str(r#"{ "index": 9, "label": "Erratic" }"#).expect("parse");
        assert_eq!(named.label, "Erratic");

        let case: DecisionCase =
            serde_json::from_str(r#"{ "volatility": { "index": 8 } }"#).expect("parse case");
        assert_eq!(case.volatility.map(|v| v.label).as_deref(), Some("Volatile"));
    }
}
