use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "HOOPS_CONFIG";

/// Every tunable threshold and weight used by the classifiers, the pattern
/// analyzer and the decision engine. Missing keys in a config file keep their
/// defaults, so a file only needs to list the values being tuned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub opportunity: OpportunityConfig,
    pub buckets: BucketConfig,
    pub environment: EnvironmentThresholds,
    pub props: PropThresholds,
    pub drivers: DriverThresholds,
    pub decision: DecisionConfig,
    pub severe_failure: SevereFailureThresholds,
    pub sanity: SanityConfig,
    pub matchup: MatchupConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    MinMax,
    Percentile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityConfig {
    // Points-per-trip proxy for a free-throw attempt.
    pub fta_weight: f64,
    pub turnover_weight: f64,
    pub oreb_weight: f64,
    pub ftr_weight: f64,
    pub normalization: NormalizationMode,
}

impl Default for OpportunityConfig {
    fn default() -> Self {
        Self {
            fta_weight: 0.44,
            turnover_weight: 0.40,
            oreb_weight: 0.30,
            ftr_weight: 0.30,
            normalization: NormalizationMode::MinMax,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    pub opportunity_buckets: usize,
    pub pace_matchup_buckets: usize,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            opportunity_buckets: 5,
            pace_matchup_buckets: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentThresholds {
    pub ft_driven_ftr: f64,
    pub rebound_heavy_oreb_pct: f64,
    pub assist_heavy_assists: f64,
    pub grind_max_pace: f64,
    pub grind_max_ppp: f64,
    pub shootout_min_pace: f64,
    pub shootout_min_ppp: f64,
}

impl Default for EnvironmentThresholds {
    fn default() -> Self {
        Self {
            ft_driven_ftr: 30.0,
            rebound_heavy_oreb_pct: 30.0,
            assist_heavy_assists: 28.0,
            grind_max_pace: 96.0,
            grind_max_ppp: 1.05,
            shootout_min_pace: 102.0,
            shootout_min_ppp: 1.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropThresholds {
    pub high_scoring_min_pace: f64,
    pub high_scoring_min_rating: f64,
    pub high_assists_min: f64,
    pub high_rebounds_oreb_pct: f64,
    pub high_rebounds_fast_pace: f64,
    pub high_rebounds_fast_oreb_pct: f64,
    pub high_ft_volume_ftr: f64,
}

impl Default for PropThresholds {
    fn default() -> Self {
        Self {
            high_scoring_min_pace: 102.0,
            high_scoring_min_rating: 115.0,
            high_assists_min: 27.0,
            high_rebounds_oreb_pct: 28.0,
            high_rebounds_fast_pace: 100.0,
            high_rebounds_fast_oreb_pct: 25.0,
            high_ft_volume_ftr: 28.0,
        }
    }
}

/// Green at or above `green`, red strictly below `red`, yellow in between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cutoffs {
    pub green: f64,
    pub red: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverThresholds {
    pub ft_points: Cutoffs,
    pub paint_points: Cutoffs,
    pub efg: Cutoffs,
}

impl Default for DriverThresholds {
    fn default() -> Self {
        Self {
            ft_points: Cutoffs {
                green: 38.0,
                red: 33.0,
            },
            paint_points: Cutoffs {
                green: 68.0,
                red: 60.0,
            },
            efg: Cutoffs {
                green: 59.0,
                red: 53.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub signal_base: i32,
    pub per_matching_driver: i32,
    pub pass_base: i32,
    pub archetype_bonus: i32,
    pub low_tier_penalty: i32,
    pub blowout_over_penalty: i32,
    pub blowout_under_bonus: i32,
    pub high_volatility_above: f64,
    pub high_volatility_penalty: i32,
    pub low_volatility_at_most: f64,
    pub low_volatility_bonus: i32,
    pub pass_volatility_above: f64,
    pub mixed_signal_penalty: i32,
    pub default_volatility: f64,
    pub min_confidence: i32,
    pub max_confidence: i32,
    pub high_label_at: i32,
    pub medium_label_at: i32,
    pub max_reasons: usize,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            signal_base: 60,
            per_matching_driver: 5,
            pass_base: 40,
            archetype_bonus: 10,
            low_tier_penalty: 5,
            blowout_over_penalty: 15,
            blowout_under_bonus: 5,
            high_volatility_above: 6.0,
            high_volatility_penalty: 10,
            low_volatility_at_most: 3.0,
            low_volatility_bonus: 5,
            pass_volatility_above: 5.0,
            mixed_signal_penalty: 10,
            default_volatility: 5.0,
            min_confidence: 30,
            max_confidence: 95,
            high_label_at: 75,
            medium_label_at: 60,
            max_reasons: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SevereFailureThresholds {
    pub min_opportunity_diff: f64,
    pub min_conversion_score: f64,
    pub min_ppp_advantage: f64,
}

impl Default for SevereFailureThresholds {
    fn default() -> Self {
        Self {
            min_opportunity_diff: 5.0,
            min_conversion_score: 65.0,
            min_ppp_advantage: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanityConfig {
    pub min_pace: f64,
    pub max_pace: f64,
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            min_pace: 85.0,
            max_pace: 115.0,
        }
    }
}

/// Cut points used when turning two season profiles into decision context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchupConfig {
    /// Games the smaller sample needs before an archetype read is trusted.
    pub high_tier_games: usize,
    pub medium_tier_games: usize,
    /// Net-rating gaps (points per 100) that mark a lopsided matchup.
    pub blowout_net_gap: f64,
    pub moderate_net_gap: f64,
    /// Game-total standard deviation that maps to a volatility index of zero.
    pub calm_total_sd: f64,
    /// Standard-deviation points per volatility index point.
    pub sd_per_volatility_point: f64,
}

impl Default for MatchupConfig {
    fn default() -> Self {
        Self {
            high_tier_games: 20,
            medium_tier_games: 10,
            blowout_net_gap: 10.0,
            moderate_net_gap: 5.0,
            calm_total_sd: 10.0,
            sd_per_volatility_point: 2.0,
        }
    }
}

impl SanityConfig {
    pub fn pace_is_plausible(&self, pace: f64) -> bool {
        pace.is_finite() && pace >= self.min_pace && pace <= self.max_pace
    }
}

impl ModelConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read model config {}", path.display()))?;
        let config: ModelConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parse model config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$HOOPS_CONFIG` when set, otherwise fall back to defaults.
    pub fn load_or_default() -> Result<Self> {
        match config_path_from_env() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("serialize model config")?;
        fs::write(&tmp, json).context("write model config")?;
        fs::rename(&tmp, path).context("swap model config")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let o = &self.opportunity;
        let weight_sum = o.turnover_weight + o.oreb_weight + o.ftr_weight;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(anyhow!(
                "conversion weights must sum to 1.0 (got {weight_sum:.4})"
            ));
        }
        if o.turnover_weight < 0.0 || o.oreb_weight < 0.0 || o.ftr_weight < 0.0 {
            return Err(anyhow!("conversion weights must be non-negative"));
        }
        if self.buckets.opportunity_buckets == 0 || self.buckets.pace_matchup_buckets == 0 {
            return Err(anyhow!("bucket counts must be at least 1"));
        }
        for (name, cut) in [
            ("ft_points", self.drivers.ft_points),
            ("paint_points", self.drivers.paint_points),
            ("efg", self.drivers.efg),
        ] {
            if cut.red > cut.green {
                return Err(anyhow!(
                    "driver {name}: red cutoff {} above green cutoff {}",
                    cut.red,
                    cut.green
                ));
            }
        }
        let d = &self.decision;
        if d.min_confidence > d.max_confidence {
            return Err(anyhow!(
                "confidence floor {} above ceiling {}",
                d.min_confidence,
                d.max_confidence
            ));
        }
        if d.medium_label_at > d.high_label_at {
            return Err(anyhow!("MEDIUM label cutoff above HIGH cutoff"));
        }
        if self.sanity.min_pace >= self.sanity.max_pace {
            return Err(anyhow!("sanity pace range is empty"));
        }
        if !o.fta_weight.is_finite() || o.fta_weight < 0.0 {
            return Err(anyhow!("fta_weight must be a non-negative number"));
        }
        let m = &self.matchup;
        if m.medium_tier_games > m.high_tier_games {
            return Err(anyhow!("matchup MEDIUM tier needs more games than HIGH"));
        }
        if m.moderate_net_gap > m.blowout_net_gap {
            return Err(anyhow!(
                "matchup moderate gap {} above blowout gap {}",
                m.moderate_net_gap,
                m.blowout_net_gap
            ));
        }
        if !m.sd_per_volatility_point.is_finite() || m.sd_per_volatility_point <= 0.0 {
            return Err(anyhow!("sd_per_volatility_point must be positive"));
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    let raw = std::env::var(CONFIG_ENV).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ModelConfig::default().validate().expect("defaults are valid");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let raw = r#"{ "drivers": { "ft_points": { "green": 40.0, "red": 34.0 } } }"#;
        let cfg: ModelConfig = serde_json::from_str(raw).expect("partial config parses");
        assert_eq!(cfg.drivers.ft_points.green, 40.0);
        assert_eq!(cfg.drivers.paint_points.green, 68.0);
        assert_eq!(cfg.opportunity.fta_weight, 0.44);
        assert_eq!(cfg.buckets.opportunity_buckets, 5);
    }

    #[test]
    fn rejects_unbalanced_weights() {
        let mut cfg = ModelConfig::default();
        cfg.opportunity.turnover_weight = 0.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_driver_cutoffs() {
        let mut cfg = ModelConfig::default();
        cfg.drivers.efg = Cutoffs {
            green: 50.0,
            red: 55.0,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_matchup_cut_points() {
        let mut cfg = ModelConfig::default();
        cfg.matchup.moderate_net_gap = 12.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ModelConfig::default();
        cfg.matchup.medium_tier_games = 25;
        assert!(cfg.validate().is_err());

        let mut cfg = ModelConfig::default();
        cfg.matchup.sd_per_volatility_point = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("hoops_edge_cfg_{}", std::process::id()));
        let path = dir.join("model.json");
        let mut cfg = ModelConfig::default();
        cfg.environment.ft_driven_ftr = 32.5;
        cfg.matchup.blowout_net_gap = 12.0;
        cfg.save(&path).expect("save config");
        let loaded = ModelConfig::load(&path).expect("load config");
        assert_eq!(loaded, cfg);
        let _ = fs::remove_dir_all(dir);
    }
}
