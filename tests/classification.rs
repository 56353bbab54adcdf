use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hoops_edge::bucketing::quantile_buckets;
use hoops_edge::classify::{
    GameShape, PropTag, ScoringEnvironment, prop_tags, scoring_environment,
};
use hoops_edge::config::{EnvironmentThresholds, PropThresholds};
use hoops_edge::metrics::normalize_pct;
use hoops_edge::opportunity::opportunity_edge;

/// Half the time a field lands exactly on (or a hair around) one of the
/// thresholds the classifiers compare against.
fn pick(rng: &mut StdRng, edges: &[f64], lo: f64, hi: f64) -> f64 {
    match rng.gen_range(0..10) {
        0..=4 => {
            let edge = edges[rng.gen_range(0..edges.len())];
            match rng.gen_range(0..3) {
                0 => edge,
                1 => edge - 1e-9,
                _ => edge + 1e-9,
            }
        }
        5 => [0.0, f64::NAN, -1.0, f64::INFINITY][rng.gen_range(0..4)],
        _ => rng.gen_range(lo..hi),
    }
}

fn random_shape(rng: &mut StdRng) -> GameShape {
    GameShape {
        ftr: pick(rng, &[28.0, 30.0], 5.0, 50.0),
        oreb_pct: pick(rng, &[25.0, 28.0, 30.0], 10.0, 45.0),
        assists: pick(rng, &[27.0, 28.0], 10.0, 40.0),
        pace: pick(rng, &[96.0, 100.0, 102.0], 85.0, 115.0),
        ppp: pick(rng, &[1.05, 1.15], 0.8, 1.4),
        off_rating: pick(rng, &[115.0], 90.0, 135.0),
        def_rating: pick(rng, &[115.0], 90.0, 135.0),
    }
}

#[test]
fn environment_is_total_over_random_rows() {
    let t = EnvironmentThresholds::default();
    let mut rng = StdRng::seed_from_u64(2024);
    let mut seen = [0usize; 6];
    for _ in 0..10_000 {
        let env = scoring_environment(&random_shape(&mut rng), &t);
        let idx = ScoringEnvironment::ALL
            .iter()
            .position(|e| *e == env)
            .expect("label is one of the six");
        seen[idx] += 1;
    }
    assert_eq!(seen.iter().sum::<usize>(), 10_000);
    assert!(seen[5] > 0, "some rows fall through to Balanced");
}

#[test]
fn environment_thresholds_are_strict() {
    let t = EnvironmentThresholds::default();
    let at_edges = GameShape {
        ftr: 30.0,
        oreb_pct: 30.0,
        assists: 28.0,
        pace: 96.0,
        ppp: 1.05,
        off_rating: 110.0,
        def_rating: 110.0,
    };
    assert_eq!(scoring_environment(&at_edges, &t), ScoringEnvironment::Balanced);

    let shootout = GameShape {
        pace: 102.5,
        ppp: 1.2,
        ..at_edges
    };
    assert_eq!(scoring_environment(&shootout, &t), ScoringEnvironment::Shootout);

    // Priority: free-throw driven beats everything below it.
    let both = GameShape {
        ftr: 31.0,
        assists: 35.0,
        ..shootout
    };
    assert_eq!(scoring_environment(&both, &t), ScoringEnvironment::FtDriven);
}

#[test]
fn prop_tags_are_independent() {
    let t = PropThresholds::default();
    let shape = GameShape {
        ftr: 20.0,
        oreb_pct: 31.0,
        assists: 30.0,
        pace: 98.0,
        ppp: 1.1,
        off_rating: 112.0,
        def_rating: 108.0,
    };
    let tags = prop_tags(&shape, &t);
    assert!(tags.contains(&PropTag::HighAssists));
    assert!(tags.contains(&PropTag::HighRebounds));
    assert_eq!(tags.len(), 2);

    let mut rng = StdRng::seed_from_u64(77);
    for _ in 0..2_000 {
        let g = random_shape(&mut rng);
        let expected = [
            g.pace > t.high_scoring_min_pace
                && (g.off_rating > t.high_scoring_min_rating
                    || g.def_rating > t.high_scoring_min_rating),
            g.assists > t.high_assists_min,
            g.oreb_pct > t.high_rebounds_oreb_pct
                || (g.pace > t.high_rebounds_fast_pace
                    && g.oreb_pct > t.high_rebounds_fast_oreb_pct),
            g.ftr > t.high_ft_volume_ftr,
        ]
        .iter()
        .filter(|hit| **hit)
        .count();
        assert_eq!(prop_tags(&g, &t).len(), expected);
    }
}

#[test]
fn normalized_rates_stay_in_unit_range() {
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..5_000 {
        let pct = rng.gen_range(0.0..=100.0);
        let frac = rng.gen_range(0.0..=1.0);
        assert!((0.0..=1.0).contains(&normalize_pct(pct)));
        assert!((0.0..=1.0).contains(&normalize_pct(frac)));
    }
    assert_eq!(normalize_pct(43.5), 0.435);
    assert_eq!(normalize_pct(0.435), 0.435);
}

#[test]
fn opportunity_edge_reference_value() {
    let edge = opportunity_edge(10.0, 12.0, 20.0, 0.44);
    assert!((edge - 10.8).abs() < 1e-9);
}

#[test]
fn quintiles_over_992_rows() {
    let keys: Vec<f64> = (0..992).map(|i| 80.0 + i as f64 * 0.03).collect();
    let buckets = quantile_buckets(&keys, 5);
    for b in 0..5 {
        let n = buckets.iter().filter(|x| **x == b).count();
        assert!(n == 198 || n == 199, "bucket {b} holds {n}");
    }
    assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
}
