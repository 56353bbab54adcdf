use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use hoops_edge::config::ModelConfig;
use hoops_edge::decision::{DecisionCase, make_decision};
use hoops_edge::metrics::derive_all;
use hoops_edge::patterns::{Dataset, run_all};
use hoops_edge::records::TeamGameRecord;
use hoops_edge::synthetic::{SyntheticConfig, generate_season};

fn season() -> Vec<TeamGameRecord> {
    generate_season(&SyntheticConfig::default()).expect("synthetic season")
}

fn bench_derive_metrics(c: &mut Criterion) {
    let records = season();
    let cfg = ModelConfig::default();
    c.bench_function("derive_metrics", |b| {
        b.iter(|| {
            let metrics = derive_all(black_box(&records), &cfg.opportunity);
            black_box(metrics.len());
        })
    });
}

fn bench_dataset_build(c: &mut Criterion) {
    let records = season();
    let cfg = ModelConfig::default();
    c.bench_function("dataset_build", |b| {
        b.iter(|| {
            let ds = Dataset::build(black_box(records.clone()), &cfg);
            black_box(ds.rows().len());
        })
    });
}

fn bench_pattern_battery(c: &mut Criterion) {
    let cfg = ModelConfig::default();
    let ds = Dataset::build(season(), &cfg);
    c.bench_function("pattern_battery", |b| {
        b.iter(|| {
            let report = run_all(black_box(&ds), &cfg);
            black_box(report.opportunity.samples);
        })
    });
}

fn bench_decision(c: &mut Criterion) {
    let cfg = ModelConfig::default();
    let case: DecisionCase = serde_json::from_str(SCENARIO_JSON).expect("valid case json");
    c.bench_function("make_decision", |b| {
        b.iter(|| {
            let d = make_decision(
                black_box(&case.drivers),
                case.archetype.as_ref(),
                case.volatility.as_ref(),
                case.margin_risk,
                &cfg,
            );
            black_box(d.confidence);
        })
    });
}

criterion_group!(
    perf,
    bench_derive_metrics,
    bench_dataset_build,
    bench_pattern_battery,
    bench_decision
);
criterion_main!(perf);

static SCENARIO_JSON: &str = r#"{
    "drivers": {
        "ftPoints": { "value": 41.0 },
        "paintPoints": { "value": 72.0 },
        "efg": { "value": 57.0 }
    },
    "archetype": { "label": "Low TO / High OREB / Med FTr", "tier": "high", "sampleSize": 40, "favor": "over_favorable" },
    "volatility": { "index": 4.0 },
    "marginRisk": "Moderate"
}"#;
