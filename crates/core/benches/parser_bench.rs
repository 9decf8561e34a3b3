use criterion::{criterion_group, criterion_main, Criterion};
use rulekit_core::options::merge_options;
use rulekit_core::parse_applications;
use serde_json::json;
use std::hint::black_box;

fn nested_source() -> String {
    let mut source = String::new();
    for application in 0..4 {
        source.push_str(&format!("<<ap name=App{application}>> "));
        for rule_set in 0..8 {
            source.push_str(&format!("<<rs name=Set{rule_set}>> "));
            for rule in 0..8 {
                source.push_str(&format!("<<ru name=Rule{rule}>> amount > {rule} "));
            }
        }
    }
    source
}

fn bench_parse(c: &mut Criterion) {
    let source = nested_source();
    let options = json!({"region": "eu", "strict": true});
    c.bench_function("parse_applications/nested", |b| {
        b.iter(|| parse_applications(black_box(&source), black_box(&options)).unwrap())
    });
}

fn bench_merge(c: &mut Criterion) {
    let target = json!({
        "limits": {"amount": 100, "count": 5},
        "rule_overrides": [
            {"ref_name": "R1", "options": {"limits": {"amount": 10}}},
            {"ref_name": "R2", "options": {"limits": {"amount": 20}}}
        ]
    });
    let source = json!({
        "limits": {"count": 9},
        "rule_overrides": [
            {"ref_name": "R2", "options": {"limits": {"amount": 25}}},
            {"ref_name": "R3", "options": {"limits": {"amount": 30}}}
        ]
    });
    c.bench_function("merge_options/override_lists", |b| {
        b.iter(|| merge_options(black_box(&target), black_box(&source), true))
    });
}

criterion_group!(benches, bench_parse, bench_merge);
criterion_main!(benches);
