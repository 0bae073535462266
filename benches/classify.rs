use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::path::Path;

use mailsort::classifier::Classifier;
use mailsort::model::category::{default_rules, CategoryTable, DEFAULT_FALLBACK};
use mailsort::model::message::MessageId;
use mailsort::parser::mime::{parse_inbound, NO_SUBJECT};

fn load_fixture(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

fn bench_classify(c: &mut Criterion) {
    let classifier = Classifier::new(CategoryTable::new(default_rules(), DEFAULT_FALLBACK));
    let subjects = [
        "Invoice #204 — payment due",
        "Новая ВАКАНСИЯ: senior developer",
        "Приглашение на вечеринку",
        "Quarterly newsletter with nothing in it",
        "Без темы",
    ];

    c.bench_function("classify_subjects", |b| {
        b.iter(|| {
            subjects
                .iter()
                .map(|s| classifier.classify(black_box(s)).len())
                .sum::<usize>()
        })
    });
}

fn bench_parse_inbound(c: &mut Criterion) {
    let raw = load_fixture("invoice.eml");

    c.bench_function("parse_invoice_eml", |b| {
        b.iter(|| {
            let msg = parse_inbound(MessageId(1), black_box(&raw), NO_SUBJECT).unwrap();
            msg.parts().count()
        })
    });
}

criterion_group!(benches, bench_classify, bench_parse_inbound);
criterion_main!(benches);
