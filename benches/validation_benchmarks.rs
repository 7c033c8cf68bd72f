//! Validation Pipeline Benchmarks
//!
//! Run with: cargo bench
//! View reports: target/criterion/report/index.html

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rdf_validation_pipeline::Validator;
use rdf_validation_pipeline::config::SemanticConfig;
use rdf_validation_pipeline::ontology::ShapeValidator;
use rdf_validation_pipeline::syntax::parse_store;

const SHAPES: &str = include_str!("../tests/fixtures/article_shapes.ttl");

/// `count` articles, each mentioning one organization.
fn generate_articles(count: usize) -> String {
    let mut doc = String::from(
        "@prefix art: <http://data.example.org/article/> .
@prefix ex: <http://schema.example.org/> .
@prefix dcterms: <http://purl.org/dc/terms/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
",
    );
    for i in 0..count {
        doc.push_str(&format!(
            "art:{i} a ex:Article ;
    dcterms:title \"Article {i}\"@en ;
    dcterms:created \"2024-03-18\"^^xsd:date ;
    ex:mentions ex:org{i} .
ex:org{i} a ex:Organization ;
    ex:emtakCode <http://data.example.org/emtak/{code}> .
",
            code = 10000 + i % 90000
        ));
    }
    doc
}

fn bench_syntax(c: &mut Criterion) {
    let validator = Validator::default();
    let mut group = c.benchmark_group("syntax");

    for size in [10, 100, 1000] {
        let doc = generate_articles(size);
        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::new("validate_syntax", size), &doc, |b, doc| {
            b.iter(|| validator.validate_syntax(black_box(doc)))
        });
        group.bench_with_input(BenchmarkId::new("quick_syntax_check", size), &doc, |b, doc| {
            b.iter(|| validator.quick_syntax_check(black_box(doc)))
        });
    }

    group.finish();
}

fn bench_semantic(c: &mut Criterion) {
    let mut group = c.benchmark_group("semantic");
    let config = SemanticConfig::default();

    let Ok(shape_validator) = ShapeValidator::from_turtle(SHAPES, &config) else {
        panic!("benchmark shapes must load");
    };

    for size in [10, 100, 1000] {
        let Ok(store) = parse_store(&generate_articles(size), "bench") else {
            panic!("benchmark data must parse");
        };
        group.bench_with_input(BenchmarkId::new("precompiled_shapes", size), &store, |b, store| {
            b.iter(|| shape_validator.validate(black_box(store)))
        });
    }

    group.finish();
}

fn bench_full(c: &mut Criterion) {
    let validator = Validator::default();
    let mut group = c.benchmark_group("full");
    let doc = generate_articles(100);

    group.bench_function("validate_full", |b| {
        b.iter(|| validator.validate_full(black_box(&doc), Some(SHAPES)))
    });
    group.bench_function("validate_document", |b| {
        b.iter(|| validator.validate_document(black_box(&doc), Some(SHAPES)))
    });

    group.finish();
}

criterion_group!(benches, bench_syntax, bench_semantic, bench_full);
criterion_main!(benches);
