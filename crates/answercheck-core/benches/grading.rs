use criterion::{black_box, criterion_group, criterion_main, Criterion};

use answercheck_core::model::{GradingRequest, PointValue, Subject};
use answercheck_core::numeric::{match_numeric, NumericMode};
use answercheck_core::variants::split_variants;
use answercheck_core::Grader;

fn bench_grade(c: &mut Criterion) {
    let mut group = c.benchmark_group("grade");
    let grader = Grader::default();

    group.bench_function("ordered_partial", |b| {
        let request = GradingRequest::new("124", "123", PointValue::Two)
            .with_subject(Subject::Chemistry)
            .with_task_number("14");
        b.iter(|| grader.grade(black_box(&request)))
    });

    group.bench_function("unordered_full", |b| {
        let request = GradingRequest::new("54321", "12345", PointValue::Two);
        b.iter(|| grader.grade(black_box(&request)))
    });

    group.bench_function("text_last_variant", |b| {
        let request = GradingRequest::new(
            "Серная Кислота",
            "h2so4 / сульфат ИЛИ купорос / серная кислота",
            PointValue::One,
        );
        b.iter(|| grader.grade(black_box(&request)))
    });

    group.bench_function("empty_answer", |b| {
        let request = GradingRequest::new("   ", "123", PointValue::Two);
        b.iter(|| grader.grade(black_box(&request)))
    });

    group.finish();
}

fn bench_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("components");

    group.bench_function("split_variants", |b| {
        b.iter(|| split_variants(black_box("кислота / acid ИЛИ säure / 12 или 21")))
    });

    group.bench_function("match_numeric_multi_digit", |b| {
        b.iter(|| {
            match_numeric(
                black_box("34, 12; 7"),
                black_box("7,12,34"),
                PointValue::Two,
                false,
                NumericMode::MultiDigitTokens,
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_grade, bench_components);
criterion_main!(benches);
