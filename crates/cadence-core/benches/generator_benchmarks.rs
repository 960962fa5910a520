use cadence_core::models::{EndCondition, NewRuleData, RecurrencePattern, SchedulerConfig};
use cadence_core::recurrence::OccurrenceGenerator;
use cadence_core::scheduler::{HorizonMaintenance, RuleLifecycle, Scheduler};
use cadence_core::store::MemoryStore;
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
}

fn patterns() -> Vec<(&'static str, RecurrencePattern, u32)> {
    vec![
        ("daily", RecurrencePattern::Daily, 1),
        ("weekly_set", RecurrencePattern::weekly([0, 2, 4]), 1),
        ("weekly_every_3", RecurrencePattern::weekly([1, 5]), 3),
        ("monthly_31", RecurrencePattern::Monthly { day_of_month: Some(31) }, 1),
        ("yearly_leap", RecurrencePattern::Yearly { month_of_year: Some(2), day_of_month: Some(29) }, 1),
    ]
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for (name, pattern, interval) in patterns() {
        let generator = OccurrenceGenerator::new(pattern, interval, EndCondition::Never);
        for count in [10usize, 100, 1000] {
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, &count| {
                b.iter(|| generator.generate(black_box(anchor()), black_box(count)))
            });
        }
    }

    group.finish();
}

fn bench_random_anchors(c: &mut Criterion) {
    let generator = OccurrenceGenerator::new(RecurrencePattern::Monthly { day_of_month: Some(31) }, 1, EndCondition::Never);
    let mut rng = fastrand::Rng::with_seed(7);
    let anchors: Vec<NaiveDate> = (0..256)
        .map(|_| anchor() + chrono::Duration::days(rng.i64(0..20_000)))
        .collect();

    c.bench_function("generate_random_anchors", |b| {
        b.iter(|| {
            for anchor in &anchors {
                black_box(generator.generate(*anchor, 12));
            }
        })
    });
}

fn bench_end_date_filter(c: &mut Criterion) {
    let end = EndCondition::OnDate {
        end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
    };
    let generator = OccurrenceGenerator::new(RecurrencePattern::Daily, 1, end);

    c.bench_function("generate_with_end_date", |b| {
        b.iter(|| generator.generate(black_box(anchor()), black_box(500)))
    });
}

fn bench_horizon_pass(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    let mut group = c.benchmark_group("horizon_pass");
    for rules in [10usize, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(rules), &rules, |b, &rules| {
            b.iter(|| {
                rt.block_on(async {
                    let mut scheduler = Scheduler::new(MemoryStore::new(), SchedulerConfig::default());
                    for (i, (_, pattern, interval)) in patterns().into_iter().cycle().take(rules).enumerate() {
                        let mut data = NewRuleData::new(format!("rule {}", i), anchor(), pattern);
                        data.interval = interval;
                        scheduler.create_rule(data).await.expect("create");
                    }
                    black_box(scheduler.ensure_horizon_at(anchor()).await.expect("horizon"))
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generate, bench_random_anchors, bench_end_date_filter, bench_horizon_pass);
criterion_main!(benches);
