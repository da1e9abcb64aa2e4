use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tagloop::element::ElementId;
use tagloop::history::SessionHistory;
use tagloop::selection::{
    Candidate, ResolveContext, SamplePool, SelectionConfig, SelectionMode, resolve_next,
};

const POOL_SIZE: usize = 50_000;
const HISTORY_SIZE: usize = 500;

fn candidates() -> Vec<Candidate> {
    (0..POOL_SIZE)
        .map(|i| {
            let mut candidate = Candidate::new(format!("e{i}"), format!("element number {i}"));
            candidate.proba.insert("pos".into(), (i % 997) as f64 / 997.0);
            candidate
        })
        .collect()
}

fn history() -> SessionHistory {
    let mut history = SessionHistory::default();
    for i in 0..HISTORY_SIZE {
        history
            .append(ElementId::new(format!("e{}", i * 7)))
            .expect("append");
    }
    history
}

fn bench_resolve(c: &mut Criterion) {
    let pool = candidates();
    let history = history();
    let context = ResolveContext {
        frame: None,
        has_model: true,
    };
    for mode in SelectionMode::METHODS {
        let mut config = SelectionConfig::new(mode, SamplePool::All);
        config.set_label(Some("pos".into()));
        config.set_filter("number 4");
        let mut rng = StdRng::seed_from_u64(3);
        c.bench_with_input(
            BenchmarkId::new("resolve_next", mode.as_str()),
            &pool,
            |b, pool| {
                b.iter(|| {
                    resolve_next(
                        black_box(&config),
                        history.as_slice(),
                        black_box(pool),
                        context,
                        &mut rng,
                    )
                });
            },
        );
    }
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
