use std::path::Path;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use realm_chronicle::aggregate::simulation::advance_turn;
use realm_chronicle::aggregate::systems::generation::{build_initial_state, NewGameParams};
use realm_chronicle::core::rng::GameRng;
use realm_chronicle::core::types::{Gender, HouseId};
use realm_chronicle::data::loader::load_data_dir;

fn bench_turn(c: &mut Criterion) {
    let data = load_data_dir(&Path::new(env!("CARGO_MANIFEST_DIR")).join("data")).expect("shipped data loads");
    let params = NewGameParams {
        house_id: HouseId::new("stark"),
        gender: Gender::Male,
    };
    let mut group = c.benchmark_group("turn");

    // Worlds aged this many turns before the measured one, so families have grown
    for warmup in [0usize, 40, 120] {
        let mut rng = GameRng::new(1);
        let mut world = build_initial_state(data.gazetteer.clone(), &data.canon, &params, &mut rng).expect("world builds");
        for _ in 0..warmup {
            if advance_turn(&mut world, &mut rng, &data.canon).is_err() {
                break;
            }
        }

        group.bench_with_input(BenchmarkId::new("advance", warmup), &world, |b, world| {
            b.iter_batched(
                || (world.clone(), GameRng::for_turn(world.now())),
                |(mut world, mut rng)| {
                    let _ = advance_turn(&mut world, &mut rng, &data.canon);
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(turn_benches, bench_turn);
criterion_main!(turn_benches);
