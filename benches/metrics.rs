use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use texsearch::keypoint::{OrbConfig, OrbExtractor};
use texsearch::{MetricEngine, OwnedImage, SearchMode, Thresholds};

const SIZE: usize = 1024;

fn make_image(seed: usize) -> OwnedImage {
    let mut data = Vec::with_capacity(SIZE * SIZE);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let value = ((x * 13 + seed) ^ (y * 7) ^ ((x / 32) * (y / 32))) & 0xFF;
            data.push(value as u8);
        }
    }
    OwnedImage::new(data, SIZE, SIZE).unwrap()
}

fn bench_metrics(c: &mut Criterion) {
    let key_image = make_image(0);
    let candidate = make_image(5);

    let mse_engine = MetricEngine::new(
        SearchMode::HighLowRes,
        Thresholds::default(),
        OrbConfig::default(),
    );
    let mse_key = mse_engine.prepare_key("key", key_image.clone());
    c.bench_function("mse_1024", |b| {
        b.iter(|| black_box(mse_engine.score(&mse_key, &candidate).unwrap()));
    });

    let extractor = OrbExtractor::new(OrbConfig::default());
    c.bench_function("orb_extract_1024", |b| {
        b.iter(|| black_box(extractor.extract(&candidate)));
    });

    let orb_engine = MetricEngine::new(
        SearchMode::Compare,
        Thresholds::default(),
        OrbConfig::default(),
    );
    let orb_key = orb_engine.prepare_key("key", key_image);
    c.bench_function("orb_correspondences_1024", |b| {
        b.iter(|| black_box(orb_engine.score(&orb_key, &candidate)));
    });

    if cfg!(feature = "rayon") {
        let par_engine = MetricEngine::new(
            SearchMode::HighLowRes,
            Thresholds::default(),
            OrbConfig::default(),
        )
        .with_parallel(true);
        let par_key = par_engine.prepare_key("key", make_image(0));
        c.bench_function("mse_1024_par", |b| {
            b.iter(|| black_box(par_engine.score(&par_key, &candidate).unwrap()));
        });
    }
}

criterion_group!(benches, bench_metrics);
criterion_main!(benches);
