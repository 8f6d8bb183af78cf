#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use texsearch::keypoint::{CrossCheckMatcher, Descriptor, OrbConfig};
use texsearch::metric::{mse, mse_par};
use texsearch::{ImageView, MetricEngine, OwnedImage, SearchMode, Thresholds};

fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random()).collect()
}

fn descriptors(count: usize, seed: u64) -> Vec<Descriptor> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.random()).collect()
}

#[test]
fn parallel_mse_matches_sequential() {
    let (w, h) = (333, 217);
    let a = noise(w * h, 1);
    let b = noise(w * h, 2);
    let va = ImageView::from_slice(&a, w, h).unwrap();
    let vb = ImageView::from_slice(&b, w, h).unwrap();
    assert_eq!(mse(va, vb).unwrap(), mse_par(va, vb).unwrap());
}

#[test]
fn parallel_matching_matches_sequential() {
    let query = descriptors(300, 3);
    let mut train = descriptors(250, 4);
    // Plant near-duplicates so some pairs pass the distance cut-off.
    for (i, d) in query.iter().take(120).enumerate() {
        let mut copy = *d;
        copy[i % 32] ^= 0x5A;
        train[i * 2] = copy;
    }

    let sequential = CrossCheckMatcher::new(Some(64));
    let parallel = CrossCheckMatcher {
        parallel: true,
        ..CrossCheckMatcher::new(Some(64))
    };
    let seq = sequential.match_descriptors(&query, &train);
    let par = parallel.match_descriptors(&query, &train);
    assert!(seq.len() >= 120);
    assert_eq!(seq, par);
}

#[test]
fn parallel_engine_scores_like_sequential() {
    let (w, h) = (256, 256);
    let key = OwnedImage::new(noise(w * h, 5), w, h).unwrap();
    let candidate = OwnedImage::new(noise(w * h, 6), w, h).unwrap();
    let engine = |parallel| {
        MetricEngine::new(
            SearchMode::HighLowRes,
            Thresholds::default(),
            OrbConfig::default(),
        )
        .with_parallel(parallel)
    };

    let sequential = engine(false);
    let parallel = engine(true);
    let seq_key = sequential.prepare_key("key.png", key.clone());
    let par_key = parallel.prepare_key("key.png", key);
    assert_eq!(
        sequential.score(&seq_key, &candidate).unwrap(),
        parallel.score(&par_key, &candidate).unwrap()
    );
}
