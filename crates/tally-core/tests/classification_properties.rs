//! Property checks for classification, dedup and merge over seeded random
//! observation streams.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tally_core::{merge, merge_all, Classifier, DedupRegistry, RunAccumulator, TallyConfig};
use types::{
    BoundaryStatus, CreationProcess, Energy, Position, RunStatistics, Species, StepObservation,
    StepProcess, TrackId, Volume,
};

const VOLUMES: [Volume; 3] = [Volume::Target, Volume::Sensor, Volume::Other];

fn random_observation(rng: &mut StdRng) -> StepObservation {
    let track = TrackId(rng.gen_range(1..40));
    let species = if rng.gen_bool(0.85) {
        Species::SignalQuantum
    } else {
        Species::Carrier
    };

    if rng.gen_bool(0.2) {
        let process = match rng.gen_range(0..3) {
            0 => CreationProcess::Scintillation,
            1 => CreationProcess::Cerenkov,
            _ => CreationProcess::Other,
        };
        return StepObservation::creation(track, species, process, Energy(rng.gen_range(0..4_000_000)));
    }

    let process = match rng.gen_range(0..5) {
        0 => None,
        1 => Some(StepProcess::Absorption),
        2 => Some(StepProcess::Scattering),
        3 => Some(StepProcess::Other),
        _ => Some(StepProcess::Boundary(
            BoundaryStatus::ALL[rng.gen_range(0..BoundaryStatus::COUNT)],
        )),
    };

    let mut obs = StepObservation::new(track, species, Volume::Target)
        .crossing(
            VOLUMES[rng.gen_range(0..VOLUMES.len())],
            VOLUMES[rng.gen_range(0..VOLUMES.len())],
        )
        .at(Position::new(0.0, 0.0, rng.gen_range(-0.3..0.4)))
        .with_energy(Energy(rng.gen_range(0..4_000_000)));
    if rng.gen_bool(0.4) {
        obs = obs.on_boundary();
    }
    if let Some(p) = process {
        obs = obs.with_process(p);
    }
    obs
}

/// Feed `stream` the way the engine would: steps of terminated tracks are
/// never produced. Returns the final counters and how many steps were fed.
fn feed(config: &TallyConfig, stream: &[StepObservation]) -> (RunStatistics, u64) {
    let classifier = Classifier::new(config);
    let mut registry = DedupRegistry::new();
    let mut acc = RunAccumulator::new();
    let mut fed = 0;

    for obs in stream {
        if registry.is_terminated(obs.track) {
            continue;
        }
        let c = classifier.classify(obs, &mut registry).unwrap();
        acc.record(&c).unwrap();
        fed += 1;
    }
    (acc.snapshot(), fed)
}

#[test]
fn every_observation_gets_exactly_one_label() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let stream: Vec<_> = (0..500).map(|_| random_observation(&mut rng)).collect();

        for config in [
            TallyConfig::default(),
            TallyConfig::default().with_kill_on_second_surface(true),
        ] {
            let (stats, fed) = feed(&config, &stream);
            assert_eq!(stats.observations, fed, "seed {seed}");
            assert_eq!(stats.labelled(), fed, "seed {seed}");
            assert_eq!(stats.boundary.total(), stats.boundary_events, "seed {seed}");
            assert!(stats.absorbed_in_target <= stats.absorbed);
        }
    }
}

#[test]
fn exit_face_credit_fires_at_most_once_per_track() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut tracks = HashSet::new();
    let stream: Vec<_> = (0..1_000)
        .map(|_| {
            let track = TrackId(rng.gen_range(1..25));
            tracks.insert(track);
            StepObservation::new(track, Species::SignalQuantum, Volume::Target)
                .crossing(Volume::Target, Volume::Other)
                .at(Position::new(0.0, 0.0, 0.2 + rng.gen_range(-0.05..0.05)))
        })
        .collect();

    let (stats, fed) = feed(&TallyConfig::default(), &stream);

    assert_eq!(fed, 1_000);
    assert_eq!(stats.escaped_exit_face, tracks.len() as u64);
    assert_eq!(stats.unclassified, 1_000 - tracks.len() as u64);
}

#[test]
fn merge_is_order_independent_over_worker_streams() {
    let mut rng = StdRng::seed_from_u64(99);
    let snapshots: Vec<RunStatistics> = (0..6)
        .map(|_| {
            let stream: Vec<_> = (0..200).map(|_| random_observation(&mut rng)).collect();
            feed(&TallyConfig::default(), &stream).0
        })
        .collect();

    let forward = merge_all(snapshots.iter().copied()).unwrap();
    let reverse = merge_all(snapshots.iter().rev().copied()).unwrap();

    // Pairwise tree reduction.
    let mut level = snapshots.clone();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => merge(a, b).unwrap(),
                [a] => *a,
                _ => unreachable!(),
            })
            .collect();
    }

    assert_eq!(forward, reverse);
    assert_eq!(forward, level[0]);
    assert_eq!(
        forward.observations,
        snapshots.iter().map(|s| s.observations).sum::<u64>()
    );
}
