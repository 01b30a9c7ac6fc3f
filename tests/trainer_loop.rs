mod common;

use common::{MockNetwork, Reconstruction, ScriptedDataset};
use denoising_trainer::{DataDims, Error, NoisyTrainer, TrainerConfig};

fn config() -> TrainerConfig {
    TrainerConfig {
        batch_size: 2,
        seed: Some(1),
        ..TrainerConfig::default()
    }
}

fn trainer(
    config: TrainerConfig,
) -> NoisyTrainer<MockNetwork, ScriptedDataset> {
    let dims = DataDims::new(3, 3, 1);
    NoisyTrainer::new(
        MockNetwork::new(Reconstruction::Identity),
        ScriptedDataset::new(dims),
        config,
    )
    .unwrap()
}

#[test]
fn periodic_actions_follow_iteration_count() {
    for iterations in [1usize, 20, 21, 499, 500, 501, 1001] {
        let mut trainer = trainer(config());
        let report = trainer.train_for(iterations).unwrap();

        assert_eq!(report.iterations, iterations);
        assert_eq!(
            trainer.network().visualize_steps.len(),
            iterations.div_ceil(500),
            "visualize calls for {iterations} iterations"
        );
        assert_eq!(report.losses.len(), iterations.div_ceil(20));
        assert_eq!(report.test_errors.len(), iterations.div_ceil(500));
        assert_eq!(trainer.network().train_calls, iterations);
    }
}

#[test]
fn visualize_steps_and_records_line_up() {
    let mut trainer = trainer(config());
    let report = trainer.train_for(1001).unwrap();

    assert_eq!(trainer.network().visualize_steps, vec![0, 1, 2]);
    assert_eq!(trainer.epoch(), 2);
    let tested: Vec<usize> = report.test_errors.iter().map(|t| t.iteration).collect();
    assert_eq!(tested, vec![0, 500, 1000]);
    assert_eq!(report.losses[1].iteration, 20);
    assert_eq!(report.losses.last().unwrap().iteration, 1000);
    // five test batches per checkpoint
    assert_eq!(trainer.dataset().test_calls, 15);
    assert_eq!(trainer.network().test_calls, 15);
}

#[test]
fn zero_iterations_do_nothing() {
    let mut trainer = trainer(config());
    let report = trainer.train_for(0).unwrap();
    assert_eq!(report.iterations, 0);
    assert!(report.losses.is_empty());
    assert!(trainer.network().visualize_steps.is_empty());
}

#[test]
fn custom_periods_are_honoured() {
    let mut trainer = trainer(TrainerConfig {
        visualize_every: 10,
        log_every: 3,
        test_batches: 1,
        ..config()
    });
    let report = trainer.train_for(25).unwrap();
    assert_eq!(trainer.network().visualize_steps, vec![0, 1, 2]);
    assert_eq!(report.losses.len(), 9);
    assert_eq!(trainer.dataset().test_calls, 3);
}

#[test]
fn train_uses_max_iterations() {
    let mut trainer = trainer(TrainerConfig {
        max_iterations: 42,
        ..config()
    });
    let report = trainer.train().unwrap();
    assert_eq!(report.iterations, 42);
}

#[test]
fn network_failure_stops_the_loop() {
    let mut network = MockNetwork::new(Reconstruction::Identity);
    network.fail_train_at = Some(7);
    let mut trainer =
        NoisyTrainer::new(network, ScriptedDataset::new(DataDims::new(3, 3, 1)), config())
            .unwrap();

    let err = trainer.train_for(100).unwrap_err();
    assert!(matches!(err, Error::Collaborator(_)));
    assert_eq!(err.to_string(), "network diverged");
    assert_eq!(trainer.network().train_calls, 7);
    assert_eq!(trainer.dataset().train_calls, 8);
}

#[test]
fn wrong_batch_shape_fails_fast() {
    let mut dataset = ScriptedDataset::new(DataDims::new(3, 3, 1));
    dataset.wrong_batch_len = Some(3);
    let mut trainer =
        NoisyTrainer::new(MockNetwork::new(Reconstruction::Identity), dataset, config()).unwrap();

    let err = trainer.train_for(1).unwrap_err();
    assert!(matches!(err, Error::InvalidShape(_)));
    assert_eq!(trainer.network().train_calls, 0);
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let result = NoisyTrainer::new(
        MockNetwork::new(Reconstruction::Identity),
        ScriptedDataset::new(DataDims::new(3, 3, 1)),
        TrainerConfig {
            batch_size: 0,
            ..config()
        },
    );
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn network_trains_on_the_clean_batch_when_denoising_is_off() {
    let mut trainer = trainer(TrainerConfig {
        denoise_train: false,
        ..config()
    });
    let report = trainer.train_for(1).unwrap();
    assert_eq!(report.losses[0].loss, 0.0);
    let seen = trainer.network().last_noisy.clone().unwrap();
    assert!(seen.iter().all(|&v| v == 0.5));
}

#[test]
fn into_parts_hands_back_the_trained_collaborators() {
    let mut trainer = trainer(config());
    trainer.train_for(21).unwrap();

    let (network, dataset) = trainer.into_parts();
    assert_eq!(network.train_calls, 21);
    assert_eq!(network.visualize_steps, vec![0]);
    assert_eq!(dataset.train_calls, 21);
    // one checkpoint, five test batches
    assert_eq!(dataset.test_calls, 5);
}
