use anyhow::Result;
use pgrl::util::CartPoleHeuristic;
use pgrl_candle_agent::{
    mlp::{Mlp, MlpConfig},
    reinforce::{Reinforce, ReinforceConfig},
};
use pgrl_classic_env::{CartPoleConfig, CartPoleEnv};
use pgrl_core::{
    record::BufferedRecorder, Agent, Configurable, Env, FrameStack, LastObs, TraceBatch,
    TraceGenerator, Trainer, TrainerConfig,
};
use tempdir::TempDir;

fn build_generator(seed: i64) -> Result<TraceGenerator<CartPoleEnv>> {
    let env = CartPoleEnv::build(&CartPoleConfig::default(), seed)?;
    Ok(TraceGenerator::new(env, CartPoleEnv::actions()))
}

fn build_agent(state_dim: usize, seed: u64) -> Result<Reinforce<Mlp>> {
    let config = ReinforceConfig::default()
        .policy_model_config(MlpConfig::new(state_dim, vec![100], 2))
        .seed(seed);
    Reinforce::build(config)
}

#[test]
fn test_trace_length_bounded_by_horizon() -> Result<()> {
    let mut generator = build_generator(0)?;
    let mut agent = build_agent(4, 0)?;
    let mut processor = LastObs::new(4);

    for horizon in [1, 5, 30] {
        let trace = generator.generate_trace(&mut agent, &mut processor, None, horizon, false)?;
        assert!(trace.len() <= horizon);
        assert!(trace.len() >= 1);
        assert_eq!(trace.rewards().len(), trace.actions().len());
        assert!(trace.actions().iter().all(|&a| a < 2));
    }

    // The heuristic controller keeps the pole up longer than any horizon here.
    let trace =
        generator.generate_trace(&mut CartPoleHeuristic, &mut processor, None, 50, false)?;
    assert_eq!(trace.len(), 50);
    assert_eq!(trace.total_reward(), 50.0);
    Ok(())
}

#[test]
fn test_restore_reproduces_trace() -> Result<()> {
    let mut generator = build_generator(7)?;
    generator.env_mut().reset()?;
    let start = generator.env().full_state();
    let mut processor = LastObs::new(4);

    let mut heuristic = CartPoleHeuristic;

    let trace1 =
        generator.generate_trace(&mut heuristic, &mut processor, Some(&start), 40, false)?;
    let trace2 =
        generator.generate_trace(&mut heuristic, &mut processor, Some(&start), 40, true)?;
    assert_eq!(trace1, trace2);
    Ok(())
}

#[test]
fn test_frame_stack_states() -> Result<()> {
    let mut generator = build_generator(0)?;
    let mut processor = FrameStack::new(3, 4);
    let mut agent = build_agent(processor.state_dim(), 0)?;

    let trace = generator.generate_trace(&mut agent, &mut processor, None, 10, false)?;
    assert!(trace.iter().all(|step| step.state.len() == 12));
    // No observation has been returned before the first action.
    assert!(trace.steps()[0].state.iter().all(|&v| v == 0.0));
    Ok(())
}

#[test]
fn test_train_then_restore() -> Result<()> {
    let dir = TempDir::new("pgrl_cartpole")?;
    let model_dir = dir.path().to_str().unwrap().to_owned();
    let config = TrainerConfig::default()
        .max_iters(3)
        .traces_per_iter(4)
        .flush_record_interval(1)
        .save_interval(3)
        .model_dir(model_dir.clone());
    let mut trainer = Trainer::build(config);
    let mut generator = build_generator(0)?;
    let mut processor = LastObs::new(4);
    let mut agent = build_agent(4, 0)?;
    let mut recorder = BufferedRecorder::new();

    trainer.train(&mut generator, &mut processor, &mut agent, &mut recorder)?;
    assert_eq!(recorder.len(), 3);
    assert!(recorder.iter().all(|r| r.get_scalar("loss").is_ok()));

    let mut restored = build_agent(4, 1)?;
    restored.load_params(&dir.path().join("3"))?;
    let state = [0.01f32, -0.02, 0.03, 0.0];
    assert_eq!(agent.action_probs(&state)?, restored.action_probs(&state)?);
    assert!(dir.path().join("best").is_dir());
    Ok(())
}

#[test]
fn test_demonstrations_round_trip() -> Result<()> {
    let dir = TempDir::new("pgrl_demos")?;
    let path = dir.path().join("demos.json");
    let mut generator = build_generator(3)?;
    let batch = generator.generate_batch(&mut CartPoleHeuristic, &mut LastObs::new(4), 2)?;
    batch.save(&path)?;
    let demos = TraceBatch::load(&path)?;
    assert_eq!(batch, demos);

    let mut agent = build_agent(4, 0)?;
    let record = agent.learn_supervised(&demos)?;
    assert_eq!(record.get_scalar("n_samples")?, demos.total_steps() as f32);
    Ok(())
}
