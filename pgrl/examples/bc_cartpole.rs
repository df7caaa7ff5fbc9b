use anyhow::Result;
use clap::Parser;
use log::info;
use pgrl::util::{evaluate, CartPoleHeuristic};
use pgrl_candle_agent::{
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
    reinforce::{Reinforce, ReinforceConfig},
    Device,
};
use pgrl_classic_env::{CartPoleConfig, CartPoleEnv};
use pgrl_core::{
    record::{AggregateRecorder, BufferedRecorder, RecordValue},
    Agent, Configurable, Env as _, GeneratorConfig, LastObs, TraceBatch, TraceGenerator,
};
use std::path::Path;

const DIM_OBS: usize = 4;
const DIM_ACT: usize = 2;
const N_HIDDEN: usize = 100;
const LR: f64 = 0.001;
const HORIZON: usize = 200;
const N_DEMOS: usize = 20;
const N_EPOCHS: usize = 300;
const FLUSH_RECORD_INTERVAL: usize = 50;
const N_TRACES_PER_EVAL: usize = 5;
const MODEL_DIR: &str = "./pgrl/examples/model/bc_cartpole";

fn create_generator(seed: i64, render: bool) -> Result<TraceGenerator<CartPoleEnv>> {
    let env = CartPoleEnv::build(&CartPoleConfig::default().max_steps(HORIZON), seed)?;
    let config = GeneratorConfig::default().horizon(HORIZON).render(render);
    Ok(TraceGenerator::with_config(env, CartPoleEnv::actions(), config))
}

fn create_agent_config(seed: u64) -> ReinforceConfig<Mlp> {
    ReinforceConfig::default()
        .policy_model_config(MlpConfig::new(DIM_OBS, vec![N_HIDDEN], DIM_ACT))
        .opt_config(OptimizerConfig::default().learning_rate(LR))
        .exploration_rate(0.0)
        .seed(seed)
        .device(Device::Cpu)
}

/// Clone a hand-written cartpole controller with a REINFORCE agent
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Collect demonstrations and train, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate the cloned agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Rolls out the heuristic controller and saves its traces as JSON.
fn collect_demos(model_dir: &str, n_demos: usize, seed: u64) -> Result<()> {
    let mut generator = create_generator(seed as i64, false)?;
    let batch = generator.generate_batch(
        &mut CartPoleHeuristic,
        &mut LastObs::new(DIM_OBS),
        n_demos,
    )?;
    info!(
        "Collected {} demonstrations, mean return = {}",
        batch.len(),
        batch.mean_total_reward()
    );
    std::fs::create_dir_all(model_dir)?;
    batch.save(Path::new(model_dir).join("demos.json"))
}

fn train(model_dir: &str, n_epochs: usize, seed: u64) -> Result<()> {
    let demos = TraceBatch::load(Path::new(model_dir).join("demos.json"))?;
    let mut agent = Reinforce::<Mlp>::build(create_agent_config(seed))?;
    let mut recorder = BufferedRecorder::new();

    for epoch in 1..=n_epochs {
        let mut record = agent.learn_supervised(&demos)?;
        record.insert("epoch", RecordValue::Scalar(epoch as f32));
        recorder.store(record);

        if epoch % FLUSH_RECORD_INTERVAL == 0 {
            recorder.flush(epoch as i64);
        }
    }

    agent.save_params(&Path::new(model_dir).join("best"))
}

fn eval(model_dir: &str, render: bool, seed: u64) -> Result<f32> {
    let mut agent = Reinforce::<Mlp>::build(create_agent_config(seed))?;
    agent.load_params(Path::new(model_dir))?;
    let mut generator = create_generator(seed as i64 + 1, render)?;

    evaluate(
        &mut generator,
        &mut agent,
        &mut LastObs::new(DIM_OBS),
        N_TRACES_PER_EVAL,
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.train {
        collect_demos(MODEL_DIR, N_DEMOS, args.seed)?;
        train(MODEL_DIR, N_EPOCHS, args.seed)?;
    } else if args.eval {
        eval(&(MODEL_DIR.to_owned() + "/best"), true, args.seed)?;
    } else {
        collect_demos(MODEL_DIR, N_DEMOS, args.seed)?;
        train(MODEL_DIR, N_EPOCHS, args.seed)?;
        eval(&(MODEL_DIR.to_owned() + "/best"), true, args.seed)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{collect_demos, eval, train};
    use anyhow::Result;
    use tempdir::TempDir;

    #[test]
    fn test_bc_cartpole() -> Result<()> {
        let tmp_dir = TempDir::new("bc_cartpole")?;
        let model_dir = match tmp_dir.as_ref().to_str() {
            Some(s) => s,
            None => panic!("Failed to get string of temporary directory"),
        };
        collect_demos(model_dir, 2, 0)?;
        train(model_dir, 5, 0)?;
        let mean_return = eval(&(model_dir.to_owned() + "/best"), false, 0)?;
        assert!(mean_return >= 1.0);

        Ok(())
    }
}
