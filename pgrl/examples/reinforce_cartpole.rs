use anyhow::Result;
use clap::Parser;
use pgrl::util::evaluate;
use pgrl_candle_agent::{
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
    reinforce::{Reinforce, ReinforceConfig},
    Device,
};
use pgrl_classic_env::{CartPoleConfig, CartPoleEnv};
use pgrl_core::{
    record::BufferedRecorder, Agent, Configurable, Env as _, GeneratorConfig, LastObs,
    TraceGenerator, Trainer, TrainerConfig,
};
use serde::Serialize;
use std::path::Path;

const DIM_OBS: usize = 4;
const DIM_ACT: usize = 2;
const N_HIDDEN: usize = 100;
const LR: f64 = 0.001;
const EXPLORATION_RATE: f64 = 0.1;
const HORIZON: usize = 200;
const TRACES_PER_ITER: usize = 10;
const MAX_ITERS: usize = 200;
const FLUSH_RECORD_INTERVAL: usize = 10;
const SAVE_INTERVAL: usize = 50;
const N_TRACES_PER_EVAL: usize = 5;
const MODEL_DIR: &str = "./pgrl/examples/model/reinforce_cartpole";

mod config {
    use super::*;

    #[derive(Serialize)]
    pub struct ReinforceCartpoleConfig {
        pub env_config: CartPoleConfig,
        pub generator_config: GeneratorConfig,
        pub agent_config: ReinforceConfig<Mlp>,
        pub trainer_config: TrainerConfig,
    }

    impl ReinforceCartpoleConfig {
        pub fn new(max_iters: usize, model_dir: &str, seed: u64, normalize: bool) -> Self {
            let trainer_config = TrainerConfig::default()
                .max_iters(max_iters)
                .traces_per_iter(TRACES_PER_ITER)
                .flush_record_interval(FLUSH_RECORD_INTERVAL)
                .save_interval(SAVE_INTERVAL)
                .model_dir(model_dir);

            Self {
                env_config: create_env_config(),
                generator_config: GeneratorConfig::default().horizon(HORIZON),
                agent_config: create_agent_config(seed, normalize),
                trainer_config,
            }
        }
    }

    pub fn create_env_config() -> CartPoleConfig {
        CartPoleConfig::default().max_steps(HORIZON)
    }

    pub fn create_agent_config(seed: u64, normalize: bool) -> ReinforceConfig<Mlp> {
        let opt_config = OptimizerConfig::default().learning_rate(LR);
        let mlp_config = MlpConfig::new(DIM_OBS, vec![N_HIDDEN], DIM_ACT);

        ReinforceConfig::default()
            .policy_model_config(mlp_config)
            .opt_config(opt_config)
            .exploration_rate(EXPLORATION_RATE)
            .normalize_rewards(normalize)
            .seed(seed)
            .device(Device::Cpu)
    }
}
use config::{create_agent_config, create_env_config, ReinforceCartpoleConfig};

/// Train/eval REINFORCE agent in cartpole environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train REINFORCE agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate REINFORCE agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// Standardize rewards over each batch; cart-pole batches with constant
    /// rewards are then discarded
    #[arg(short, long, default_value_t = false)]
    normalize: bool,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write the configuration to this YAML file before training
    #[arg(long)]
    dump_config: Option<String>,
}

fn train(args: &Args, max_iters: usize, model_dir: &str) -> Result<()> {
    let config = ReinforceCartpoleConfig::new(max_iters, model_dir, args.seed, args.normalize);
    if let Some(path) = &args.dump_config {
        let mut file = std::fs::File::create(path)?;
        serde_yaml::to_writer(&mut file, &config)?;
    }

    let mut trainer = Trainer::build(config.trainer_config.clone());
    let mut generator = {
        let env = CartPoleEnv::build(&config.env_config, args.seed as i64)?;
        TraceGenerator::with_config(env, CartPoleEnv::actions(), config.generator_config.clone())
    };
    let mut processor = LastObs::new(DIM_OBS);
    let mut agent = Reinforce::build(config.agent_config)?;
    let mut recorder = BufferedRecorder::new();

    trainer.train(&mut generator, &mut processor, &mut agent, &mut recorder)?;

    Ok(())
}

fn eval(model_dir: &str, render: bool, seed: u64) -> Result<f32> {
    let mut agent = {
        let config = create_agent_config(seed, false).exploration_rate(0.0);
        let mut agent = Reinforce::<Mlp>::build(config)?;
        agent.load_params(Path::new(model_dir))?;
        agent
    };
    let mut generator = {
        let env = CartPoleEnv::build(&create_env_config(), seed as i64 + 1)?;
        let config = GeneratorConfig::default().horizon(HORIZON).render(render);
        TraceGenerator::with_config(env, CartPoleEnv::actions(), config)
    };

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
        train(&args, MAX_ITERS, MODEL_DIR)?;
    } else if args.eval {
        eval(&(MODEL_DIR.to_owned() + "/best"), true, args.seed)?;
    } else {
        train(&args, MAX_ITERS, MODEL_DIR)?;
        eval(&(MODEL_DIR.to_owned() + "/best"), true, args.seed)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{eval, train, Args};
    use anyhow::Result;
    use tempdir::TempDir;

    #[test]
    fn test_reinforce_cartpole() -> Result<()> {
        let tmp_dir = TempDir::new("reinforce_cartpole")?;
        let model_dir = match tmp_dir.as_ref().to_str() {
            Some(s) => s,
            None => panic!("Failed to get string of temporary directory"),
        };
        let args = Args {
            train: false,
            eval: false,
            normalize: false,
            seed: 0,
            dump_config: None,
        };
        train(&args, 3, model_dir)?;
        let mean_return = eval(&(model_dir.to_owned() + "/best"), false, 0)?;
        assert!(mean_return >= 1.0);

        Ok(())
    }
}
