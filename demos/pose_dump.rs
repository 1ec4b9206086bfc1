//! Loads a glTF file and prints its bone matrices over one loop of the
//! selected animation.
//!
//! Usage: `pose_dump <file> [pose options yaml] [frames]`
use log::{error, info};
use rhizome::{
    anim::PoseEvaluator,
    config::PoseOptions,
    rz_error::RzError,
    scene_import::{gltf_file, ImportOptions},
};

const DEFAULT_FRAMES: usize = 5;

fn run(args: &[String]) -> Result<(), RzError> {
    let options = match args.get(2) {
        Some(path) => PoseOptions::load(path)?,
        None => PoseOptions::default(),
    };
    let frames = args
        .get(3)
        .and_then(|f| f.parse().ok())
        .unwrap_or(DEFAULT_FRAMES)
        .max(1);

    let scene = gltf_file::load(&args[1], &ImportOptions::default())?;
    let mut evaluator = PoseEvaluator::new(scene, &options)?;

    let Some((name, length)) = evaluator
        .animation()
        .map(|a| (a.name.clone(), a.duration / a.rate()))
    else {
        info!("no animation, printing the bind pose");
        evaluator.evaluate(0.0)?;
        print_pose(&evaluator, 0.0);
        return Ok(());
    };
    info!("{:?} is {} seconds long", name, length);

    for frame in 0..frames {
        #[allow(clippy::cast_precision_loss)]
        let seconds = length * frame as f32 / frames as f32;
        evaluator.evaluate_seconds(seconds)?;
        print_pose(&evaluator, seconds);
    }
    Ok(())
}

fn print_pose(evaluator: &PoseEvaluator, seconds: f32) {
    println!("t={seconds:.3}s");
    for (name, m) in evaluator
        .registry()
        .names()
        .iter()
        .zip(evaluator.bone_matrices())
    {
        println!("  {name}: {:?}", m.0);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        error!("usage: pose_dump <file> [pose options yaml] [frames]");
        std::process::exit(1);
    }
    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}
