//! Compiles a model parameter file into a compute graph that `mnist-eval`
//! can replay on the CPU backend.
//!
//!   mnist-export-graph <model-path> <graph-path> [batch-size]
use std::{env, process};

use log::info;

use mnist_eval::{
    engine::{build_model, load_model, CPU},
    ComputeGraph, EvalErr, Result, NBATCH_PHYSICAL,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 && args.len() != 4 {
        let program = args.first().map(String::as_str).unwrap_or("mnist-export-graph");
        eprintln!("Usage: {program} mnist-fc.json mnist-fc.graph.json [batch-size]");
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let batch_size = match args.get(3) {
        Some(raw) => raw
            .parse()
            .map_err(|e| EvalErr::BatchConfig(format!("batch size {raw:?}: {e}")))?,
        None => NBATCH_PHYSICAL,
    };

    let mut model = load_model(&args[1], CPU)?;
    build_model(&mut model, batch_size, batch_size)?;

    let graph = ComputeGraph::compile(&model, batch_size)?;
    graph.save_json(&args[2])?;
    info!("wrote {} graph nodes to {}", graph.nodes.len(), args[2]);
    Ok(())
}
