//! Evaluates a digit classifier on the MNIST test set.
//!
//!   mnist-eval <model-path> <image-file> <label-file> [backend]
//!
//! On the CPU backend `model-path` is first tried as a compute graph
//! (see `mnist-export-graph`); otherwise it is read as a parameter file.
use std::{env, io, process};

use mnist_eval::{
    data::{image_count, label_count, load_images, load_labels},
    engine::CPU,
    evaluate, accuracy_statistic, loss_statistic,
    report::{pick_example, render_digit, time_seeded_rng, write_summary},
    EvalConfig, EvalErr, NativeEngine, Result, NCLASSES, NINPUT,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 && args.len() != 5 {
        let program = args.first().map(String::as_str).unwrap_or("mnist-eval");
        eprintln!(
            "Usage: {program} mnist-fc.json data/MNIST/raw/t10k-images-idx3-ubyte data/MNIST/raw/t10k-labels-idx1-ubyte [CPU/THREADED]"
        );
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let config = EvalConfig::from_env()?;
    let (model_path, images_path, labels_path) = (&args[1], &args[2], &args[3]);
    let backend = args.get(4).map(String::as_str).unwrap_or(CPU);
    let n = config.n_examples;

    // Buffers are sized only after both files are known to hold n examples.
    ensure_holds(images_path, image_count(images_path)?, n, "images")?;
    ensure_holds(labels_path, label_count(labels_path)?, n, "labels")?;

    let mut images = vec![0.0; buffer_len(n, NINPUT)?];
    load_images(images_path, &mut images, n)?;

    let mut labels = vec![0.0; buffer_len(n, NCLASSES)?];
    load_labels(labels_path, &mut labels, n)?;

    let iex = pick_example(&mut time_seeded_rng(), n);
    print!("{}", render_digit(&images[iex * NINPUT..(iex + 1) * NINPUT]));

    let result = evaluate(&NativeEngine, model_path, &images, &labels, backend, &config)?;

    let predicted = result.prediction(iex).ok_or(EvalErr::Unsuccessful)?;
    let loss = loss_statistic(&result)?;
    let accuracy = accuracy_statistic(&result)?;

    write_summary(&mut io::stdout().lock(), predicted, loss, accuracy)?;
    Ok(())
}

fn ensure_holds(path: &str, available: usize, requested: usize, what: &str) -> Result<()> {
    if available < requested {
        return Err(EvalErr::Dataset {
            path: path.to_owned(),
            reason: format!("file holds {available} {what} but {requested} were requested."),
        });
    }
    Ok(())
}

fn buffer_len(n: usize, per_example: usize) -> Result<usize> {
    n.checked_mul(per_example)
        .ok_or_else(|| EvalErr::BatchConfig(format!("{n} examples do not fit in memory")))
}
