#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use mnist_eval::{ActivationFunction, LayerParams, Network, MNIST_HW, NCLASSES, NINPUT};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh path under the system temp dir; every call gets its own directory.
pub fn temp_path(name: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("mnist-eval-test-{}-{n}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name).to_string_lossy().into_owned()
}

/// Writes an IDX3 file whose header declares `declared` images.
pub fn write_images_declaring(path: &str, images: &[Vec<u8>], declared: u32) {
    let mut bytes = vec![0x00, 0x00, 0x08, 0x03];
    bytes.extend(declared.to_be_bytes());
    bytes.extend((MNIST_HW as u32).to_be_bytes());
    bytes.extend((MNIST_HW as u32).to_be_bytes());
    for image in images {
        assert_eq!(image.len(), NINPUT);
        bytes.extend_from_slice(image);
    }
    std::fs::write(path, bytes).unwrap();
}

pub fn write_images(path: &str, images: &[Vec<u8>]) {
    write_images_declaring(path, images, images.len() as u32);
}

/// Writes an IDX1 file whose header declares `declared` labels.
pub fn write_labels_declaring(path: &str, classes: &[u8], declared: u32) {
    let mut bytes = vec![0x00, 0x00, 0x08, 0x01];
    bytes.extend(declared.to_be_bytes());
    bytes.extend_from_slice(classes);
    std::fs::write(path, bytes).unwrap();
}

pub fn write_labels(path: &str, classes: &[u8]) {
    write_labels_declaring(path, classes, classes.len() as u32);
}

/// `n` labels cycling through every class.
pub fn balanced_classes(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % NCLASSES) as u8).collect()
}

/// Blank images with a single lit pixel at the index of their class.
pub fn one_pixel_images(classes: &[u8]) -> Vec<Vec<u8>> {
    classes
        .iter()
        .map(|&c| {
            let mut image = vec![0u8; NINPUT];
            image[c as usize] = 255;
            image
        })
        .collect()
}

/// Deterministic pseudo-random images.
pub fn noisy_images(n: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = Lcg(seed);
    (0..n)
        .map(|_| (0..NINPUT).map(|_| (rng.next_f64() * 256.0) as u8).collect())
        .collect()
}

/// The same buffers `load_images` / `load_labels` would produce.
pub fn to_buffers(images: &[Vec<u8>], classes: &[u8]) -> (Vec<f64>, Vec<f64>) {
    let pixels = images.iter().flatten().map(|&p| p as f64 / 255.0).collect();
    let mut labels = vec![0.0; classes.len() * NCLASSES];
    for (i, &c) in classes.iter().enumerate() {
        labels[i * NCLASSES + c as usize] = 1.0;
    }
    (pixels, labels)
}

/// 784 -> 10: the logit of class `c` is ten times pixel `c`.
pub fn readout_network() -> Network {
    let mut weights = vec![0.0; NINPUT * NCLASSES];
    for c in 0..NCLASSES {
        weights[c * NCLASSES + c] = 10.0;
    }
    Network::new(vec![LayerParams {
        input_size: NINPUT,
        size: NCLASSES,
        activation: ActivationFunction::Softmax,
        weights,
        biases: vec![0.0; NCLASSES],
    }])
}

/// 784 -> 10 that ignores its input and always predicts `class`.
pub fn constant_network(class: usize) -> Network {
    let mut biases = vec![0.0; NCLASSES];
    biases[class] = 5.0;
    Network::new(vec![LayerParams {
        input_size: NINPUT,
        size: NCLASSES,
        activation: ActivationFunction::Identity,
        weights: vec![0.0; NINPUT * NCLASSES],
        biases,
    }])
}

/// 784 -> 16 (ReLU) -> 10 (Softmax) with small pseudo-random parameters.
pub fn hidden_network(seed: u64) -> Network {
    let mut rng = Lcg(seed);
    let mut params = |n: usize, scale: f64| -> Vec<f64> {
        (0..n).map(|_| (rng.next_f64() * 2.0 - 1.0) * scale).collect()
    };
    Network::new(vec![
        LayerParams {
            input_size: NINPUT,
            size: 16,
            activation: ActivationFunction::ReLU,
            weights: params(NINPUT * 16, 0.05),
            biases: params(16, 0.1),
        },
        LayerParams {
            input_size: 16,
            size: NCLASSES,
            activation: ActivationFunction::Softmax,
            weights: params(16 * NCLASSES, 0.5),
            biases: params(NCLASSES, 0.1),
        },
    ])
}

pub fn save_network(network: &Network, name: &str) -> String {
    let path = temp_path(name);
    network.save_json(&path).unwrap();
    path
}

struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}
