pub mod idx;

pub use idx::{image_count, label_count, load_images, load_labels};
