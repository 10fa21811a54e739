pub mod digit;
pub mod summary;

pub use digit::render_digit;
pub use summary::{pick_example, time_seeded_rng, write_summary};
