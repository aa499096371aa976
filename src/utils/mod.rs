pub mod rng;

pub use rng::{lane_seeds, rng_from_seed, RngStream, SeedSequence};
