pub mod activations;
pub mod layers;
mod network;

pub use network::{HIDDEN1_DIM, HIDDEN2_DIM, INPUT_DIM, Network, OUTPUT_DIM};
