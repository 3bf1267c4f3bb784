//! 2D Ising model sampled with single-spin-flip Metropolis Monte Carlo.

pub mod mods;
