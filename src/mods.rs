pub mod constants;
pub mod energy;
pub mod error;
pub mod io_handler;
pub mod lattice;
pub mod metropolis;
pub mod settings;
pub mod simulation;
pub mod state;
