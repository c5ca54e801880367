pub mod detection;
pub mod simulated;
pub mod state;
