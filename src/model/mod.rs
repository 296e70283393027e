pub mod artifacts;
pub mod layers;
pub mod network;
pub mod scaler;
