pub mod places;
pub mod preprocessing;
