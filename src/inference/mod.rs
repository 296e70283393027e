pub mod diurnal;
pub mod forecast;
pub mod pipeline;
