pub mod sampler;
pub mod session;
