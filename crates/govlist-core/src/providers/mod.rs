// Listing source implementations
pub mod upstream;

pub use upstream::UpstreamSource;
