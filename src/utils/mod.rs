pub mod activation;
pub mod initializer;
pub mod padding;
pub mod spatial_dropout;
