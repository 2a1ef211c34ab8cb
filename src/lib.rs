pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod recipe;
pub mod render;
pub mod sequence;
pub mod tools;
pub mod upload;
pub mod youtube;
