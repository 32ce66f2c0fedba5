//! digit-service: recognises hand-drawn digits posted from a browser canvas.
pub mod classifier;
pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod preprocess;
pub mod services;
pub mod startup;
