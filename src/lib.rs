// Crate root library declaration and module exports.
pub mod cli;
pub mod config;
pub mod context;
pub mod controller;
pub mod document;
pub mod gesture;
pub mod model;
pub mod payload;
pub mod render;
pub mod storage;
pub mod store;
pub mod suggest;
