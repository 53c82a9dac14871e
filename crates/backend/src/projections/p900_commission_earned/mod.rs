pub mod engine;
pub mod repository;
pub mod service;
