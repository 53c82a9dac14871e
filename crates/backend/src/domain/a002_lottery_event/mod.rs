pub mod levels;
pub mod repository;
pub mod service;
