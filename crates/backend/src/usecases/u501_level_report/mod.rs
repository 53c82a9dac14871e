pub mod executor;
pub mod export;
