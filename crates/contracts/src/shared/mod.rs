pub mod excel;
pub mod logger;
