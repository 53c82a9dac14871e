pub mod u501_level_report;
pub mod u502_csf_import;
