pub mod config;
pub mod error_codes;
pub mod ir;
pub mod logging;
