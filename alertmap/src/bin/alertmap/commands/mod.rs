pub mod categories;
pub mod check_config;
pub mod profile;
pub mod recompute;
pub mod serve;
