pub mod pilot_model;
pub mod results_log;
