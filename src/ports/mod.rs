//! Port traits at the edges of the domain.

pub mod config_port;
pub mod cost_port;
pub mod report_port;
pub mod series_port;
