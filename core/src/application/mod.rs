//! Application layer - Use case services.
//!
//! Thin orchestrators shared by the one-shot commands and the dashboard:
//! they accept domain types, reach the system only through ports, and
//! return domain types.

mod kill_service;
mod scan_service;

pub use kill_service::{KillMode, KillService, KillStatus};
pub use scan_service::ScanService;
