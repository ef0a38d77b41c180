pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::schedule::ScheduleService;
pub use services::slots::{generate_slots, parse_slot_label, slot_label, DEFAULT_SLOT_MINUTES};
