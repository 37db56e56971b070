mod core;


pub use self::core::{AuditReport, audit};
