//! Plan generation: tone composition, prompt construction, response
//! validation and the request service.

pub mod prompt;
pub mod schema;
pub mod service;
pub mod tone;

pub use prompt::build_plan_prompt;
pub use schema::{SchemaError, parse_week_plan};
pub use service::{PlanError, PlanService};
pub use tone::{Delivery, MotivationTone};
