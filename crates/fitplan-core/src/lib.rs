//! Core logic for fitplan: profile validation, plan generation, media and
//! plan sessions.

pub mod export;
pub mod media;
pub mod plan;
pub mod profile;
pub mod session;
pub mod upstream;

pub use plan::{PlanError, PlanService};
pub use profile::{FieldErrors, ProfileField, ProfileForm};
pub use session::{PlanSession, SessionServices};
