//! Pipeline entry points for monitor operations.
//!
//! - `RegionCoordinator`: poll → reconcile → publish for one region
//! - `Monitor`: runs coordinators for many regions
//! - `FilteredView`: subscriber-side service filtering
//! - `validate_region`: one-shot check used at setup time

pub mod coordinator;
pub mod diagnostics;
pub mod monitor;
pub mod validate;
pub mod view;

pub use coordinator::{CoordinatorState, PollOutcome, RegionCoordinator};
pub use diagnostics::Diagnostics;
pub use monitor::Monitor;
pub use validate::{run_validate, validate_config_file, validate_region};
pub use view::FilteredView;
