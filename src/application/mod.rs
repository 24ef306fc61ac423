pub mod use_cases;

pub use use_cases::{AuthChangeOutcome, FacadeSnapshot, HelperOutcome, NotificationFacade};
