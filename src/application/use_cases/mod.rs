pub mod notification_facade;

pub use notification_facade::{
    AuthChangeOutcome, FacadeSnapshot, HelperOutcome, NotificationFacade,
};
