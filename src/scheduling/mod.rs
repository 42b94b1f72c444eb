pub mod driver;
pub mod scheduler;

pub use driver::FixedRateDriver;
pub use scheduler::{RefreshHost, RefreshScheduler, SubscriptionId, TickCallback};
