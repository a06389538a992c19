pub mod notifier;
pub mod paypal;

pub use notifier::{NotifyError, Notifier};
pub use paypal::{PayPalClient, PayPalError};
