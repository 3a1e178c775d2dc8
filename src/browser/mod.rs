#[cfg(feature = "chrome")]
pub mod chrome;
pub mod session;
pub mod wait;

#[cfg(feature = "chrome")]
pub use chrome::{ChromeDriver, ChromeNode};
pub use session::{InteractionContext, PageSession};
pub use wait::{poll_until, WaitCondition};
