mod payload;
mod recovery;
mod session;

pub use payload::PayloadError;
pub use recovery::reconstruct_confirmations;
pub use session::{SessionConfig, SessionManager};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
