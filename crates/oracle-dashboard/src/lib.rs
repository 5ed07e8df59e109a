pub mod live;
pub mod render;
pub mod session;
pub mod token_store;

#[cfg(test)]
pub(crate) mod testing;

pub use live::{AnalysisSequencer, LiveEvent, LiveMonitor};
pub use session::{Session, SessionError};
pub use token_store::{TokenStore, TokenStoreError};
