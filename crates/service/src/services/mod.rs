//! Business logic services.
//!
//! # Services
//!
//! - `identity` - Credential verification and login against an `OpenID` Connect provider
//! - `directory` - Customer lookup and creation
//! - `ledger` - Order persistence
//! - `notify` - Best-effort order notifications
//! - `pipeline` - End-to-end order placement

pub mod directory;
pub mod identity;
pub mod ledger;
pub mod notify;
pub mod pipeline;

pub use directory::CustomerDirectory;
pub use identity::Authenticator;
pub use ledger::OrderLedger;
pub use notify::Dispatcher;
pub use pipeline::{OrderPipeline, PipelineStage};
