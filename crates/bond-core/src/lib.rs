//! bond-core: state and persistence for the Lucy companion agent
//!
//! Provides:
//! - Keyword emotion classification
//! - The shared, lock-guarded bond state
//! - Atomic JSON persistence
//! - The periodic self-update scheduler
//! - The interaction loop, generic over its input source

pub mod config;
pub mod emotion;
pub mod error;
pub mod responder;
pub mod scheduler;
pub mod session;
pub mod shutdown;
pub mod state;
pub mod store;

pub use config::{BondConfig, ConfigFile};
pub use emotion::{classify, EmotionLabel};
pub use error::{BondError, Result};
pub use responder::{LookupResponder, ResponseGenerator};
pub use scheduler::Scheduler;
pub use session::{Input, InteractionLoop, LineSource, SessionEnd};
pub use shutdown::Shutdown;
pub use state::{Bond, BondDocument, BondRecord, HistoryEntry};
pub use store::{BondStore, LoadOutcome};
