//! Judicial record source integrations, sync orchestration, and the
//! per-case periodic scheduler.

pub mod datajud;
pub mod esaj;
pub mod model;
pub mod offline;
pub mod scheduler;
pub mod source;
pub mod sync;

pub use datajud::DatajudClient;
pub use esaj::EsajClient;
pub use model::{
    ClaimValue, Counsel, Deadline, JudicialProcess, Party, PartyRole, ProcessDocument,
    ProcessMovement, SourceId, SyncResult,
};
pub use offline::OfflineClient;
pub use scheduler::SyncScheduler;
pub use source::{SourceClient, TribunalEndpoint, all_tribunal_endpoints};
pub use sync::SyncOrchestrator;
