pub mod backup;
pub mod mcp;
pub mod rule;
pub mod sync;

pub use backup::{FileSnapshotBackup, NoopBackup, SnapshotBackup, SnapshotRef};
pub use mcp::McpService;
pub use rule::RuleService;
pub use sync::SyncService;
