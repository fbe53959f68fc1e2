//! Constants shared by snapshots and fingerprints.

/// Version of the persisted snapshot layout. Bump on incompatible changes to
/// `WorkflowSnapshot`.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Index value used by step definitions to say "no such transition".
pub const NO_STEP: i64 = -1;
