//! Routing subsystem: the sub-application mount table.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (longest prefix lookup)
//!     → matcher.rs (whole-segment prefix match)
//!     → mirror_path.rs (owner/name for mirrored wildcard prefixes)
//!     → Return: Resolved mount or RouteError (404)
//!
//! Mount Compilation (at startup):
//!     MountConfig[] + mirror services
//!     → Build Mount per prefix with its sub-application
//!     → Sort by prefix length
//!     → Freeze as immutable MountTable
//! ```
//!
//! # Design Decisions
//! - Mounts built at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same mount
//! - Longest prefix wins

pub mod matcher;
pub mod mirror_path;
pub mod router;

pub use mirror_path::{MirrorPath, MirroredService};
pub use router::{Binding, Mount, MountTable, Resolved, RouteError};
