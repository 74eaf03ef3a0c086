//! Data services behind the sub-applications.
//!
//! # Data Flow
//! ```text
//! sub-application handler (caller Identity + RepoSpec)
//!     → mirror.rs (Mirrored: classify repo, check principal)
//!         ├─ Local        → memory.rs (or any local IssuesService/ChangeService)
//!         ├─ RemoteMirror → remote backend (third-party service client)
//!         └─ Forbidden    → ServiceError::PermissionDenied
//!     → result/error returned unchanged
//! ```
//!
//! # Design Decisions
//! - The caller identity is an explicit argument of every operation
//! - Services are trait objects (`Arc<dyn IssuesService>`) so backends and
//!   policies stack freely
//! - No retries: backend failures propagate immediately

pub mod blog;
pub mod changes;
pub mod error;
pub mod identity;
pub mod issues;
pub mod memory;
pub mod mirror;
pub mod remote;
pub mod repo;

pub use changes::ChangeService;
pub use error::{ServiceError, ServiceResult};
pub use identity::{Identity, Session, UserSpec};
pub use issues::IssuesService;
pub use mirror::{Delegation, MirrorPolicy, Mirrored};
pub use repo::RepoSpec;
