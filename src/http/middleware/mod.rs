pub mod session;

pub use session::{session_middleware, IdentityError, IdentityResolver, SessionState, StaticSessions};
