pub mod app;
pub mod extract;
pub mod middleware;
pub mod rate_limit;

pub use app::{App, AppBuilder, AppBuilderOpts, AppState};
pub use extract::{Auth, OptionalAuth};

// vim: ts=4
