pub mod bus;
pub mod ids;
pub mod merge;
pub mod pattern;
pub mod runtime_config;
pub mod sink;

pub use bus::{Bus, OnceToken, PublishHandle};
pub use ids::SubscriptionId;
pub use merge::deep_merge;
pub use pattern::{MatchResult, ParamValue, PathMatcher, PatternError};
pub use sink::{ErrorSink, TracingSink};
