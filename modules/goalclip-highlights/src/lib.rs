pub mod cache;
pub mod matcher;
pub mod resolver;
pub mod types;

pub use cache::GoalLinkCache;
pub use matcher::{MatchSelector, TitleHeuristic};
pub use resolver::{HighlightResolver, ResolverConfig, RetryPolicy};
pub use types::{GoalInfo, GoalKey, GoalLink, ResolutionOutcome};
