pub mod assembly;
pub mod merge;
pub mod scoring;
pub mod spotlight;
pub mod votes;

pub use assembly::{FeedAssembler, FeedSettings};
pub use merge::{interleave, FeedItem, FeedSource};
pub use scoring::{velocity, ScoreInput, Scorer, ScoringMode, ScoringPolicy, UrgencyPolicy};
pub use spotlight::{SpotlightService, DEFAULT_SPOTLIGHT_TTL_SECS};
pub use votes::{VoteOutcome, VoteService};
