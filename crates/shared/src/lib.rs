// Public modules
pub mod accounts;
pub mod assembler;
pub mod browser_use;
pub mod config;
pub mod cookies;
pub mod counts;
pub mod dedup;
pub mod models;
pub mod payload;
pub mod pipeline;
pub mod render;
pub mod scoring;
pub mod store;
pub mod timeline;

// Re-export commonly used types
pub use assembler::{BriefingAssembler, PipelineLimits};
pub use browser_use::{BrowserUseClient, PollError, PollSettings};
pub use config::Config;
pub use models::{
    AccountCandidate, AccountToFollow, BriefingDocument, BriefingPost, CandidateItem, Methodology,
    ScoredItem,
};
pub use payload::PayloadError;
pub use render::BriefingPage;
pub use store::{BriefingStore, FileStore};
pub use timeline::{LiveTimeline, PageSource};
