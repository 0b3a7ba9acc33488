mod config;
mod pipeline;

pub use config::{MatcherConfig, Thresholds};
pub use pipeline::Matcher;

pub use um_catalog::{CatalogError, Item, ItemCatalog, SocketColor};
pub use um_result::{
    CroppedItemInfo, DebugCollector, GuideEdge, ItemTemplate, MatchError, MatchObserver,
    MatchResult, MatchedBy, NoopObserver,
};
pub use um_vision::{OcrEngine, TesseractCli};

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str =
    "unique_matcher=info,um_vision=info,um_policy=info,um_catalog=info";
