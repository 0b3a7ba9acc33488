use std::path::PathBuf;
use thiserror::Error;
use um_catalog::CatalogError;

/// Which control guide of the item title could not be located
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideEdge {
    Start,
    End,
}

impl std::fmt::Display for GuideEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuideEdge::Start => f.write_str("start"),
            GuideEdge::End => f.write_str("end"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("unique control guide {0} not found")]
    AnchorNotFound(GuideEdge),

    #[error("screenshot is {width}x{height}px, expected 1920x1080px")]
    NotFullResolution { width: u32, height: u32 },

    #[error("item base '{0}' doesn't exist")]
    BaseNotRecognized(String),

    #[error("item name '{0}' doesn't exist")]
    ItemNameNotRecognized(String),

    #[error(
        "template image is larger than unique item: {template_width}x{template_height}px vs {width}x{height}px"
    )]
    InvalidTemplateDimensions {
        template_width: u32,
        template_height: u32,
        width: u32,
        height: u32,
    },

    #[error("couldn't identify a unique item: {0}")]
    InconclusiveMatch(String),

    #[error("item can only have 1-6 sockets, got {0}")]
    InvalidSocketCount(u32),

    #[error("socket layout needs 1 or 2 columns, got {0}")]
    InvalidSocketColumns(u32),

    #[error("no candidate items for base '{0}'")]
    NoCandidates(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("failed to process image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl MatchError {
    /// Short stable label, used for failure counters.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::AnchorNotFound(_) => "anchor_not_found",
            MatchError::NotFullResolution { .. } => "not_full_resolution",
            MatchError::BaseNotRecognized(_) => "base_not_recognized",
            MatchError::ItemNameNotRecognized(_) => "item_name_not_recognized",
            MatchError::InvalidTemplateDimensions { .. } => "invalid_template_dimensions",
            MatchError::InconclusiveMatch(_) => "inconclusive_match",
            MatchError::InvalidSocketCount(_) => "invalid_socket_count",
            MatchError::InvalidSocketColumns(_) => "invalid_socket_columns",
            MatchError::NoCandidates(_) => "no_candidates",
            MatchError::Ocr(_) => "ocr",
            MatchError::Image { .. } => "image",
            MatchError::Io { .. } => "io",
            MatchError::Catalog(_) => "catalog",
        }
    }

    /// Faults caused by bad catalog data or assets for one candidate item.
    /// These fail the one candidate check, not the whole screenshot.
    pub fn is_candidate_fault(&self) -> bool {
        matches!(
            self,
            MatchError::InvalidTemplateDimensions { .. }
                | MatchError::InvalidSocketCount(_)
                | MatchError::InvalidSocketColumns(_)
                | MatchError::Image { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
