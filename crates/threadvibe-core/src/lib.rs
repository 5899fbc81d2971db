pub mod aggregate;
pub mod error;
pub mod handler;
pub mod normalize;
pub mod types;

pub use aggregate::aggregate;
pub use error::AnalyzeError;
pub use handler::{
    ACCEPTED_URL_PREFIXES, COMMENT_LIMIT, ChartRenderer, Classifier, CommentSource, RequestHandler,
};
pub use normalize::TextNormalizer;
pub use types::{AnalysisResponse, ErrorResponse, LabelDistribution, Prediction};
