mod composer;
mod error;
mod query;
mod request;

pub use composer::compose;
pub use error::{QueryError, Result};
pub use query::{MatchClause, Operator, Query};
pub use request::{AnswerRequest, GeneratorConfig, QueryPayload, SearchRequest, to_ndjson};
