use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One per-field full-text clause: match `text` against `field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchClause {
    #[serde(rename = "match")]
    pub text: String,
    pub field: String,
}

/// How full-text clauses combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Or,
    And,
}

/// Composed sub-query contributed by a widget.
///
/// A tagged variant rather than an untyped blob so serialization and
/// composition can be checked exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Match every document. Blank submissions compose to this, never to an
    /// empty disjunction.
    MatchAll,
    /// Full-text clauses combined with `operator`.
    FullText {
        clauses: Vec<MatchClause>,
        operator: Operator,
    },
    /// Raw text handed to the server's vector search.
    Semantic(String),
    /// Verbatim output of a caller-supplied query function.
    Opaque(Value),
}

impl Query {
    /// Wire shape for the full-text half of a query payload.
    ///
    /// `Semantic` has no full-text form and returns `None`; it travels in the
    /// payload's `semantic_search` field instead.
    pub fn full_text_value(&self) -> Option<Value> {
        match self {
            Query::MatchAll => Some(json!({ "match_all": {} })),
            Query::FullText { clauses, operator } => Some(match operator {
                Operator::Or => json!({ "disjunction": clauses }),
                Operator::And => json!({ "conjunction": clauses }),
            }),
            Query::Semantic(_) => None,
            Query::Opaque(value) => Some(value.clone()),
        }
    }

    /// Raw semantic text, when this query targets the vector index.
    pub fn semantic_text(&self) -> Option<&str> {
        match self {
            Query::Semantic(text) => Some(text),
            _ => None,
        }
    }
}
