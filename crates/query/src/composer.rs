use crate::query::{MatchClause, Operator, Query};

/// Build a widget's sub-query from its raw text and configuration.
///
/// Precedence, first match wins:
/// 1. semantic mode: the raw text itself travels to the vector search;
/// 2. a caller-supplied query function: its return value is used verbatim;
/// 3. a non-empty field list: an OR of per-field match clauses, except that
///    blank text composes to match-all;
/// 4. otherwise: match-all.
///
/// Blank text never yields an empty disjunction. A zero-clause query would
/// match nothing, and a blank submission is expected to show everything.
pub fn compose(
    raw_text: &str,
    fields: &[String],
    custom: Option<&dyn Fn(&str) -> Query>,
    semantic: bool,
) -> Query {
    if semantic {
        return Query::Semantic(raw_text.to_string());
    }
    if let Some(custom) = custom {
        return custom(raw_text);
    }
    if !fields.is_empty() {
        if raw_text.is_empty() {
            return Query::MatchAll;
        }
        let clauses = fields
            .iter()
            .map(|field| MatchClause {
                text: raw_text.to_string(),
                field: field.clone(),
            })
            .collect();
        return Query::FullText {
            clauses,
            operator: Operator::Or,
        };
    }
    log::debug!("compose: no fields and no custom query, falling back to match-all");
    Query::MatchAll
}
