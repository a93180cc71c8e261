use thiserror::Error;

/// A query declaration that cannot work against its entity.
///
/// Raised by [`QueryDefinitionBuilder::build`](crate::QueryDefinitionBuilder::build)
/// so a bad declaration fails when the application starts instead of on
/// the first request that happens to touch it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("{context} refers to `{column}`, which is not a column of `{table}`")]
    UnknownColumn {
        table: String,
        context: String,
        column: String,
    },

    #[error("filter hook `{0}` has no matching filter declaration")]
    UndeclaredFilterHook(String),

    #[error("default sort field `{0}` is neither a column nor a sort hook")]
    UnknownSortField(String),

    #[error("simple search filter `{0}` is declared but no name field is available")]
    MissingNameField(String),

    #[error("search relation `{0}` declares no columns")]
    EmptyRelation(String),
}
