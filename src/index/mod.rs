// Schema vector index module
// LanceDB-backed collections for table, column, and sample query documents

pub mod store;

pub use store::{SchemaIndex, ScoredDocument};

/// The three independently queryable collections of the schema index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Tables,
    Columns,
    SampleQueries,
}

impl CollectionKind {
    pub const ALL: [Self; 3] = [Self::Tables, Self::Columns, Self::SampleQueries];

    /// LanceDB table name backing this collection
    #[inline]
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Tables => "tables",
            Self::Columns => "columns",
            Self::SampleQueries => "sample_queries",
        }
    }

    /// Human-readable label for progress and status output
    #[inline]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Tables => "table descriptions",
            Self::Columns => "column descriptions",
            Self::SampleQueries => "sample queries",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}
