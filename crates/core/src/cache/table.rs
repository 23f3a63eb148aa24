//! Quoted table identifiers for statement text.

use std::fmt;

use crate::config::CacheConfig;

/// Quoted, optionally schema-qualified cache table.
///
/// Names are validated as plain identifiers by `CacheConfig::validate`
/// before they reach this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    schema: Option<String>,
    table: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, table: &str) -> Self {
        Self { schema: schema.map(str::to_owned), table: table.to_owned() }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.schema_name.as_deref(), &config.table_name)
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Quoted schema identifier, if one is configured.
    pub fn quoted_schema(&self) -> Option<String> {
        self.schema.as_deref().map(quote)
    }

    /// Name of the `expires_at` index.
    pub fn expiry_index(&self) -> String {
        quote(&format!("{}_expires_at", self.table))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", quote(schema), quote(&self.table)),
            None => f.write_str(&quote(&self.table)),
        }
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
