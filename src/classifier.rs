//! Subject-line keyword classification.

use crate::model::category::CategoryTable;

/// Maps a subject to a category label using an ordered keyword table.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: CategoryTable,
}

impl Classifier {
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    /// Return the first category (in table order) with a keyword contained
    /// in the lower-cased subject, or the fallback category.
    pub fn classify(&self, subject: &str) -> &str {
        let subject = subject.to_lowercase();
        self.table
            .rules()
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| subject.contains(k.as_str())))
            .map(|rule| rule.name.as_str())
            .unwrap_or_else(|| self.table.fallback())
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }
}
