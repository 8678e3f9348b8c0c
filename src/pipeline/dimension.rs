use std::collections::HashMap;

use crate::parser::SqlValue;

/// A deduplicated lookup table built in source order.
///
/// Attribute tuples are compared by their SQL literals, so two rows that
/// would render identically always share an id. Ids start at 1 and follow
/// first occurrence.
#[derive(Debug, Default)]
pub struct Dimension {
    ids: HashMap<Vec<String>, i64>,
    rows: Vec<Vec<SqlValue>>,
}

impl Dimension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the tuple, assigning the next one if it is new
    pub fn intern(&mut self, attributes: Vec<SqlValue>) -> i64 {
        let key: Vec<String> = attributes.iter().map(SqlValue::to_sql_literal).collect();
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = self.rows.len() as i64 + 1;
        self.ids.insert(key, id);
        self.rows.push(attributes);
        id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Unique tuples in id order, without ids
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    /// Unique tuples in id order, id prepended
    pub fn rows_with_ids(&self) -> Vec<Vec<SqlValue>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, attrs)| {
                let mut row = Vec::with_capacity(attrs.len() + 1);
                row.push(SqlValue::Integer(i as i64 + 1));
                row.extend(attrs.iter().cloned());
                row
            })
            .collect()
    }
}
