//! Merging child rows into their parents.

use std::collections::HashMap;

use tracing::warn;

use crate::config::MultipleMatchPolicy;
use crate::error::{QueryError, QueryResult};
use crate::row::{Row, RowExt};
use crate::value::{KeyValue, Value};

use super::spec::{AssociationFacts, Cardinality};

/// Attach `children` to `parents` under the association's name.
///
/// Children are grouped by the key they were fetched on and each parent looks
/// up its own key: the foreign key when it owns the association, its primary
/// key otherwise. Matching is strict value equality on canonical keys.
///
/// Singular associations receive the matching row or `Null`; collections
/// receive the matching rows in child order, or an empty list.
pub fn combine_data(
    parents: &mut [Row],
    children: Vec<Row>,
    facts: &AssociationFacts,
    policy: MultipleMatchPolicy,
) -> QueryResult<()> {
    let child_key = facts.child_key();
    let parent_key = facts.parent_key();

    let mut groups: HashMap<KeyValue, Vec<Row>> = HashMap::new();
    for child in children {
        if let Some(key) = child.key_of(child_key.key()) {
            groups.entry(key).or_default().push(child);
        }
    }

    for parent in parents.iter_mut() {
        let key = parent.key_of(parent_key.key());
        let matched = key.as_ref().and_then(|k| groups.get(k));
        let value = match facts.cardinality {
            Cardinality::Many => Value::Rows(matched.cloned().unwrap_or_default()),
            Cardinality::One => match matched.map(Vec::as_slice) {
                None | Some([]) => Value::Null,
                Some([only]) => Value::Row(only.clone()),
                Some(rows @ [first, ..]) => match policy {
                    MultipleMatchPolicy::First => {
                        warn!(
                            association = %facts.name,
                            matches = rows.len(),
                            "singular association matched several rows, keeping the first"
                        );
                        Value::Row(first.clone())
                    }
                    MultipleMatchPolicy::Error => {
                        let key = key.map(|k| k.to_string()).unwrap_or_default();
                        return Err(QueryError::not_unique(&facts.name, key, rows.len())
                            .with_entity(&facts.source_entity));
                    }
                },
            },
        };
        parent.insert(facts.name.clone(), value);
    }

    Ok(())
}
