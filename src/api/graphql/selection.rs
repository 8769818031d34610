//! Field-name collection over a parsed GraphQL document.
//!
//! The dispatcher only needs to know which field names occur anywhere in the document,
//! so every selection set (operations, fragment definitions, inline fragments) is
//! flattened into one set.

use async_graphql_parser::types::{ExecutableDocument, Selection, SelectionSet};
use std::collections::HashSet;

pub fn collect_fields(document: &ExecutableDocument) -> HashSet<String> {
    let mut fields = HashSet::new();
    let mut visited_fragments = HashSet::new();

    for (_, operation) in document.operations.iter() {
        walk(
            document,
            &operation.node.selection_set.node,
            &mut fields,
            &mut visited_fragments,
        );
    }
    for fragment in document.fragments.values() {
        walk(
            document,
            &fragment.node.selection_set.node,
            &mut fields,
            &mut visited_fragments,
        );
    }

    fields
}

fn walk(
    document: &ExecutableDocument,
    selection_set: &SelectionSet,
    fields: &mut HashSet<String>,
    visited_fragments: &mut HashSet<String>,
) {
    for item in &selection_set.items {
        match &item.node {
            Selection::Field(field) => {
                fields.insert(field.node.name.node.to_string());
                walk(document, &field.node.selection_set.node, fields, visited_fragments);
            }
            Selection::InlineFragment(fragment) => {
                walk(document, &fragment.node.selection_set.node, fields, visited_fragments);
            }
            Selection::FragmentSpread(spread) => {
                let name = &spread.node.fragment_name.node;
                if !visited_fragments.insert(name.to_string()) {
                    continue;
                }
                if let Some(definition) = document.fragments.get(name) {
                    walk(document, &definition.node.selection_set.node, fields, visited_fragments);
                }
            }
        }
    }
}
