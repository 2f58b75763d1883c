//! Indirect reference resolution.
//!
//! Resolution is an indexed lookup into the [`ObjectTable`]. A reference
//! whose target is missing, or whose chain loops, resolves to the last
//! reference reached; callers must accept a [`PdfValue::Reference`]
//! surviving resolution.

use tracing::trace;

use crate::object::{ObjId, PdfValue};
use crate::object_table::ObjectTable;

/// Follow a chain of references until a non-reference value is reached.
///
/// Non-reference values are returned as they are. Resolving the result a
/// second time returns an equal value.
pub fn dereference<'a>(value: &'a PdfValue, table: &'a ObjectTable) -> &'a PdfValue {
    let mut current = value;
    let mut visited: Vec<ObjId> = Vec::new();
    while let PdfValue::Reference(id) = current {
        if visited.contains(id) || visited.len() >= table.max_reference_depth() {
            trace!(object = %id, "reference cycle");
            return current;
        }
        visited.push(*id);
        match table.get(*id) {
            Some(next) => current = next,
            None => {
                trace!(object = %id, "dangling reference");
                return current;
            }
        }
    }
    current
}

/// Resolve an object by id, following any reference chain it starts.
pub fn resolve_id(id: ObjId, table: &ObjectTable) -> Option<&PdfValue> {
    let value = dereference(table.get(id)?, table);
    (!matches!(value, PdfValue::Reference(_))).then_some(value)
}

/// Replace the direct child references of `value` with their targets, in place.
///
/// Containers written inline are walked recursively. A substituted target
/// is not walked again in the same pass, so shared and cyclic sub-graphs
/// are expanded by one level only.
pub fn dereference_objects_deep(value: &mut PdfValue, table: &ObjectTable) {
    match value {
        PdfValue::Dict(dict) => dict
            .values_mut()
            .for_each(|child| resolve_child(child, table)),
        PdfValue::Stream(stream) => stream
            .dict
            .values_mut()
            .for_each(|child| resolve_child(child, table)),
        PdfValue::Array(items) => items
            .iter_mut()
            .for_each(|child| resolve_child(child, table)),
        _ => {}
    }
}

fn resolve_child(child: &mut PdfValue, table: &ObjectTable) {
    if matches!(child, PdfValue::Reference(_)) {
        let resolved = dereference(child, table).clone();
        *child = resolved;
    } else {
        dereference_objects_deep(child, table);
    }
}

/// Fully expand every reference reachable from `value`.
///
/// A reference to an object already on the current expansion path is kept
/// as a reference, which makes cyclic graphs finite. Shared sub-graphs are
/// copied once per use, so the result can be much larger than the input.
pub fn resolve_deep(value: &PdfValue, table: &ObjectTable) -> PdfValue {
    let mut path = Vec::new();
    expand(value, table, &mut path)
}

fn expand(value: &PdfValue, table: &ObjectTable, path: &mut Vec<ObjId>) -> PdfValue {
    match value {
        PdfValue::Reference(id) => {
            if path.contains(id) || path.len() >= table.max_reference_depth() {
                return value.clone();
            }
            let Some(target) = table.get(*id) else {
                return value.clone();
            };
            path.push(*id);
            let expanded = expand(target, table, path);
            path.pop();
            expanded
        }
        PdfValue::Dict(dict) => PdfValue::Dict(
            dict.iter()
                .map(|(k, v)| (k.clone(), expand(v, table, path)))
                .collect(),
        ),
        PdfValue::Array(items) => {
            PdfValue::Array(items.iter().map(|v| expand(v, table, path)).collect())
        }
        PdfValue::Stream(stream) => {
            let mut expanded = stream.clone();
            expanded.dict = stream
                .dict
                .iter()
                .map(|(k, v)| (k.clone(), expand(v, table, path)))
                .collect();
            PdfValue::Stream(expanded)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::PdfDict;
    use std::time::{Duration, Instant};

    fn reference(num: u32) -> PdfValue {
        PdfValue::Reference(ObjId::new(num, 0))
    }

    fn dict(entries: &[(&str, PdfValue)]) -> PdfValue {
        PdfValue::Dict(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<PdfDict>(),
        )
    }

    fn table(objects: &[(u32, PdfValue)]) -> ObjectTable {
        let mut table = ObjectTable::new();
        for (num, value) in objects {
            table.insert(ObjId::new(*num, 0), value.clone());
        }
        table
    }

    #[test]
    fn non_reference_is_unchanged() {
        let t = table(&[]);
        let v = PdfValue::Int(5);
        assert_eq!(dereference(&v, &t), &PdfValue::Int(5));
    }

    #[test]
    fn follows_chain() {
        let t = table(&[(1, reference(2)), (2, reference(3)), (3, PdfValue::Int(9))]);
        assert_eq!(dereference(&reference(1), &t), &PdfValue::Int(9));
        assert_eq!(resolve_id(ObjId::new(1, 0), &t), Some(&PdfValue::Int(9)));
    }

    #[test]
    fn dangling_reference_survives() {
        let t = table(&[(1, reference(99))]);
        assert_eq!(dereference(&reference(1), &t), &reference(99));
        assert_eq!(dereference(&reference(42), &t), &reference(42));
        assert_eq!(resolve_id(ObjId::new(1, 0), &t), None);
    }

    #[test]
    fn dereference_is_idempotent() {
        let t = table(&[
            (1, reference(2)),
            (2, dict(&[("Kids", reference(1))])),
            (3, reference(4)),
            (5, reference(6)),
            (6, reference(5)),
        ]);
        for v in [reference(1), reference(3), reference(5), reference(77), PdfValue::Null] {
            let once = dereference(&v, &t).clone();
            let twice = dereference(&once, &t).clone();
            assert_eq!(once, twice, "not idempotent for {v}");
        }
    }

    #[test]
    fn reference_cycle_terminates() {
        // 1 -> 2 -> 3 -> 4 -> 5 -> 1, pure reference chain
        let t = table(&[
            (1, reference(2)),
            (2, reference(3)),
            (3, reference(4)),
            (4, reference(5)),
            (5, reference(1)),
        ]);
        let start = Instant::now();
        assert!(matches!(dereference(&reference(1), &t), PdfValue::Reference(_)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn self_referencing_dictionary_resolves_deep() {
        // dict 1 reaches itself again through five indirections
        let t = table(&[
            (1, dict(&[("Type", PdfValue::Name("Node".into())), ("Next", reference(2))])),
            (2, reference(3)),
            (3, reference(4)),
            (4, reference(5)),
            (5, reference(1)),
        ]);
        let start = Instant::now();
        let resolved = resolve_deep(&reference(1), &t);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(resolved.get("Type"), Some(&PdfValue::Name("Node".into())));
        // the chain back to object 1 collapses to a reference
        assert!(matches!(resolved.get("Next"), Some(PdfValue::Reference(_))));
    }

    #[test]
    fn deep_resolution_expands_nested_targets() {
        let t = table(&[
            (1, dict(&[("Font", reference(2))])),
            (2, dict(&[("Widths", reference(3))])),
            (3, PdfValue::Array(vec![PdfValue::Int(500)])),
        ]);
        let resolved = resolve_deep(&reference(1), &t);
        assert_eq!(
            resolved.get("Font").and_then(|f| f.get("Widths")),
            Some(&PdfValue::Array(vec![PdfValue::Int(500)]))
        );
    }

    #[test]
    fn in_place_pass_substitutes_one_level() {
        let t = table(&[
            (2, dict(&[("Inner", reference(3))])),
            (3, PdfValue::Int(7)),
        ]);
        let mut value = dict(&[
            ("Direct", reference(2)),
            ("Inline", dict(&[("Deep", reference(3))])),
            ("List", PdfValue::Array(vec![reference(3), reference(404)])),
        ]);
        dereference_objects_deep(&mut value, &t);

        // substituted target keeps its own references
        assert_eq!(value.get("Direct").and_then(|d| d.get("Inner")), Some(&reference(3)));
        // inline containers are walked
        assert_eq!(
            value.get("Inline").and_then(|d| d.get("Deep")),
            Some(&PdfValue::Int(7))
        );
        assert_eq!(
            value.get("List"),
            Some(&PdfValue::Array(vec![PdfValue::Int(7), reference(404)]))
        );
    }

    #[test]
    fn in_place_pass_on_self_cycle_terminates() {
        let t = table(&[(1, dict(&[("Self", reference(1))]))]);
        let mut value = t.get(ObjId::new(1, 0)).unwrap().clone();
        dereference_objects_deep(&mut value, &t);
        dereference_objects_deep(&mut value, &t);
        assert!(value.get("Self").and_then(|s| s.get("Self")).is_some());
    }
}
