use std::path::Path;

use pdfwords_parse::{ObjectTable, PdfValue};

use crate::shared::open_object_table;

pub fn run(file: &Path, values: bool) -> Result<(), i32> {
    let table = open_object_table(file)?;
    for line in object_lines(&table, values) {
        println!("{line}");
    }
    Ok(())
}

/// One line per object in ascending id order: key, kind, `/Type` when the
/// object has one, and optionally the value itself.
fn object_lines(table: &ObjectTable, values: bool) -> Vec<String> {
    table
        .ids()
        .into_iter()
        .filter_map(|id| table.get(id).map(|value| (id, value)))
        .map(|(id, value)| {
            let type_name = match value {
                PdfValue::Dict(_) => value.get("Type").and_then(PdfValue::as_name),
                PdfValue::Stream(stream) => stream.type_name(),
                _ => None,
            };
            let mut line = format!("{}\t{}\t{}", id.key(), value.kind(), type_name.unwrap_or("-"));
            if values {
                line.push('\t');
                line.push_str(&summarize(value));
            }
            line
        })
        .collect()
}

/// Single-line rendering; stream bodies are replaced by their length.
fn summarize(value: &PdfValue) -> String {
    match value {
        PdfValue::Stream(stream) => format!(
            "{} stream ({} bytes)",
            PdfValue::Dict(stream.dict.clone()),
            stream.raw.len()
        ),
        other => other.to_string().replace(['\r', '\n'], " "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfwords_parse::{ObjId, PdfDict, PdfStream};

    fn sample_table() -> ObjectTable {
        let mut table = ObjectTable::new();
        let mut catalog = PdfDict::new();
        catalog.insert("Type".to_string(), PdfValue::Name("Catalog".to_string()));
        catalog.insert("Pages".to_string(), PdfValue::Reference(ObjId::new(2, 0)));
        table.insert(ObjId::new(1, 0), PdfValue::Dict(catalog));
        table.insert(ObjId::new(10, 0), PdfValue::Int(7));

        let mut dict = PdfDict::new();
        dict.insert("Length".to_string(), PdfValue::Int(5));
        table.insert(
            ObjId::new(3, 0),
            PdfValue::Stream(PdfStream::new(dict, b"BT ET".to_vec())),
        );
        table
    }

    #[test]
    fn lists_objects_in_id_order() {
        let lines = object_lines(&sample_table(), false);
        assert_eq!(
            lines,
            vec!["1 0\tdict\tCatalog", "3 0\tstream\t-", "10 0\tint\t-"]
        );
    }

    #[test]
    fn values_replace_stream_body_with_length() {
        let lines = object_lines(&sample_table(), true);
        assert!(lines[0].contains("/Pages 2 0 R"));
        assert!(lines[1].ends_with("stream (5 bytes)"));
        assert!(lines[2].ends_with("\t7"));
    }
}
