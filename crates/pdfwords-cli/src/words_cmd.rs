use std::path::Path;

use pdfwords_core::{ExtractOptions, ExtractWarning, PWord, SimpleSplitter, UnicodeNorm};
use pdfwords_parse::Document;

use crate::cli::OutputFormat;
use crate::shared::{ProgressReporter, open_document, print_warnings, resolve_pages};

pub fn run(
    file: &Path,
    pages: Option<&str>,
    format: OutputFormat,
    show_warnings: bool,
    unicode_norm: UnicodeNorm,
) -> Result<(), i32> {
    let options = ExtractOptions {
        collect_warnings: show_warnings,
        unicode_norm,
        ..ExtractOptions::default()
    };
    let doc = open_document(file, options)?;
    let page_indices = resolve_pages(pages, doc.page_count())?;

    let (words, warnings) = extract(&doc, &page_indices)?;
    match format {
        OutputFormat::Text => write_text(&words),
        OutputFormat::Json => write_json(&words)?,
    }

    if show_warnings {
        print_warnings(doc.warnings());
        print_warnings(&warnings);
    }
    Ok(())
}

/// Words of the selected pages tagged with their 1-indexed page number.
fn extract(
    doc: &Document,
    page_indices: &[usize],
) -> Result<(Vec<(usize, PWord)>, Vec<ExtractWarning>), i32> {
    let progress = ProgressReporter::new(page_indices.len());
    let mut words = Vec::new();
    let mut warnings = Vec::new();

    for (i, &idx) in page_indices.iter().enumerate() {
        progress.report(i + 1);

        let result = doc.page_words(idx, &SimpleSplitter).map_err(|e| {
            progress.finish();
            eprintln!("Error reading page {}: {e}", idx + 1);
            1
        })?;
        words.extend(result.value.into_iter().map(|w| (idx + 1, w)));
        warnings.extend(result.warnings);
    }

    progress.finish();
    Ok((words, warnings))
}

fn write_text(words: &[(usize, PWord)]) {
    println!("page\ttext\tleft\tbottom\tright\ttop\tsize\tbold\titalic\tfont");
    for (page, w) in words {
        println!(
            "{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{}\t{}\t{}\t{}",
            page,
            w.text,
            w.bbox.left,
            w.bbox.bottom,
            w.bbox.right,
            w.bbox.top,
            w.font_size_px,
            w.bold,
            w.italic,
            w.font.base_name,
        );
    }
}

fn write_json(words: &[(usize, PWord)]) -> Result<(), i32> {
    let entries: Vec<serde_json::Value> = words
        .iter()
        .map(|(page, w)| {
            serde_json::json!({
                "page": page,
                "text": w.text,
                "left": w.bbox.left,
                "bottom": w.bbox.bottom,
                "right": w.bbox.right,
                "top": w.bbox.top,
                "font_size_px": w.font_size_px,
                "bold": w.bold,
                "italic": w.italic,
                "font": w.font,
            })
        })
        .collect();

    let json_str = serde_json::to_string(&entries).map_err(|e| {
        eprintln!("Error: failed to serialize words: {e}");
        1
    })?;
    println!("{json_str}");
    Ok(())
}
