//! End-to-end tests: PDF bytes → Document → words.
//!
//! Most test PDFs are written with lopdf; the object stream case is
//! assembled by hand because it needs exact offsets.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Object, Stream, dictionary};
use pdfwords_parse::pdfwords_core::{ExtractWarningCode, SimpleSplitter};
use pdfwords_parse::{Document, ObjId, PdfValue, get_page_words, parse_objects};

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Save a document whose single page uses `resources` and `content`.
fn save_single_page(mut doc: lopdf::Document, resources: lopdf::Dictionary, content: Stream) -> Vec<u8> {
    let content_id = doc.add_object(content);
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => Object::Reference(content_id),
        "Resources" => resources,
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
    });
    if let Ok(dict) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        dict.set("Parent", Object::Reference(pages_id));
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Single-page PDF with Helvetica as /F1.
fn pdf_with_content(content: Stream) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources = dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    };
    save_single_page(doc, resources, content)
}

fn page_texts(doc: &Document, index: usize) -> Vec<String> {
    doc.page_words(index, &SimpleSplitter)
        .unwrap()
        .value
        .into_iter()
        .map(|w| w.text)
        .collect()
}

#[test]
fn plain_content_stream() {
    let pdf = pdf_with_content(Stream::new(
        dictionary! {},
        b"BT /F1 12 Tf 72 720 Td (Hello World) Tj ET".to_vec(),
    ));
    let doc = Document::open(&pdf).unwrap();
    assert_eq!(doc.page_count(), 1);

    let words = doc.page_words(0, &SimpleSplitter).unwrap().value;
    let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello", "World"]);
    assert!((words[0].bbox.left - 72.0).abs() < 1e-3);
    assert_eq!(words[0].font_size_px, 12);
    assert_eq!(words[0].font.base_name, "Helvetica");
    assert!(words[0].font.object_id.is_some());
}

#[test]
fn flate_compressed_content() {
    let content = zlib(b"BT /F1 10 Tf 50 500 Td (Compressed text) Tj ET");
    let pdf = pdf_with_content(Stream::new(dictionary! { "Filter" => "FlateDecode" }, content));
    let doc = Document::open(&pdf).unwrap();
    assert_eq!(page_texts(&doc, 0), vec!["Compressed", "text"]);
}

#[test]
fn multiple_pages_in_order() {
    let mut doc = lopdf::Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Bold",
    });
    let mut page_ids = Vec::new();
    for text in ["one", "two", "three"] {
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        }));
    }
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        "Count" => 3,
    });
    for &pid in &page_ids {
        if let Ok(dict) = doc.get_object_mut(pid).and_then(Object::as_dict_mut) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    let mut pdf = Vec::new();
    doc.save_to(&mut pdf).unwrap();

    let doc = Document::open(&pdf).unwrap();
    let result = doc.words(&SimpleSplitter);
    let texts: Vec<&str> = result
        .value
        .iter()
        .map(|page| page[0].text.as_str())
        .collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert!(result.value.iter().all(|page| page[0].bold));
}

#[test]
fn composite_font_with_to_unicode() {
    let mut doc = lopdf::Document::with_version("1.5");
    let cmap = b"/CIDInit /ProcSet findresource begin 12 dict begin begincmap\n\
        1 begincodespacerange <0000> <FFFF> endcodespacerange\n\
        1 beginbfrange <0024> <0026> <0041> endbfrange\n\
        1 beginbfchar <0003> <0020> endbfchar\n\
        endcmap CMapName currentdict /CMap defineresource pop end end\n";
    let to_unicode = doc.add_object(Stream::new(dictionary! {}, cmap.to_vec()));
    let descendant = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "ABCDEF+NotoSans-Bold",
        "DW" => 600,
        "W" => vec![3.into(), vec![Object::Integer(260)].into()],
    });
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "ABCDEF+NotoSans-Bold",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(descendant)],
        "ToUnicode" => Object::Reference(to_unicode),
    });
    let resources = dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    };
    let content = Stream::new(
        dictionary! {},
        b"BT /F1 20 Tf 100 400 Td <002400250003002600240026> Tj ET".to_vec(),
    );
    let pdf = save_single_page(doc, resources, content);

    let doc = Document::open(&pdf).unwrap();
    let words = doc.page_words(0, &SimpleSplitter).unwrap().value;
    let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["AB", "CAC"]);
    assert!(words[0].bold);
    assert_eq!(words[0].font.base_name, "NotoSans-Bold");
    // two glyphs of the default width at 20pt
    assert!((words[0].bbox.width() - 24.0).abs() < 1e-3);
}

#[test]
fn form_xobject_text_is_extracted() {
    let mut doc = lopdf::Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let form_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 200.into(), 50.into()],
            "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 300.into(), 0.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "FX" => Object::Reference(font_id) },
            },
        },
        b"BT /FX 10 Tf 0 10 Td (stamp) Tj ET".to_vec(),
    ));
    let resources = dictionary! {
        "XObject" => dictionary! { "Fm0" => Object::Reference(form_id) },
    };
    let content = Stream::new(dictionary! {}, b"q 1 0 0 1 0 100 cm /Fm0 Do Q".to_vec());
    let pdf = save_single_page(doc, resources, content);

    let doc = Document::open(&pdf).unwrap();
    assert_eq!(doc.font_cache().len(), 1);
    let words = doc.page_words(0, &SimpleSplitter).unwrap().value;
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].text, "stamp");
    assert!((words[0].bbox.left - 300.0).abs() < 1e-3);
    // Courier: 600 units per glyph
    assert!((words[0].bbox.right - 330.0).abs() < 1e-3);
    assert_eq!(words[0].font.resource_name, "FX");
}

#[test]
fn missing_font_is_a_warning() {
    let pdf = pdf_with_content(Stream::new(
        dictionary! {},
        b"BT /F7 12 Tf 72 720 Td (lost) Tj /F1 12 Tf (found) Tj ET".to_vec(),
    ));
    let doc = Document::open(&pdf).unwrap();
    let result = doc.page_words(0, &SimpleSplitter).unwrap();
    let texts: Vec<&str> = result.value.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["found"]);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, ExtractWarningCode::MissingFont);
    assert_eq!(result.warnings[0].page, Some(0));
}

/// Hand-assembled PDF whose font and page tree live in a compressed
/// object stream.
fn pdf_with_object_stream() -> Vec<u8> {
    let members: [(u32, &str); 3] = [
        (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
        (3, "<< /Type /Page /Parent 2 0 R /Contents 6 0 R /Resources << /Font << /F1 4 0 R >> >> >>"),
        (4, "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Oblique >>"),
    ];
    let mut header = String::new();
    let mut body = String::new();
    for (num, text) in members {
        header.push_str(&format!("{num} {} ", body.len()));
        body.push_str(text);
        body.push('\n');
    }
    let first = header.len();
    let decoded = format!("{header}{body}");
    let compressed = zlib(decoded.as_bytes());

    let content = b"BT /F1 12 Tf 72 720 Td (Packed objects) Tj ET";
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.5\n");
    pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    pdf.extend_from_slice(
        format!(
            "5 0 obj\n<< /Type /ObjStm /N 3 /First {first} /Length {} /Filter /FlateDecode >>\nstream\n",
            compressed.len()
        )
        .as_bytes(),
    );
    pdf.extend_from_slice(&compressed);
    pdf.extend_from_slice(b"\nendstream\nendobj\n");
    pdf.extend_from_slice(format!("6 0 obj\n<< /Length {} >>\nstream\n", content.len()).as_bytes());
    pdf.extend_from_slice(content);
    pdf.extend_from_slice(b"\nendstream\nendobj\n");
    pdf.extend_from_slice(b"trailer\n<< /Root 1 0 R /Size 7 >>\n%%EOF\n");
    pdf
}

#[test]
fn object_stream_members_are_resolvable() {
    let pdf = pdf_with_object_stream();
    let table = parse_objects(&pdf).unwrap();
    assert!(table.contains(ObjId::new(4, 0)));

    let doc = Document::open(&pdf).unwrap();
    assert_eq!(doc.page_count(), 1);
    let words = doc.page_words(0, &SimpleSplitter).unwrap().value;
    let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["Packed", "objects"]);
    assert!(words[0].italic);
}

#[test]
fn page_object_parses_by_key() {
    let table = parse_objects(b"12 0 obj\n<< /Type /Page >>\nendobj\n").unwrap();
    let value = table.get_by_key("12 0").unwrap();
    assert_eq!(value.get("Type"), Some(&PdfValue::Name("Page".to_string())));
}

#[test]
fn get_page_words_on_raw_objects() {
    let pdf = pdf_with_content(Stream::new(
        dictionary! {},
        b"BT /F1 12 Tf 100 700 Td (Hi) Tj ET".to_vec(),
    ));
    let table = parse_objects(&pdf).unwrap();
    let page = table
        .iter()
        .filter_map(|(_, v)| v.as_dict())
        .find(|d| d.get("Type").and_then(PdfValue::as_name) == Some("Page"))
        .unwrap();
    let resources = page.get("Resources").and_then(PdfValue::as_dict).unwrap();

    let words = get_page_words(
        b"BT /F1 12 Tf 100 700 Td (Hi) Tj ET",
        resources,
        &table,
        &SimpleSplitter,
    );
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].text, "Hi");
    assert_eq!(words[0].font_size_px, 12);
}
