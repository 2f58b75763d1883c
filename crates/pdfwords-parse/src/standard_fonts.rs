//! Metrics for the standard 14 fonts.
//!
//! Used when a simple font omits `/Widths`. Widths are in glyph space
//! units (1/1000 em) and indexed by WinAnsi code; codes below 32 have no
//! width.

/// Metrics of one standard font face.
#[derive(Debug, Clone, Copy)]
pub struct StandardFont {
    pub name: &'static str,
    widths: Option<&'static [u16; 224]>,
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub bold: bool,
    pub italic: bool,
}

impl StandardFont {
    /// Width of `code` in glyph space units. Faces without a width table
    /// report a monospaced width.
    pub fn width(&self, code: u32) -> Option<f32> {
        let Some(widths) = self.widths else {
            return Some(COURIER_WIDTH);
        };
        let index = code.checked_sub(32)? as usize;
        widths
            .get(index)
            .copied()
            .filter(|w| *w > 0)
            .map(f32::from)
    }
}

const COURIER_WIDTH: f32 = 600.0;

/// Find the standard font a base font name refers to.
///
/// Accepts subset-tagged names (`ABCDEF+Helvetica`), the common Windows
/// aliases (`Arial`, `TimesNewRoman`, `CourierNew`) and comma style
/// suffixes (`Arial,BoldItalic`).
pub fn lookup(base_name: &str) -> Option<StandardFont> {
    let name = strip_subset_prefix(base_name);
    let (family, style) = match name.split_once([',', '-']) {
        Some((family, style)) => (family, style),
        None => (name, ""),
    };
    let style = style.to_ascii_lowercase();
    let bold = style.contains("bold");
    let italic = style.contains("italic") || style.contains("oblique");

    let face = match family {
        "Helvetica" | "Arial" | "ArialMT" => match bold {
            true => helvetica_bold(),
            false => helvetica(),
        },
        "Times" | "TimesNewRoman" | "TimesNewRomanPS" | "TimesNewRomanPSMT" => {
            match (bold, italic) {
                (true, _) => times_bold(),
                (false, true) => times_italic(),
                (false, false) => times_roman(),
            }
        }
        "Courier" | "CourierNew" | "CourierNewPSMT" => courier(),
        "Symbol" | "ZapfDingbats" => StandardFont {
            name: "Symbol",
            widths: None,
            ascent: 1010.0,
            descent: -293.0,
            cap_height: 700.0,
            bold: false,
            italic: false,
        },
        _ => return None,
    };
    Some(StandardFont {
        bold,
        italic,
        ..face
    })
}

/// Strip a six-letter subset tag such as `ABCDEF+`.
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => {
            rest
        }
        _ => name,
    }
}

fn helvetica() -> StandardFont {
    StandardFont {
        name: "Helvetica",
        widths: Some(&HELVETICA),
        ascent: 718.0,
        descent: -207.0,
        cap_height: 718.0,
        bold: false,
        italic: false,
    }
}

fn helvetica_bold() -> StandardFont {
    StandardFont {
        name: "Helvetica-Bold",
        widths: Some(&HELVETICA_BOLD),
        ..helvetica()
    }
}

fn times_roman() -> StandardFont {
    StandardFont {
        name: "Times-Roman",
        widths: Some(&TIMES_ROMAN),
        ascent: 683.0,
        descent: -217.0,
        cap_height: 662.0,
        bold: false,
        italic: false,
    }
}

fn times_bold() -> StandardFont {
    StandardFont {
        name: "Times-Bold",
        widths: Some(&TIMES_BOLD),
        cap_height: 676.0,
        ..times_roman()
    }
}

fn times_italic() -> StandardFont {
    StandardFont {
        name: "Times-Italic",
        widths: Some(&TIMES_ITALIC),
        cap_height: 653.0,
        ..times_roman()
    }
}

fn courier() -> StandardFont {
    StandardFont {
        name: "Courier",
        widths: None,
        ascent: 629.0,
        descent: -157.0,
        cap_height: 562.0,
        bold: false,
        italic: false,
    }
}

#[rustfmt::skip]
static HELVETICA: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0, 556, 0,
    222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0,
    500, 667, 278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556,
    584, 333, 737, 333, 400, 584, 333, 333, 333, 556, 537, 278, 333, 333,
    365, 556, 834, 834, 834, 611, 667, 667, 667, 667, 667, 667, 1000, 722,
    667, 667, 667, 667, 278, 278, 278, 278, 722, 722, 778, 778, 778, 778,
    778, 584, 778, 722, 722, 722, 722, 667, 667, 611, 556, 556, 556, 556,
    556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0, 556, 0,
    278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0,
    500, 667, 278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556,
    584, 333, 737, 333, 400, 584, 333, 333, 333, 611, 556, 278, 333, 333,
    365, 556, 834, 834, 834, 611, 722, 722, 722, 722, 722, 722, 1000, 722,
    667, 667, 667, 667, 278, 278, 278, 278, 722, 722, 778, 778, 778, 778,
    778, 584, 778, 722, 722, 722, 722, 667, 667, 611, 556, 556, 556, 556,
    556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278, 611, 611,
    611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

#[rustfmt::skip]
static TIMES_ROMAN: [u16; 224] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278,
    564, 564, 564, 444, 921, 722, 667, 667, 722, 611, 556, 722, 722, 333,
    389, 722, 611, 889, 722, 722, 556, 722, 667, 556, 611, 722, 722, 944,
    722, 722, 611, 333, 278, 333, 469, 500, 333, 444, 500, 444, 500, 444,
    333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389,
    278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, 0, 500, 0,
    333, 500, 444, 1000, 500, 500, 333, 1000, 556, 333, 889, 0, 611, 0,
    0, 333, 333, 444, 444, 350, 500, 1000, 333, 980, 389, 333, 722, 0,
    444, 722, 250, 333, 500, 500, 500, 500, 200, 500, 333, 760, 276, 500,
    564, 333, 760, 333, 400, 564, 300, 300, 333, 500, 453, 250, 333, 300,
    310, 500, 750, 750, 750, 444, 722, 722, 722, 722, 722, 722, 889, 667,
    611, 611, 611, 611, 333, 333, 333, 333, 722, 722, 722, 722, 722, 722,
    722, 564, 722, 722, 722, 722, 722, 722, 556, 500, 444, 444, 444, 444,
    444, 444, 667, 444, 444, 444, 444, 444, 278, 278, 278, 278, 500, 500,
    500, 500, 500, 500, 500, 564, 500, 500, 500, 500, 500, 500, 500, 500,
];

#[rustfmt::skip]
static TIMES_BOLD: [u16; 224] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333,
    570, 570, 570, 500, 930, 722, 667, 722, 722, 667, 611, 778, 778, 389,
    500, 778, 667, 944, 722, 778, 611, 778, 722, 556, 667, 722, 722, 1000,
    722, 722, 667, 333, 278, 333, 581, 500, 333, 500, 556, 444, 556, 444,
    333, 500, 556, 278, 333, 556, 278, 833, 556, 500, 556, 556, 444, 389,
    333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520, 0, 500, 0,
    333, 500, 500, 1000, 500, 500, 333, 1000, 556, 333, 1000, 0, 667, 0,
    0, 333, 333, 500, 500, 350, 500, 1000, 333, 1000, 389, 333, 722, 0,
    444, 722, 250, 333, 500, 500, 500, 500, 220, 500, 333, 747, 300, 500,
    570, 333, 747, 333, 400, 570, 300, 300, 333, 556, 540, 250, 333, 300,
    330, 500, 750, 750, 750, 500, 722, 722, 722, 722, 722, 722, 1000, 722,
    667, 667, 667, 667, 389, 389, 389, 389, 722, 722, 778, 778, 778, 778,
    778, 570, 778, 722, 722, 722, 722, 722, 611, 556, 500, 500, 500, 500,
    500, 500, 722, 444, 444, 444, 444, 444, 278, 278, 278, 278, 500, 556,
    500, 500, 500, 500, 500, 570, 500, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
static TIMES_ITALIC: [u16; 224] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333,
    675, 675, 675, 500, 920, 611, 611, 667, 722, 611, 611, 722, 722, 333,
    444, 667, 556, 833, 667, 722, 611, 722, 611, 500, 556, 722, 611, 833,
    611, 556, 556, 389, 278, 389, 422, 500, 333, 500, 500, 444, 500, 444,
    278, 500, 500, 278, 278, 444, 278, 722, 500, 500, 500, 500, 389, 389,
    278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541, 0, 500, 0,
    333, 500, 556, 889, 500, 500, 333, 1000, 500, 333, 944, 0, 556, 0,
    0, 333, 333, 556, 556, 350, 500, 889, 333, 980, 389, 333, 667, 0,
    389, 556, 250, 389, 500, 500, 500, 500, 275, 500, 333, 760, 276, 500,
    675, 333, 760, 333, 400, 675, 300, 300, 333, 500, 523, 250, 333, 300,
    310, 500, 750, 750, 750, 500, 611, 611, 611, 611, 611, 611, 889, 667,
    611, 611, 611, 611, 333, 333, 333, 333, 722, 667, 722, 722, 722, 722,
    722, 675, 722, 722, 722, 722, 722, 556, 611, 500, 500, 500, 500, 500,
    500, 500, 667, 444, 444, 444, 444, 444, 278, 278, 278, 278, 500, 500,
    500, 500, 500, 500, 500, 675, 500, 500, 500, 500, 500, 444, 500, 444,
];
