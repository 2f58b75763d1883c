use std::ops::RangeInclusive;

/// Parse a page selection such as `"1,3-5,8-"` into sorted, 0-indexed
/// page numbers.
///
/// Pages are 1-indexed on input. `N-` runs to the last page. Duplicates
/// are removed.
pub fn parse_page_range(input: &str, page_count: usize) -> Result<Vec<usize>, String> {
    let mut pages = Vec::new();

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        for page in parse_part(part, page_count)? {
            pages.push(page - 1);
        }
    }

    if pages.is_empty() {
        return Err(format!("no pages selected by '{input}'"));
    }
    pages.sort_unstable();
    pages.dedup();
    Ok(pages)
}

fn parse_part(part: &str, page_count: usize) -> Result<RangeInclusive<usize>, String> {
    let (start, end) = match part.split_once('-') {
        Some((start, end)) if end.trim().is_empty() => (parse_page(start)?, page_count),
        Some((start, end)) => (parse_page(start)?, parse_page(end)?),
        None => {
            let page = parse_page(part)?;
            (page, page)
        }
    };

    if start > end {
        return Err(format!("descending page range '{part}'"));
    }
    for page in [start, end] {
        if page > page_count {
            return Err(format!(
                "page {page} exceeds document page count ({page_count})"
            ));
        }
    }
    Ok(start..=end)
}

fn parse_page(text: &str) -> Result<usize, String> {
    let text = text.trim();
    match text.parse::<usize>() {
        Ok(0) => Err("page 0 is invalid (pages start at 1)".to_string()),
        Ok(page) => Ok(page),
        Err(_) => Err(format!("invalid page number: '{text}'")),
    }
}
