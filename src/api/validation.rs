use crate::constants::discover::DEFAULT_PAGE;

/// Anything that is not a positive integer becomes the first page.
pub fn parse_page(page: Option<&str>) -> u32 {
    page.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|&p| p > 0)
        .unwrap_or(DEFAULT_PAGE)
}
