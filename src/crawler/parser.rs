//! HTML extraction for best-seller listings and product pages
//!
//! Listing pages yield a category name and one product summary per product
//! card. The landing page yields the seed categories of its carousel. Product
//! pages yield detail-only attributes (condition, seller, main image). Every lookup is best effort: missing markup produces absent fields,
//! never an error.

use crate::catalog::{Product, ProductDetails, Seller};
use crate::crawler::traits::{
    CategoryExtractor, DetailExtractor, ExtractedCategory, FetchedPage, SeedCategory,
};
use crate::ScoutError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

const PLACEHOLDER_IMAGE: &str = "data:image/gif;base64";

/// Extractor for the best-seller listing markup
pub struct HtmlExtractor {
    /// Product and category IDs share the marketplace prefix
    item_id: Regex,
    listing_heading: Regex,
    title_category: Regex,
    slug: Regex,
    digits: Regex,
}

impl HtmlExtractor {
    /// Creates an extractor recognising product IDs that start with `product_id_prefix`
    pub fn new(product_id_prefix: &str) -> Result<Self, ScoutError> {
        Ok(Self {
            item_id: Regex::new(&format!(r"{}\d+", regex::escape(product_id_prefix)))?,
            listing_heading: Regex::new(r"(?i)^\s*más vendidos en\s*")?,
            title_category: Regex::new(r"(?i)más vendidos en\s+([^|]+)")?,
            slug: Regex::new(r"/mas-vendidos/([^/?#]+)")?,
            digits: Regex::new(r"\d+")?,
        })
    }

    /// Category display name, trying the breadcrumb, the page title, prominent
    /// headings and the URL slug in that order
    fn category_name(&self, document: &Html, page: &FetchedPage, category_id: &str) -> String {
        if let Some(name) = first_text(document, "h1.breadcrumb__title") {
            return name;
        }

        for css in [
            "h2.ui-search-breadcrumb__title",
            "[class*='breadcrumb'][class*='title']",
        ] {
            if let Some(text) = first_text(document, css) {
                let name = self.strip_listing_heading(&text);
                if !name.is_empty() {
                    return name;
                }
            }
        }

        if let Some(title) = first_text(document, "title") {
            if let Some(captures) = self.title_category.captures(&title) {
                let name = captures[1].trim();
                if !name.is_empty() {
                    return name.to_string();
                }
            }
        }

        if let Ok(headings) = Selector::parse("h1, h2, h3") {
            let heading = document
                .select(&headings)
                .map(element_text)
                .find(|text| {
                    text.contains("vendido") || text.contains("categoría") || text.contains("productos")
                });
            if let Some(text) = heading {
                let name = self.strip_listing_heading(&text);
                if !name.is_empty() {
                    return name;
                }
            }
        }

        if let Some(captures) = self.slug.captures(&page.final_url) {
            let slug = &captures[1];
            if slug != category_id {
                return title_case_slug(slug);
            }
        }

        format!("Category {}", category_id)
    }

    fn strip_listing_heading(&self, text: &str) -> String {
        self.listing_heading.replace(text, "").trim().to_string()
    }

    fn product_card(&self, card: ElementRef<'_>, idx: usize) -> Option<Product> {
        let content = select_first(card, ".poly-card__content")?;

        let rank = select_first(content, ".poly-component__highlight").map(element_text);
        let title = select_first(content, "a.poly-component__title");

        let name = title
            .map(element_text)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Product {}", idx + 1));
        let link = title
            .and_then(|t| t.value().attr("href"))
            .unwrap_or_default()
            .to_string();

        let price = select_first(content, ".andes-money-amount__fraction")
            .map(|e| parse_price(&element_text(e)))
            .unwrap_or(0.0);

        let rating = select_first(content, ".poly-reviews__rating")
            .map(element_text)
            .filter(|r| !r.is_empty());
        let reviews_count = select_first(content, ".poly-reviews__total")
            .and_then(|e| parse_reviews(&element_text(e)));

        let position = rank
            .as_deref()
            .and_then(|r| self.digits.find(r))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(idx as u32 + 1);

        let id = self
            .item_id
            .find(&link)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| format!("unknown-{}", idx));

        Some(Product {
            id,
            name,
            price,
            link,
            image: card_image(card),
            position: Some(position),
            rating,
            reviews_count,
            condition: None,
            seller: None,
            category: String::new(),
            category_id: String::new(),
        })
    }
}

impl CategoryExtractor for HtmlExtractor {
    fn extract_category(&self, page: &FetchedPage, category_id: &str) -> Option<ExtractedCategory> {
        let document = Html::parse_document(&page.body);
        let cards = Selector::parse(".poly-card").ok()?;

        let products: Vec<Product> = document
            .select(&cards)
            .enumerate()
            .filter_map(|(idx, card)| self.product_card(card, idx))
            .collect();

        if products.is_empty() {
            return None;
        }

        Some(ExtractedCategory {
            name: self.category_name(&document, page, category_id),
            products,
        })
    }

    fn extract_seed_categories(&self, page: &FetchedPage) -> Vec<SeedCategory> {
        let document = Html::parse_document(&page.body);
        let Ok(carousels) = Selector::parse("div.dynamic-carousel__container--with-link") else {
            return Vec::new();
        };
        let base = Url::parse(&page.final_url).ok();
        let mut seen = HashSet::new();

        document
            .select(&carousels)
            .filter_map(|carousel| {
                let name = select_first(carousel, "h2.dynamic__carousel-title")
                    .map(element_text)
                    .filter(|name| !name.is_empty())?;
                let href = select_first(carousel, "a.dynamic__carousel-link")?
                    .value()
                    .attr("href")?;
                let url = match &base {
                    Some(base) => base.join(href).ok()?,
                    None => Url::parse(href).ok()?,
                };
                let id = self.item_id.find(url.as_str())?.as_str().to_string();
                Some(SeedCategory {
                    id,
                    name,
                    url: url.to_string(),
                })
            })
            .filter(|seed| seen.insert(seed.id.clone()))
            .collect()
    }
}

impl DetailExtractor for HtmlExtractor {
    fn extract_details(&self, page: &FetchedPage) -> ProductDetails {
        let document = Html::parse_document(&page.body);

        let seller = first_text(&document, ".ui-pdp-seller__link-trigger").map(|name| Seller {
            name,
            reputation: first_text(&document, ".ui-pdp-seller__sales-description"),
        });

        ProductDetails {
            condition: first_text(&document, ".ui-pdp-subtitle"),
            seller,
            image: detail_image(&document),
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

/// Text of the first element matching `css` in the document, if non-empty
fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn is_usable_image(src: &str) -> bool {
    !src.starts_with(PLACEHOLDER_IMAGE) && !src.contains("favicon") && src.contains("http")
}

/// First real image of a product card, skipping lazy-load placeholders
fn card_image(card: ElementRef<'_>) -> Option<String> {
    let mut sources = Vec::new();
    for css in [
        ".poly-card__portada img",
        ".poly-figure img",
        ".poly-component__picture",
        "img",
    ] {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for img in card.select(&selector) {
            sources.extend(img.value().attr("src"));
            sources.extend(img.value().attr("data-src"));
        }
    }

    sources
        .into_iter()
        .find(|src| is_usable_image(src))
        .map(str::to_string)
}

fn detail_image(document: &Html) -> Option<String> {
    for css in [".ui-pdp-gallery__figure img", ".ui-pdp-image"] {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let src = document
            .select(&selector)
            .next()
            .and_then(|img| img.value().attr("src"));
        if let Some(src) = src.filter(|s| !s.is_empty() && !s.contains(PLACEHOLDER_IMAGE)) {
            return Some(src.to_string());
        }
    }

    let selector = Selector::parse("img").ok()?;
    document.select(&selector).find_map(|img| {
        let src = img.value().attr("src").unwrap_or_default();
        let data_src = img.value().attr("data-src").unwrap_or_default();
        if !src.is_empty() && !src.contains(PLACEHOLDER_IMAGE) && src.contains("http") {
            Some(src.to_string())
        } else if data_src.contains("http") {
            Some(data_src.to_string())
        } else {
            None
        }
    })
}

/// Parses a price using `.` as thousands separator and `,` as decimal mark
///
/// Returns 0 for unparseable input.
pub fn parse_price(text: &str) -> f64 {
    let normalized: String = text
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    normalized
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .unwrap_or(0.0)
}

/// Parses a review total such as "(1.234)"
pub fn parse_reviews(text: &str) -> Option<u64> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '.' | ','))
        .collect();
    digits.trim().parse().ok()
}

/// "juegos-y-juguetes" -> "Juegos Y Juguetes"
fn title_case_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
