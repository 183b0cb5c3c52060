// Scraper for u.today Bitcoin news
//
// Fetches the search-results page, resolves per-article detail links, and
// extracts title/date/author/body via fixed structural selectors. A failure
// on any single article is logged and skipped; the batch continues.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::db::{Article, Sentiment};
use crate::sentiment;
use crate::utils;

/// Fixed search-results URL for Bitcoin news.
pub const SEARCH_URL: &str = "https://u.today/search/node?keys=bitcoin";

/// Origin for resolving relative article links.
pub const ORIGIN: &str = "https://u.today";

/// Sentinel used when a structural selector misses.
const MISSING: &str = "N/A";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector '{}': {}", css, e))
}

/// Resolve a candidate href against the fixed origin.
///
/// Absolute links (starting with `http`) pass through unchanged, relative
/// ones are prefixed with the origin, a missing href resolves to `None`.
pub fn resolve_link(href: Option<&str>, origin: &str) -> Option<String> {
    let href = href?;
    if href.starts_with("http") {
        Some(href.to_string())
    } else {
        Some(format!("{}{}", origin, href))
    }
}

/// Strip a leading "by" prefix from an author name, case-insensitively.
pub fn strip_author_prefix(name: &str) -> String {
    let trimmed = name.trim();
    match trimmed.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by") => trimmed[2..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract resolved detail-page links from the search-results page.
///
/// Candidates are `div.news__item` blocks; the link is the enclosing `<a>`
/// of the item's `div.news__item-title`. Unresolvable candidates are
/// skipped without error.
pub fn extract_listing_links(html: &str, origin: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let item_sel = selector("div.news__item")?;
    let title_sel = selector("div.news__item-title")?;

    let mut links = Vec::new();
    for item in document.select(&item_sel) {
        let Some(title) = item.select(&title_sel).next() else {
            continue;
        };

        // nearest <a> ancestor of the title block carries the href
        let href = title
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "a")
            .and_then(|a| a.value().attr("href"));

        if let Some(link) = resolve_link(href, origin) {
            links.push(link);
        }
    }
    Ok(links)
}

/// Extract an article from its detail page.
///
/// Selector misses default to the `"N/A"` sentinel; an unparsable publish
/// date coerces to `None`. The sentiment label is computed over the body.
pub fn parse_article_page(html: &str, link: &str) -> Result<Article> {
    let document = Html::parse_document(html);
    let title_sel = selector("h1.article__title")?;
    let date_sel = selector("div.article__short-date")?;
    let author_sel = selector("div.author-brief__name")?;
    let body_sel = selector(r#"p[dir="ltr"]"#)?;

    let title = document
        .select(&title_sel)
        .next()
        .map(element_text)
        .unwrap_or_else(|| MISSING.to_string());

    let datetime = document
        .select(&date_sel)
        .next()
        .map(element_text)
        .and_then(|raw| utils::parse_datetime_day_first(&raw));

    let author = document
        .select(&author_sel)
        .next()
        .map(|el| strip_author_prefix(&element_text(el)))
        .unwrap_or_else(|| MISSING.to_string());

    let paragraphs: Vec<String> = document.select(&body_sel).map(element_text).collect();
    let content = if paragraphs.is_empty() {
        MISSING.to_string()
    } else {
        paragraphs.join("\n")
    };

    let label = if content == MISSING {
        Sentiment::Unknown
    } else {
        sentiment::label(&content)
    };

    Ok(Article {
        id: None,
        title,
        link: link.to_string(),
        author,
        datetime,
        content,
        sentiment: label,
    })
}

/// Scrape the search-results page and every resolvable detail page.
///
/// A non-200 listing response yields an empty batch; a failed detail fetch
/// skips that article only.
pub async fn scrape_articles(client: &Client, search_url: &str) -> Result<Vec<Article>> {
    let response = client
        .get(search_url)
        .send()
        .await
        .context("Failed to fetch search-results page")?;

    if !response.status().is_success() {
        warn!(
            "Search-results page returned {}, skipping article scrape",
            response.status()
        );
        return Ok(Vec::new());
    }

    let listing_html = response
        .text()
        .await
        .context("Failed to read search-results body")?;
    let links = extract_listing_links(&listing_html, ORIGIN)?;
    info!("Found {} article candidates", links.len());

    let mut articles = Vec::new();
    for link in links {
        match fetch_article(client, &link).await {
            Ok(Some(article)) => articles.push(article),
            Ok(None) => {}
            Err(e) => warn!("Error processing article {}: {:#}", link, e),
        }
    }

    info!("Scraped {} articles", articles.len());
    Ok(articles)
}

async fn fetch_article(client: &Client, link: &str) -> Result<Option<Article>> {
    let response = client
        .get(link)
        .send()
        .await
        .context("Failed to fetch article page")?;

    if !response.status().is_success() {
        warn!("Article {} returned {}, skipping", link, response.status());
        return Ok(None);
    }

    let html = response.text().await.context("Failed to read article body")?;
    parse_article_page(&html, link).map(Some)
}
