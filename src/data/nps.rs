//! National Park Service website scraper
//!
//! Reads the state index from the nps.gov home page, the list of sites on a
//! state page, and the details of each site from its own page. All pages are
//! fetched through the response cache.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::{site_root, NationalSite, StateIndex};
use crate::cache::{CachedFetcher, FetchError};

/// Base URL for the National Park Service website
pub const NPS_BASE_URL: &str = "https://www.nps.gov";

/// Home page path that carries the state drop-down
const HOME_PAGE: &str = "index.htm";

/// Appended to a site link to reach its detail page
const SITE_PAGE: &str = "index.htm";

static STATE_LIST: LazyLock<Selector> =
    LazyLock::new(|| selector("ul.dropdown-menu.SearchBar-keywordSearch"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static PARK_LIST: LazyLock<Selector> = LazyLock::new(|| selector("div#parkListResultsArea"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h3"));
static TITLE_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| selector("div.Hero-titleContainer"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("a.Hero-title"));
static DESIGNATION_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| selector("div.Hero-designationContainer"));
static DESIGNATION: LazyLock<Selector> = LazyLock::new(|| selector("span.Hero-designation"));
static CITY: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[itemprop="addressLocality"]"#));
static REGION: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[itemprop="addressRegion"]"#));
static POSTAL_CODE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[itemprop="postalCode"]"#));
static PHONE: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[itemprop="telephone"]"#));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

/// Errors that can occur when scraping nps.gov pages
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Page could not be retrieved
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A required element is absent from the page
    #[error("Page is missing the {0}")]
    MissingElement(&'static str),

    /// A link on the page could not be resolved to a URL
    #[error("Invalid link '{href}': {source}")]
    InvalidLink {
        href: String,
        #[source]
        source: url::ParseError,
    },
}

/// Client for the National Park Service website
#[derive(Debug, Clone)]
pub struct NpsClient {
    /// Site root that relative links are resolved against
    base_url: Url,
}

impl NpsClient {
    /// Creates a client for the site rooted at `base_url`
    ///
    /// Pages are resolved under the base path, so a mirror at
    /// `http://host/nps` serves the home page from `http://host/nps/index.htm`.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url: site_root(base_url),
        }
    }

    /// Builds the map of state names to state page URLs from the home page
    ///
    /// e.g. `michigan -> https://www.nps.gov/state/mi/index.htm`
    pub async fn build_state_url_dict(
        &self,
        fetcher: &mut CachedFetcher,
    ) -> Result<StateIndex, ScrapeError> {
        let url = self.resolve(HOME_PAGE)?;
        let html = fetcher.get_text(&url).await?;
        let index = parse_state_index(&html, &self.base_url)?;
        info!(states = index.len(), "loaded state index");
        Ok(index)
    }

    /// Scrapes one site detail page into a [`NationalSite`]
    pub async fn get_site_instance(
        &self,
        fetcher: &mut CachedFetcher,
        site_url: &Url,
    ) -> Result<NationalSite, ScrapeError> {
        let html = fetcher.get_text(site_url).await?;
        parse_site(&html)
    }

    /// Scrapes every site listed on a state page, in page order
    pub async fn get_sites_for_state(
        &self,
        fetcher: &mut CachedFetcher,
        state_url: &Url,
    ) -> Result<Vec<NationalSite>, ScrapeError> {
        let html = fetcher.get_text(state_url).await?;
        let links = parse_site_links(&html)?;
        debug!(state_url = %state_url, links = links.len(), "found site links");

        let mut sites = Vec::with_capacity(links.len());
        for href in links {
            let site_url = self.resolve(&format!("{href}{SITE_PAGE}"))?;
            sites.push(self.get_site_instance(fetcher, &site_url).await?);
        }

        info!(state_url = %state_url, sites = sites.len(), "scraped state");
        Ok(sites)
    }

    fn resolve(&self, href: &str) -> Result<Url, ScrapeError> {
        resolve_link(&self.base_url, href)
    }
}

/// Resolves a site link under `root`
///
/// Root-relative hrefs such as `/state/mi/index.htm` stay under the root's
/// path instead of replacing it. Absolute and protocol-relative links are
/// joined as usual.
fn resolve_link(root: &Url, href: &str) -> Result<Url, ScrapeError> {
    let relative = if href.starts_with("//") {
        href
    } else {
        href.trim_start_matches('/')
    };
    root.join(relative)
        .map_err(|source| ScrapeError::InvalidLink {
            href: href.to_string(),
            source,
        })
}

/// Parses the state drop-down on the nps.gov home page
///
/// Each direct `li` child of the list contributes its first link; the link
/// text (lowercased) becomes the state name. Links resolve under `base_url`.
pub fn parse_state_index(html: &str, base_url: &Url) -> Result<StateIndex, ScrapeError> {
    let root = site_root(base_url.clone());
    let document = Html::parse_document(html);
    let list = document
        .select(&STATE_LIST)
        .next()
        .ok_or(ScrapeError::MissingElement("state list"))?;

    let mut index = StateIndex::new();
    for item in list.children().filter_map(ElementRef::wrap) {
        if item.value().name() != "li" {
            continue;
        }
        let Some(anchor) = item.select(&ANCHOR).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let url = resolve_link(&root, href)?;
        index.insert(&element_text(anchor), url);
    }

    Ok(index)
}

/// Parses the relative site links from a state page
///
/// Only list items with an `h3` heading link are sites; other list items on the
/// page (navigation, filters) are skipped.
pub fn parse_site_links(html: &str) -> Result<Vec<String>, ScrapeError> {
    let document = Html::parse_document(html);
    let results = document
        .select(&PARK_LIST)
        .next()
        .ok_or(ScrapeError::MissingElement("park list"))?;

    let links = results
        .select(&LIST_ITEM)
        .filter_map(|item| item.select(&HEADING).next())
        .filter_map(|heading| heading.select(&ANCHOR).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
        .collect();

    Ok(links)
}

/// Parses a site detail page
///
/// The title and designation containers are required. Everything else is
/// optional and left as `None` when absent or blank.
pub fn parse_site(html: &str) -> Result<NationalSite, ScrapeError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_CONTAINER)
        .next()
        .ok_or(ScrapeError::MissingElement("title container"))?
        .select(&TITLE)
        .next()
        .ok_or(ScrapeError::MissingElement("title"))?;

    let designation = document
        .select(&DESIGNATION_CONTAINER)
        .next()
        .ok_or(ScrapeError::MissingElement("designation container"))?;

    Ok(NationalSite {
        category: optional_text(designation, &DESIGNATION),
        name: element_text(title),
        city: optional_text(document.root_element(), &CITY),
        region: optional_text(document.root_element(), &REGION),
        zipcode: optional_text(document.root_element(), &POSTAL_CODE),
        phone: optional_text(document.root_element(), &PHONE),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first match under `scope`; blank counts as absent
fn optional_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}
