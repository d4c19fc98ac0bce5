//! Core data models for npsearch
//!
//! This module contains the records scraped from the National Park Service
//! website and the nearby places returned by the MapQuest search API.

pub mod mapquest;
pub mod nps;

pub use mapquest::{MapQuestClient, NearbyError};
pub use nps::{NpsClient, ScrapeError};

use std::collections::BTreeMap;
use url::Url;

/// Returns `url` with a trailing `/` on its path
///
/// Relative paths joined onto the result extend the path instead of replacing
/// its last segment.
pub(crate) fn site_root(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Shown when a site has no designation
pub const NO_CATEGORY: &str = "No category";
/// Shown when a site has no city
pub const NO_ADDRESS: &str = "No address";
/// Shown when a site has no state/region
pub const NO_STATE: &str = "No state";
/// Shown when a site has no postal code
pub const NO_ZIPCODE: &str = "No zipcode";
/// Shown when a site has no phone number
pub const NO_PHONE: &str = "No phone number";

/// A protected site scraped from its nps.gov detail page
///
/// Only the name is required. Optional fields are `None` when the page does
/// not carry them; the `*_or_default` accessors supply the text shown to the
/// user in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NationalSite {
    /// Designation, e.g. "National Park" or "National Lakeshore"
    pub category: Option<String>,
    /// Site name, e.g. "Isle Royale"
    pub name: String,
    /// City, e.g. "Houghton"
    pub city: Option<String>,
    /// State or region code, e.g. "MI"
    pub region: Option<String>,
    /// Postal code, e.g. "49931" or "82190-0168"
    pub zipcode: Option<String>,
    /// Phone number, e.g. "(906) 482-0984"
    pub phone: Option<String>,
}

impl NationalSite {
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(NO_CATEGORY)
    }

    pub fn city_or_default(&self) -> &str {
        self.city.as_deref().unwrap_or(NO_ADDRESS)
    }

    pub fn region_or_default(&self) -> &str {
        self.region.as_deref().unwrap_or(NO_STATE)
    }

    pub fn zipcode_or_default(&self) -> &str {
        self.zipcode.as_deref().unwrap_or(NO_ZIPCODE)
    }

    pub fn phone_or_default(&self) -> &str {
        self.phone.as_deref().unwrap_or(NO_PHONE)
    }

    /// City and region joined for display, e.g. "Houghton, MI"
    pub fn address(&self) -> String {
        format!("{}, {}", self.city_or_default(), self.region_or_default())
    }

    /// One-line summary, e.g. "Isle Royale (National Park) : Houghton, MI 49931"
    pub fn info(&self) -> String {
        format!(
            "{} ({}) : {} {}",
            self.name,
            self.category_or_default(),
            self.address(),
            self.zipcode_or_default()
        )
    }
}

/// Shown when a nearby place has no category
pub const NO_PLACE_CATEGORY: &str = "no category";
/// Shown when a nearby place has no street address
pub const NO_PLACE_ADDRESS: &str = "no address";
/// Shown when a nearby place has no city
pub const NO_PLACE_CITY: &str = "no city";

/// A point of interest near a site, as returned by the search API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbyPlace {
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

impl NearbyPlace {
    /// One-line summary, e.g. "Cafe (Restaurants) : 1 Main St, Houghton"
    pub fn info(&self) -> String {
        format!(
            "{} ({}) : {}, {}",
            self.name,
            self.category.as_deref().unwrap_or(NO_PLACE_CATEGORY),
            self.address.as_deref().unwrap_or(NO_PLACE_ADDRESS),
            self.city.as_deref().unwrap_or(NO_PLACE_CITY)
        )
    }
}

/// State names mapped to their nps.gov state pages
///
/// Names are stored lowercase and looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateIndex {
    states: BTreeMap<String, Url>,
}

impl StateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a state, normalizing its name
    pub fn insert(&mut self, name: &str, url: Url) {
        self.states.insert(name.trim().to_lowercase(), url);
    }

    /// Looks up a state page URL by name, ignoring case and surrounding spaces
    pub fn get(&self, name: &str) -> Option<&Url> {
        self.states.get(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
