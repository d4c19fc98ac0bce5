//! Interactive session for npsearch
//!
//! This module contains the read loop and its two-level state machine: picking
//! a state, then browsing that state's sites and looking up places near one.

use std::io::{self, Write};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::cache::CachedFetcher;
use crate::data::{MapQuestClient, NationalSite, NpsClient, ScrapeError, StateIndex};
use crate::display;

/// Prompt shown while choosing a state
pub const STATE_PROMPT: &str =
    "Enter the name of a State you would like to search for. Or, enter \"exit\" to quit. ";

/// Prompt shown while a site list is on screen
pub const DETAIL_PROMPT: &str = "Choose the number for detail search or \"exit\" or \"back\". ";

/// Shown when input is not a known state
pub const INVALID_STATE: &str = "Enter proper state name.";

/// Shown when a site number is outside the list
pub const OUT_OF_RANGE: &str = "Sorry, that number is out of range. Would you like to try again? \
Search a term, a number in range, or enter \"exit\" to exit.";

/// Errors that end the session
#[derive(Debug, Error)]
pub enum AppError {
    /// Reading input or writing output failed
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The state index could not be loaded
    #[error("Failed to load the list of states: {0}")]
    StateIndex(#[from] ScrapeError),
}

/// Which level of the session the user is at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Waiting for a state name
    SelectState,
    /// A site list is shown and sites can be picked by number
    BrowseSites,
}

/// What the read loop should do after an input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    Back,
    Number(Option<usize>),
    Term(&'a str),
}

impl<'a> Command<'a> {
    fn parse(input: &'a str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case("exit") {
            Command::Exit
        } else if input.eq_ignore_ascii_case("back") {
            Command::Back
        } else if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            // Too many digits for usize is simply out of range
            Command::Number(input.parse().ok())
        } else {
            Command::Term(input)
        }
    }
}

/// Main application struct managing the session state
pub struct App {
    /// Current level of the session
    pub state: AppState,
    /// Sites from the most recent state search
    pub sites: Vec<NationalSite>,
    /// Known states and their pages
    states: StateIndex,
    /// Cached HTTP access shared by both clients
    fetcher: CachedFetcher,
    /// nps.gov scraper
    nps_client: NpsClient,
    /// Nearby places client
    mapquest_client: MapQuestClient,
}

impl App {
    /// Creates a new App with an empty state index
    ///
    /// Call [`App::load_states`] before handling input.
    pub fn new(
        fetcher: CachedFetcher,
        nps_client: NpsClient,
        mapquest_client: MapQuestClient,
    ) -> Self {
        Self {
            state: AppState::SelectState,
            sites: Vec::new(),
            states: StateIndex::new(),
            fetcher,
            nps_client,
            mapquest_client,
        }
    }

    /// The response cache
    pub fn fetcher(&self) -> &CachedFetcher {
        &self.fetcher
    }

    /// Loads the state names from the nps.gov home page
    pub async fn load_states(&mut self) -> Result<(), AppError> {
        self.states = self
            .nps_client
            .build_state_url_dict(&mut self.fetcher)
            .await?;
        if self.states.is_empty() {
            warn!("state index is empty, no state name will be accepted");
        }
        Ok(())
    }

    /// Prompt for the current state
    pub fn prompt(&self) -> &'static str {
        match self.state {
            AppState::SelectState => STATE_PROMPT,
            AppState::BrowseSites => DETAIL_PROMPT,
        }
    }

    /// Runs the read loop until "exit" or end of input
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        loop {
            write!(out, "{}", self.prompt())?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                debug!("end of input");
                writeln!(out)?;
                return Ok(());
            };

            if self.handle_input(&line, out).await? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Handles one line of user input
    ///
    /// Lookup failures are reported to the user and the session continues;
    /// only terminal I/O errors are returned.
    pub async fn handle_input<W: Write>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> Result<Flow, AppError> {
        match (self.state, Command::parse(line)) {
            (_, Command::Exit) => return Ok(Flow::Exit),
            (AppState::BrowseSites, Command::Back) => self.state = AppState::SelectState,
            (AppState::BrowseSites, Command::Number(choice)) => {
                self.show_nearby(choice, out).await?
            }
            (AppState::SelectState, Command::Back | Command::Number(_)) => {
                writeln!(out, "{INVALID_STATE}")?
            }
            (_, Command::Term(term)) => self.search(term, out).await?,
        }
        Ok(Flow::Continue)
    }

    /// Lists the sites of `term` if it names a known state
    async fn search<W: Write>(&mut self, term: &str, out: &mut W) -> io::Result<()> {
        let Some(state_url) = self.states.get(term).cloned() else {
            return writeln!(out, "{INVALID_STATE}");
        };

        match self
            .nps_client
            .get_sites_for_state(&mut self.fetcher, &state_url)
            .await
        {
            Ok(sites) => {
                display::write_sites(out, term, &sites)?;
                self.sites = sites;
                self.state = AppState::BrowseSites;
                Ok(())
            }
            Err(e) => {
                debug!(state = term, error = %e, "state search failed");
                writeln!(out, "Error: {e}")
            }
        }
    }

    /// Shows places near the site numbered `choice` (1-based)
    async fn show_nearby<W: Write>(
        &mut self,
        choice: Option<usize>,
        out: &mut W,
    ) -> io::Result<()> {
        let Some(site) = choice
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.sites.get(i))
        else {
            return writeln!(out, "{OUT_OF_RANGE}");
        };

        match self
            .mapquest_client
            .get_nearby_places(&mut self.fetcher, site)
            .await
        {
            Ok(places) => display::write_places(out, site, &places),
            Err(e) => {
                debug!(site = %site.name, error = %e, "nearby search failed");
                writeln!(out, "Error: {e}")
            }
        }
    }
}
