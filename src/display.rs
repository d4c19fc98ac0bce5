//! Console formatting for site and place listings

use std::io::{self, Write};

use crate::data::{NationalSite, NearbyPlace};

const RULE: &str = "----------------------------------------";

/// Writes a title framed by dashed rules
pub fn write_header<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{RULE}")
}

/// Writes the numbered site list for a state
///
/// Numbers start at 1 and are the indices the user picks from.
pub fn write_sites<W: Write>(out: &mut W, state: &str, sites: &[NationalSite]) -> io::Result<()> {
    write_header(out, &format!("List of National Sites in {state}"))?;
    if sites.is_empty() {
        return writeln!(out, "No national sites found.");
    }
    for (i, site) in sites.iter().enumerate() {
        writeln!(out, "[{}] {}", i + 1, site.info())?;
    }
    Ok(())
}

/// Writes the places found near a site
pub fn write_places<W: Write>(
    out: &mut W,
    site: &NationalSite,
    places: &[NearbyPlace],
) -> io::Result<()> {
    write_header(out, &format!("Places Near {}", site.name))?;
    if places.is_empty() {
        return writeln!(out, "No places found nearby.");
    }
    for place in places {
        writeln!(out, " - {}", place.info())?;
    }
    Ok(())
}
