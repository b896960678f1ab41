//! Venue registry listing.

use tabled::Tabled;

use hallctl_core::Venue;

use crate::error::CliError;
use crate::output;

use super::{AppContext, util};

#[derive(Tabled)]
struct VenueRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Audio")]
    audio: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
}

impl From<&Venue> for VenueRow {
    fn from(v: &Venue) -> Self {
        Self {
            id: v.id.clone(),
            name: v.name.clone(),
            endpoint: v.endpoint(),
            device: v.device_id.clone(),
            audio: util::or_unknown(v.audio_device_id.as_deref()),
            protocol: v.protocol.to_string(),
        }
    }
}

pub fn handle(ctx: &AppContext) -> Result<(), CliError> {
    let venues = ctx.venues()?;
    let out = output::render_list(ctx.output, &venues, |v| VenueRow::from(v))?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
