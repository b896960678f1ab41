//! Live status for one venue.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use hallctl_core::{
    AudioStatus, ChannelHealth, DeviceStatus, Session, SessionEvent, StatusStream, VenueStatus,
    format_duration,
};

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::output;

use super::{AppContext, util};

/// What gets printed for each update.
#[derive(Serialize)]
struct StatusView<'a> {
    name: &'a str,
    health: ChannelHealth,
    #[serde(flatten)]
    status: VenueStatus,
}

pub async fn handle(ctx: &AppContext, args: StatusArgs) -> Result<(), CliError> {
    let session = ctx.session()?;
    let mut events = session.events();
    let mut stream = session.subscribe_status();
    let venue = session.select(&args.venue).await?;

    let wait = first_update_timeout(ctx);
    let first = tokio::time::timeout(wait, next_status(&session, &mut stream))
        .await
        .ok()
        .flatten();
    let Some(first) = first else {
        session.deselect().await;
        return Err(CliError::StatusTimeout {
            venue: venue.id.clone(),
            seconds: wait.as_secs(),
        });
    };
    print_status(ctx, &venue.name, session.health(), first)?;

    if args.watch {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                update = next_status(&session, &mut stream) => {
                    let Some(status) = update else { break };
                    print_status(ctx, &venue.name, session.health(), status)?;
                }
                event = events.recv() => match event {
                    Ok(SessionEvent::PushDegraded { reason, .. }) => {
                        tracing::info!(%reason, "push channel lost, continuing on poll");
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    session.deselect().await;
    Ok(())
}

/// One request timeout plus one poll period, rounded up to whole seconds.
fn first_update_timeout(ctx: &AppContext) -> Duration {
    let backend = &ctx.config.backend;
    Duration::from_secs(backend.timeout_secs + backend.poll_interval_ms.div_ceil(1000))
}

async fn next_status(session: &Session, stream: &mut StatusStream) -> Option<VenueStatus> {
    loop {
        stream.changed().await?;
        if let Some(status) = session.venue_status() {
            return Some(status);
        }
    }
}

fn print_status(
    ctx: &AppContext,
    name: &str,
    health: ChannelHealth,
    status: VenueStatus,
) -> Result<(), CliError> {
    let view = StatusView {
        name,
        health,
        status,
    };
    let out = output::render_single(ctx.output, &view, |v| detail(v, ctx.color))?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

fn detail(view: &StatusView<'_>, color: bool) -> String {
    let status = &view.status;
    let mut lines = vec![
        format!(
            "{} ({})  {}",
            view.name,
            status.venue_id,
            output::dim(
                &format!(
                    "{} via {} at {}",
                    view.health,
                    status.source,
                    status.received_at.format("%H:%M:%S")
                ),
                color
            )
        ),
        String::new(),
    ];
    lines.extend(device_lines(&status.device, view.health, color));
    if let Some(ref audio) = status.audio {
        lines.extend(audio_lines(audio));
    }
    lines.join("\n")
}

fn device_lines(device: &DeviceStatus, health: ChannelHealth, color: bool) -> Vec<String> {
    vec![
        field(
            "Channel",
            &output::paint(&health.to_string(), health == ChannelHealth::Healthy, color),
        ),
        field("Playback", &device.playback.to_string()),
        field("Title", &util::or_unknown(device.title.as_deref())),
        field(
            "Position",
            &util::progress(device.position_ms, device.duration_ms),
        ),
        field("Remaining", &format_duration(device.remaining_ms())),
        field("Lamp", &device.lamp.to_string()),
        field("Dowser", &device.dowser.to_string()),
    ]
}

fn audio_lines(audio: &AudioStatus) -> Vec<String> {
    vec![
        field("Audio level", &util::or_unknown(audio.level)),
        field(
            "Muted",
            &util::or_unknown(audio.muted.map(|m| if m { "yes" } else { "no" })),
        ),
        field("Input", &util::or_unknown(audio.input_mode.as_deref())),
    ]
}

fn field(label: &str, value: &str) -> String {
    format!("  {label:<12} {value}")
}
