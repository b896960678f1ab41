//! Direct device commands.

use serde::Serialize;

use hallctl_core::{Command as CoreCommand, CommandReply};

use crate::cli::{Action, CommandArgs, Shutter, Switch};
use crate::error::CliError;
use crate::output;

use super::AppContext;

#[derive(Serialize)]
struct ReplyView<'a> {
    venue_id: &'a str,
    command: &'a CoreCommand,
    success: bool,
    #[serde(flatten)]
    reply: &'a CommandReply,
}

impl From<Action> for CoreCommand {
    fn from(action: Action) -> Self {
        match action {
            Action::Play => Self::Play,
            Action::Stop => Self::Stop,
            Action::Lamp { state } => Self::Lamp {
                on: state == Switch::On,
            },
            Action::Dowser { state } => Self::Dowser {
                closed: state == Shutter::Closed,
            },
            Action::Light { state } => Self::Light {
                on: state == Switch::On,
            },
            Action::Level { value, force } => Self::AudioLevel { value, force },
            Action::Mute { state } => Self::AudioMute {
                mute: state == Switch::On,
            },
            Action::Input { mode } => Self::AudioInputMode { mode },
        }
    }
}

pub async fn handle(ctx: &AppContext, args: CommandArgs) -> Result<(), CliError> {
    let session = ctx.session()?;
    let command = CoreCommand::from(args.action);
    let reply = session.execute_on(&args.venue, command.clone()).await?;

    let view = ReplyView {
        venue_id: &args.venue,
        command: &command,
        success: reply.is_success(),
        reply: &reply,
    };
    let out = output::render_single(ctx.output, &view, |v| {
        let verdict = if v.success { "ok" } else { "failed" };
        let mut line = format!(
            "{} on {}: {}",
            v.command,
            v.venue_id,
            output::paint(verdict, v.success, ctx.color)
        );
        if let Some(ref message) = v.reply.message {
            line.push_str(&format!(" ({message})"));
        }
        line
    })?;
    output::print_output(&out, ctx.quiet);

    if reply.is_success() {
        Ok(())
    } else {
        Err(CliError::CommandFailed {
            venue: args.venue,
            command: command.to_string(),
            message: reply
                .message
                .unwrap_or_else(|| "no acknowledgement".to_owned()),
        })
    }
}
