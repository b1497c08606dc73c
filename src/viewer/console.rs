//! Line-oriented stand-in for the UI layer.
//!
//! ```text
//! :add <marker> [none|limited|tracking] [x y z]
//! :update <marker> [quality] [x y z]
//! :remove <marker>
//! :next | :back | :help | :restart | :status
//! :tracking on|off
//! :voice on|off
//! :lang <language>
//! :quit
//! ```
//!
//! Anything not starting with `:` is treated as a spoken phrase.

use anyhow::{anyhow, bail, Context, Result};

use crate::models::{MarkerObservation, ObservationBatch, Pose, TrackingQuality};

use super::runtime::ViewerCommand;

#[derive(Debug)]
pub enum ConsoleAction {
    Viewer(ViewerCommand),
    /// Persisted in settings before the viewer is told.
    SetLanguage(String),
    SetVoiceCommandsEnabled(bool),
    Status,
    Quit,
    Nothing,
}

pub fn parse_line(line: &str) -> Result<ConsoleAction> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleAction::Nothing);
    }

    let Some(rest) = line.strip_prefix(':') else {
        return Ok(ConsoleAction::Viewer(ViewerCommand::Voice(line.to_string())));
    };

    let mut words = rest.split_whitespace();
    let command = words.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let action = match command.as_str() {
        "add" => ConsoleAction::Viewer(ViewerCommand::MarkersChanged(ObservationBatch::added(
            observation(&args)?,
        ))),
        "update" => ConsoleAction::Viewer(ViewerCommand::MarkersChanged(
            ObservationBatch::updated(observation(&args)?),
        )),
        "remove" => {
            let marker = args.first().context("usage: :remove <marker>")?;
            ConsoleAction::Viewer(ViewerCommand::MarkersChanged(ObservationBatch::removed(
                MarkerObservation::new(*marker, Pose::IDENTITY, TrackingQuality::None),
            )))
        }
        "next" => ConsoleAction::Viewer(ViewerCommand::NextStep),
        "back" | "previous" => ConsoleAction::Viewer(ViewerCommand::PreviousStep),
        "help" => ConsoleAction::Viewer(ViewerCommand::Help),
        "restart" => ConsoleAction::Viewer(ViewerCommand::RestartSession),
        "tracking" => ConsoleAction::Viewer(ViewerCommand::ToggleTracking(switch(&args)?)),
        "voice" => ConsoleAction::SetVoiceCommandsEnabled(switch(&args)?),
        "lang" | "language" => {
            if args.is_empty() {
                bail!("usage: :lang <language>");
            }
            ConsoleAction::SetLanguage(args.join(" "))
        }
        "status" => ConsoleAction::Status,
        "quit" | "exit" => ConsoleAction::Quit,
        other => bail!("unknown command ':{other}'"),
    };
    Ok(action)
}

fn observation(args: &[&str]) -> Result<MarkerObservation> {
    let (marker, rest) = args
        .split_first()
        .context("usage: :add <marker> [quality] [x y z]")?;

    let (quality, coords) = match rest.first() {
        Some(word) if word.parse::<f32>().is_err() => (
            TrackingQuality::parse(word)
                .ok_or_else(|| anyhow!("unknown tracking quality '{word}'"))?,
            &rest[1..],
        ),
        _ => (TrackingQuality::Tracking, rest),
    };

    let pose = match coords {
        [] => Pose::IDENTITY,
        [x, y, z] => Pose::at(coord(x)?, coord(y)?, coord(z)?),
        _ => bail!("expected three coordinates, got {}", coords.len()),
    };

    Ok(MarkerObservation::new(*marker, pose, quality))
}

fn coord(value: &str) -> Result<f32> {
    value
        .parse()
        .with_context(|| format!("invalid coordinate '{value}'"))
}

fn switch(args: &[&str]) -> Result<bool> {
    match args.first().map(|a| a.to_ascii_lowercase()).as_deref() {
        Some("on") | Some("true") => Ok(true),
        Some("off") | Some("false") => Ok(false),
        _ => bail!("expected 'on' or 'off'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(action: ConsoleAction) -> ObservationBatch {
        match action {
            ConsoleAction::Viewer(ViewerCommand::MarkersChanged(batch)) => batch,
            other => panic!("expected a marker batch, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_is_a_voice_phrase() {
        match parse_line("  next please ").unwrap() {
            ConsoleAction::Viewer(ViewerCommand::Voice(text)) => assert_eq!(text, "next please"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_line("   ").unwrap(), ConsoleAction::Nothing));
    }

    #[test]
    fn add_defaults_to_full_tracking_at_origin() {
        let batch = batch(parse_line(":add img_drill01").unwrap());
        assert_eq!(batch.added.len(), 1);
        assert_eq!(batch.added[0].marker_id, "img_drill01");
        assert_eq!(batch.added[0].tracking_quality, TrackingQuality::Tracking);
        assert_eq!(batch.added[0].pose, Pose::IDENTITY);
    }

    #[test]
    fn update_accepts_quality_and_position() {
        let batch = batch(parse_line(":update img_drill01 limited 0.1 0 -0.5").unwrap());
        let observation = &batch.updated[0];
        assert_eq!(observation.tracking_quality, TrackingQuality::Limited);
        assert_eq!(observation.pose.position, [0.1, 0.0, -0.5]);

        let batch = batch_from(":update img_drill01 1 2 3");
        assert_eq!(batch.updated[0].tracking_quality, TrackingQuality::Tracking);
        assert_eq!(batch.updated[0].pose.position, [1.0, 2.0, 3.0]);
    }

    fn batch_from(line: &str) -> ObservationBatch {
        batch(parse_line(line).unwrap())
    }

    #[test]
    fn remove_needs_a_marker() {
        assert_eq!(batch_from(":remove img_drill01").removed[0].marker_id, "img_drill01");
        assert!(parse_line(":remove").is_err());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_line(":add").is_err());
        assert!(parse_line(":add img blurry").is_err());
        assert!(parse_line(":add img 1 2").is_err());
        assert!(parse_line(":tracking maybe").is_err());
        assert!(parse_line(":lang").is_err());
        assert!(parse_line(":dance").is_err());
    }

    #[test]
    fn settings_commands() {
        assert!(matches!(
            parse_line(":tracking off").unwrap(),
            ConsoleAction::Viewer(ViewerCommand::ToggleTracking(false))
        ));
        assert!(matches!(
            parse_line(":voice ON").unwrap(),
            ConsoleAction::SetVoiceCommandsEnabled(true)
        ));
        match parse_line(":lang Spanish").unwrap() {
            ConsoleAction::SetLanguage(language) => assert_eq!(language, "Spanish"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_line(":quit").unwrap(), ConsoleAction::Quit));
    }
}
