// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line parsing.

use clap::Parser;
use std::path::PathBuf;

/// Play a timeline document against a logging renderer.
///
/// Logging is controlled with `RUST_LOG` (default: `scenecue=debug`).
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "scenecue_preview", version)]
pub struct PreviewArgs {
    /// Timeline JSON to play.
    pub timeline: PathBuf,

    /// Stop after this many seconds of wall-clock time.
    #[arg(long, value_parser = parse_seconds)]
    pub seconds: Option<f64>,

    /// Restart from zero at the end of the timeline.
    #[arg(long = "loop")]
    pub looping: bool,
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        _ => Err(format!("expected a positive number of seconds, got {value:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<PreviewArgs, clap::Error> {
        PreviewArgs::try_parse_from(std::iter::once("scenecue_preview").chain(args.iter().copied()))
    }

    #[test]
    fn test_path_only() {
        let args = parse(&["show.json"]).unwrap();
        assert_eq!(
            args,
            PreviewArgs {
                timeline: PathBuf::from("show.json"),
                seconds: None,
                looping: false,
            }
        );
    }

    #[test]
    fn test_all_options() {
        let args = parse(&["--loop", "show.json", "--seconds", "2.5"]).unwrap();
        assert!(args.looping);
        assert_eq!(args.seconds, Some(2.5));
    }

    #[test]
    fn test_help() {
        let err = parse(&["show.json", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a.json", "b.json"]).is_err());
        assert!(parse(&["a.json", "--seconds"]).is_err());
        assert!(parse(&["a.json", "--fast"]).is_err());
        for bad in ["-1", "0", "NaN", "soon"] {
            let flag = format!("--seconds={bad}");
            let err = parse(&["a.json", &flag]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueValidation, "{bad}");
        }
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        PreviewArgs::command().debug_assert();
    }
}
