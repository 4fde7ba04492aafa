use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;

use crate::logging::levels::{parse_level, LevelSpec, DEFAULT_APP_LEVEL, DEFAULT_OTHERS_LEVEL};

pub const ARG_LOG_LEVEL: &str = "log-level";
pub const ARG_LOG_OTHERS: &str = "log-others";

/// Add the logging flags every application shares to `command`.
///
/// `--log-level` / `-l` takes `LEVEL` for the application's own loggers or
/// `TARGET=LEVEL` for a logger hierarchy and may be repeated; `--log-others`
/// sets the level of all remaining loggers.
pub fn add_default_arguments(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LOG_LEVEL)
                .long(ARG_LOG_LEVEL)
                .short('l')
                .value_name("LEVEL|TARGET=LEVEL")
                .help("Minimum log level shown, optionally for one logger only")
                .action(ArgAction::Append)
                .value_parser(|value: &str| value.parse::<LevelSpec>()),
        )
        .arg(
            Arg::new(ARG_LOG_OTHERS)
                .long(ARG_LOG_OTHERS)
                .value_name("LEVEL")
                .help("Minimum log level of third-party loggers")
                .value_parser(parse_level),
        )
}

/// Level selection from arguments parsed with [`add_default_arguments`],
/// ready for `set_log_levels`. Missing flags, or a parser without them,
/// yield the defaults.
pub fn log_levels_from_matches(matches: &ArgMatches) -> (Vec<LevelSpec>, LevelFilter) {
    let mut levels: Vec<LevelSpec> = matches
        .try_get_many::<LevelSpec>(ARG_LOG_LEVEL)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let others = matches
        .try_get_one::<LevelFilter>(ARG_LOG_OTHERS)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(DEFAULT_OTHERS_LEVEL);
    if levels.is_empty() {
        levels.push(LevelSpec::App(DEFAULT_APP_LEVEL));
    }
    (levels, others)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        add_default_arguments(Command::new("host").arg(Arg::new("input").long("input")))
    }

    #[test]
    fn test_parse_levels() -> anyhow::Result<()> {
        let matches = command().try_get_matches_from([
            "host",
            "-l",
            "debug",
            "--log-level",
            "hyper=info",
            "--log-others",
            "error",
            "--input",
            "x",
        ])?;

        let (levels, others) = log_levels_from_matches(&matches);
        assert_eq!(
            levels,
            vec![
                LevelSpec::App(LevelFilter::Debug),
                LevelSpec::Target("hyper".to_string(), LevelFilter::Info),
            ]
        );
        assert_eq!(others, LevelFilter::Error);
        assert_eq!(matches.get_one::<String>("input").map(String::as_str), Some("x"));
        Ok(())
    }

    #[test]
    fn test_defaults_without_flags() -> anyhow::Result<()> {
        let matches = command().try_get_matches_from(["host"])?;
        let defaults = (vec![LevelSpec::App(DEFAULT_APP_LEVEL)], DEFAULT_OTHERS_LEVEL);
        assert_eq!(log_levels_from_matches(&matches), defaults);

        let bare = Command::new("bare").try_get_matches_from(["bare"])?;
        assert_eq!(log_levels_from_matches(&bare), defaults);
        Ok(())
    }

    #[test]
    fn test_log_others_alone() -> anyhow::Result<()> {
        let matches = command().try_get_matches_from(["host", "--log-others", "error"])?;
        let (levels, others) = log_levels_from_matches(&matches);
        assert_eq!(levels, vec![LevelSpec::App(DEFAULT_APP_LEVEL)]);
        assert_eq!(others, LevelFilter::Error);

        let mut table = crate::logging::LevelTable::new(["host"]);
        table.apply(&levels, others);
        assert!(!table.enabled(log::Level::Warn, "thirdparty::io"));
        assert!(table.enabled(log::Level::Info, "host::worker"));
        Ok(())
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        assert!(command()
            .try_get_matches_from(["host", "-l", "chatty"])
            .is_err());
    }
}
