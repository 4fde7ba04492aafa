use anyhow::{anyhow, Result};
use std::{fmt, str::FromStr};

use log::{Level, LevelFilter};

/// Threshold applied to loggers that neither belong to the application nor
/// carry an explicit override.
pub const DEFAULT_OTHERS_LEVEL: LevelFilter = LevelFilter::Warn;

/// Threshold applied to the application's own loggers when nothing else is set.
pub const DEFAULT_APP_LEVEL: LevelFilter = LevelFilter::Info;

/// One entry of a log level selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSpec {
    /// Minimum level for the application's own loggers.
    App(LevelFilter),
    /// Minimum level for a logger and everything below it, e.g. `hyper::client`.
    Target(String, LevelFilter),
}

impl LevelSpec {
    pub fn level(&self) -> LevelFilter {
        match self {
            LevelSpec::App(level) | LevelSpec::Target(_, level) => *level,
        }
    }
}

impl FromStr for LevelSpec {
    type Err = anyhow::Error;

    /// Accepts `LEVEL` or `TARGET=LEVEL`.
    fn from_str(value: &str) -> Result<Self> {
        match value.split_once('=') {
            Some((target, level)) => {
                let target = normalize_target(target.trim());
                if target.is_empty() {
                    return Err(anyhow!("missing logger name in level spec '{value}'"));
                }
                Ok(LevelSpec::Target(target, parse_level(level)?))
            }
            None => Ok(LevelSpec::App(parse_level(value)?)),
        }
    }
}

impl fmt::Display for LevelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSpec::App(level) => write!(f, "{level}"),
            LevelSpec::Target(target, level) => write!(f, "{target}={level}"),
        }
    }
}

/// Parse a level name. Besides the `log` names this accepts `warning`,
/// `critical` and `fatal` as well as the numeric values 0 (off) to 5 (trace).
pub fn parse_level(value: &str) -> Result<LevelFilter> {
    let value = value.trim();
    if let Ok(level) = LevelFilter::from_str(value) {
        return Ok(level);
    }
    match value.to_ascii_lowercase().as_str() {
        "warning" => Ok(LevelFilter::Warn),
        "critical" | "fatal" => Ok(LevelFilter::Error),
        other => other
            .parse::<usize>()
            .ok()
            .and_then(|index| LevelFilter::iter().nth(index))
            .ok_or_else(|| anyhow!("unknown log level '{value}'")),
    }
}

/// Per-logger severity thresholds.
///
/// A logger's threshold is taken from the longest explicit override matching
/// its name, else from the application level when the logger lives below one
/// of the application roots, else from the `others` level.
#[derive(Debug, Clone)]
pub struct LevelTable {
    app: LevelFilter,
    overrides: Vec<(String, LevelFilter)>,
    roots: Vec<String>,
    others: LevelFilter,
}

impl LevelTable {
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self {
            app: DEFAULT_APP_LEVEL,
            overrides: Vec::new(),
            roots: Vec::new(),
            others: DEFAULT_OTHERS_LEVEL,
        };
        for root in roots {
            table.add_root(root.as_ref());
        }
        table
    }

    /// Register another logger hierarchy as belonging to the application.
    pub fn add_root(&mut self, root: &str) {
        let root = normalize_target(root);
        if !root.is_empty() && !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    /// Replace all thresholds. The last bare level wins; without one the
    /// application level falls back to [`DEFAULT_APP_LEVEL`]. Later overrides
    /// for the same target replace earlier ones.
    pub fn apply(&mut self, levels: &[LevelSpec], others: LevelFilter) {
        self.app = DEFAULT_APP_LEVEL;
        self.overrides.clear();
        self.others = others;

        for spec in levels {
            match spec {
                LevelSpec::App(level) => self.app = *level,
                LevelSpec::Target(target, level) => {
                    let target = normalize_target(target);
                    match self.overrides.iter_mut().find(|(name, _)| *name == target) {
                        Some(entry) => entry.1 = *level,
                        None => self.overrides.push((target, *level)),
                    }
                }
            }
        }
    }

    pub fn app_level(&self) -> LevelFilter {
        self.app
    }

    pub fn others_level(&self) -> LevelFilter {
        self.others
    }

    pub fn threshold(&self, target: &str) -> LevelFilter {
        let target = normalize_target(target);

        let most_specific = self
            .overrides
            .iter()
            .filter(|(name, _)| in_hierarchy(&target, name))
            .max_by_key(|(name, _)| name.len());
        if let Some((_, level)) = most_specific {
            return *level;
        }

        if self.roots.iter().any(|root| in_hierarchy(&target, root)) {
            self.app
        } else {
            self.others
        }
    }

    pub fn enabled(&self, level: Level, target: &str) -> bool {
        level <= self.threshold(target)
    }

    /// Most verbose threshold in the table, suitable for `log::set_max_level`.
    pub fn max_level(&self) -> LevelFilter {
        self.overrides
            .iter()
            .map(|(_, level)| *level)
            .chain([self.app, self.others])
            .max()
            .unwrap_or(LevelFilter::Off)
    }
}

/// Logger names are compared with `.` as separator, so `a::b` and `a.b` are
/// the same logger.
pub(crate) fn normalize_target(target: &str) -> String {
    target.trim().replace("::", ".")
}

fn in_hierarchy(target: &str, name: &str) -> bool {
    target == name
        || (target.len() > name.len()
            && target.starts_with(name)
            && target.as_bytes()[name.len()] == b'.')
}
