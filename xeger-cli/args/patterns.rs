use std::path::PathBuf;

use {
    anyhow::Context,
    lexopt::{Arg, Parser, ValueExt},
};

use crate::args::{Configurable, Usage};

/// Patterns read from the command line.
///
/// Every positional argument is taken as a pattern, as are the values of
/// `-p/--pattern` and the lines of `-f/--pattern-file`. All of the commands
/// in this tool accept nothing but patterns as positional arguments.
#[derive(Debug, Default)]
pub struct Config {
    patterns: Vec<String>,
}

impl Config {
    /// Returns every pattern given, in the order given. Fails if there are
    /// none, since no command has anything to do without a pattern.
    pub fn get(&self) -> anyhow::Result<&[String]> {
        anyhow::ensure!(
            !self.patterns.is_empty(),
            "at least one pattern is required",
        );
        Ok(&self.patterns)
    }
}

impl Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Short('p') | Arg::Long("pattern") => {
                let pat = p.value().context("-p/--pattern needs a value")?;
                let pat = pat
                    .string()
                    .context("-p/--pattern must be valid UTF-8")?;
                self.patterns.push(pat);
            }
            Arg::Short('f') | Arg::Long("pattern-file") => {
                let path =
                    PathBuf::from(p.value().context("-f/--pattern-file")?);
                let contents =
                    std::fs::read_to_string(&path).with_context(|| {
                        anyhow::anyhow!("failed to read {}", path.display())
                    })?;
                self.patterns.extend(
                    contents
                        .lines()
                        .filter(|line| !line.is_empty())
                        .map(|line| line.to_string()),
                );
            }
            Arg::Value(ref mut v) => {
                let v = std::mem::take(v);
                self.patterns
                    .push(v.string().context("patterns must be valid UTF-8")?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &'static [Usage] = &[
            Usage::new(
                "-p, --pattern <pattern>",
                "Add a pattern to this command.",
                r#"
This adds a new pattern to the command. It is equivalent to giving the pattern
as a positional argument, but works for patterns that start with a '-'.

All patterns given must be valid UTF-8.
"#,
            ),
            Usage::new(
                "-f, --pattern-file",
                "Read patterns from the file given.",
                r#"
Reads patterns, one per line, from the file given. Empty lines are skipped.

All patterns given must be valid UTF-8.
"#,
            ),
        ];
        USAGES
    }
}
