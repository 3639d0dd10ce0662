use {
    anyhow::Context,
    lexopt::{Arg, Parser},
    xeger::{Universe, Xeger, XegerBuilder, DEFAULT_REPETITION_CAP},
};

use crate::args::{self, Configurable, Usage};

/// Flags that configure how a pattern is parsed and how strings are
/// generated from it. This exposes every knob on `xeger::XegerBuilder`.
#[derive(Debug)]
pub struct Config {
    universe: Universe,
    cap: u32,
    nest_limit: Option<u32>,
    case_insensitive: bool,
    dot_matches_new_line: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            universe: Universe::ASCII,
            cap: DEFAULT_REPETITION_CAP,
            nest_limit: None,
            case_insensitive: false,
            dot_matches_new_line: false,
        }
    }
}

impl Config {
    /// Returns a builder for the given pattern with this configuration
    /// applied.
    pub fn builder(&self, pattern: &str) -> XegerBuilder {
        let mut builder = XegerBuilder::new(pattern);
        builder
            .universe(self.universe)
            .repetition_cap(self.cap)
            .case_insensitive(self.case_insensitive)
            .dot_matches_new_line(self.dot_matches_new_line);
        if let Some(limit) = self.nest_limit {
            builder.nest_limit(limit);
        }
        builder
    }

    /// Build a `Xeger` for every one of the given patterns.
    pub fn xegers(&self, patterns: &[String]) -> anyhow::Result<Vec<Xeger>> {
        patterns
            .iter()
            .map(|pat| {
                self.builder(pat)
                    .build()
                    .with_context(|| format!("failed to build /{}/", pat))
            })
            .collect()
    }
}

impl Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Long("universe") => {
                let name: String = args::parse(p, "--universe")?;
                self.universe = match &*name {
                    "ascii" => Universe::ASCII,
                    "latin1" => Universe::LATIN1,
                    "bmp" => Universe::BMP,
                    unk => anyhow::bail!("unrecognized universe '{}'", unk),
                };
            }
            Arg::Long("cap") => {
                self.cap = args::parse(p, "--cap")?;
            }
            Arg::Long("nest-limit") => {
                self.nest_limit = Some(args::parse(p, "--nest-limit")?);
            }
            Arg::Short('i') | Arg::Long("case-insensitive") => {
                self.case_insensitive = true;
            }
            Arg::Short('s') | Arg::Long("dot-matches-new-line") => {
                self.dot_matches_new_line = true;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &'static [Usage] = &[
            Usage::new(
                "--universe <name>",
                "One of: ascii, latin1, bmp.",
                r#"
Set the universe of characters that classes are resolved in. Negated classes
and confounded classes are complements within this universe, so a wider
universe yields stranger strings.

The default is 'ascii'. 'latin1' covers U+0000 through U+00FF and 'bmp' covers
the basic multilingual plane up to U+D7FF.
"#,
            ),
            Usage::new(
                "--cap <number>",
                "Bound unbounded repetitions.",
                r#"
Set the upper bound on how many times '*', '+' and counted repetitions with a
large or missing maximum are repeated. A repetition's minimum is always
honored, even when it exceeds the cap.

The default is 10.
"#,
            ),
            Usage::new(
                "--nest-limit <number>",
                "Set the nesting limit of the parser.",
                r#"
Patterns that nest groups, classes and repetitions deeper than this limit are
rejected.

The default is 50.
"#,
            ),
            Usage::new(
                "-i, --case-insensitive",
                "Parse every pattern as if it started with (?i).",
                r#"
When enabled, letters in every pattern match either case, and generated
strings mix cases.
"#,
            ),
            Usage::new(
                "-s, --dot-matches-new-line",
                "Parse every pattern as if it started with (?s).",
                r#"
When enabled, '.' matches any character of the universe, including a line
feed.
"#,
            ),
        ];
        USAGES
    }
}
