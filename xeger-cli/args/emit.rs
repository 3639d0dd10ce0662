use lexopt::{Arg, Parser};

use crate::args::{self, Configurable, Usage};

/// Flags that control how many strings are generated per pattern and
/// whether they are checked against the pattern.
#[derive(Debug)]
pub struct Config {
    pub count: usize,
    pub attempts: usize,
    pub checked: bool,
    pub distinct: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config { count: 10, attempts: 1000, checked: false, distinct: false }
    }
}

impl Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Short('n') | Arg::Long("count") => {
                self.count = args::parse(p, "-n/--count")?;
            }
            Arg::Long("attempts") => {
                self.attempts = args::parse(p, "--attempts")?;
            }
            Arg::Long("checked") => {
                self.checked = true;
            }
            Arg::Long("distinct") => {
                self.distinct = true;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &'static [Usage] = &[
            Usage::new(
                "-n, --count <number>",
                "The number of strings to print per pattern.",
                r#"
The number of strings to generate and print for each pattern.

The default is 10.
"#,
            ),
            Usage::new(
                "--attempts <number>",
                "Give up after this many tries.",
                r#"
The total number of strings that may be generated for each pattern while
trying to produce the requested count. This bounds the work done for patterns
whose strings are rarely accepted, e.g., because of anchors or word
boundaries. Patterns whose backreferences can be left unbound also consume
attempts.

The default is 1000.
"#,
            ),
            Usage::new(
                "--checked",
                "Only print strings that pass the matcher.",
                r#"
When enabled, each generated string is checked against the pattern before it
is printed. For 'generate', only strings that match are printed. For
'confound', only strings that do not match are printed.

If the requested count cannot be reached within the number of attempts, the
command fails.
"#,
            ),
            Usage::new(
                "--distinct",
                "Print distinct checked strings in sorted order.",
                r#"
When enabled, the strings printed for a pattern are distinct and sorted. This
implies --checked. If the pattern's language has fewer strings than the count
requested, the command fails.
"#,
            ),
        ];
        USAGES
    }
}
