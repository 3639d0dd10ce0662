use {
    lexopt::{Arg, Parser},
    xeger::SamplingPolicy,
};

use crate::args::{self, Configurable, Usage};

/// The thresholds of `xeger::SamplingPolicy` as flags.
#[derive(Debug, Default)]
pub struct Config {
    pub policy: SamplingPolicy,
}

impl Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Short('n') | Arg::Long("sample-size") => {
                self.policy.sample_size = args::parse(p, "-n/--sample-size")?;
            }
            Arg::Long("min-match") => {
                self.policy.min_match_ratio = ratio(p, "--min-match")?;
            }
            Arg::Long("max-confounded") => {
                self.policy.max_confounded_match_ratio =
                    ratio(p, "--max-confounded")?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &'static [Usage] = &[
            Usage::new(
                "-n, --sample-size <number>",
                "The number of strings sampled per pattern.",
                r#"
The number of strings generated from each pattern, and again from its
confounded counterpart, when checking it.

The default is 100.
"#,
            ),
            Usage::new(
                "--min-match <ratio>",
                "Require more than this fraction to match.",
                r#"
A pattern is rejected unless more than this fraction of the strings generated
from it match it. The ratio must be between 0 and 1.

The default is 0.33.
"#,
            ),
            Usage::new(
                "--max-confounded <ratio>",
                "Require fewer confounded strings to match.",
                r#"
A pattern that can be confounded is rejected unless fewer than this fraction
of its confounded strings match it. Patterns that cannot be confounded at all
are judged on their plain sample alone. The ratio must be between 0 and 1.

The default is 0.70.
"#,
            ),
        ];
        USAGES
    }
}

fn ratio(p: &mut Parser, flag_name: &'static str) -> anyhow::Result<f64> {
    let ratio: f64 = args::parse(p, flag_name)?;
    anyhow::ensure!(
        (0.0..=1.0).contains(&ratio),
        "{} must be between 0 and 1, but got {}",
        flag_name,
        ratio,
    );
    Ok(ratio)
}
