use std::io::{stdout, Write};

use crate::args;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &'static str = "\
Checks whether each pattern is a good source of test strings.

For each pattern, a sample of generated strings and a sample of confounded
strings are matched against it. The pattern passes when enough of the former
match and few enough of the latter do. One line is printed per pattern, and
the command fails if any pattern is rejected.

USAGE:
    xeger-cli check [-n <sample-size>] [--seed <number>] <pattern> ...

TIP:
    use -h for short docs and --help for long docs

OPTIONS:
%options%
";

    let mut patterns = args::patterns::Config::default();
    let mut syntax = args::syntax::Config::default();
    let mut policy = args::policy::Config::default();
    let mut seed = args::seed::Config::default();
    args::configure(
        p,
        USAGE,
        &mut [&mut patterns, &mut syntax, &mut policy, &mut seed],
    )?;

    let xegers = syntax.xegers(patterns.get()?)?;
    let mut rng = seed.rng();
    let mut out = stdout().lock();
    let mut rejected = 0;
    for xeger in xegers.iter() {
        let report = policy.policy.check(xeger, &mut rng)?;
        if !report.is_valid() {
            rejected += 1;
        }
        writeln!(out, "{}: {}", xeger.pattern(), report)?;
    }
    anyhow::ensure!(
        rejected == 0,
        "{} of {} patterns rejected",
        rejected,
        xegers.len(),
    );
    Ok(())
}
