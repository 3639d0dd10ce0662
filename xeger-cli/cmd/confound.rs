use std::io::{stdout, Write};

use crate::{args, cmd::generate};

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &'static str = "\
Prints confounded strings for each of the patterns given.

A confounded string has the shape of a string the pattern matches, but every
literal and class in the pattern is replaced by something disjoint from it.
Such strings are near misses, useful as negative test data. Use --checked to
print only strings that really fail to match.

A pattern with nothing to confound, such as '(?s).*', is an error.

USAGE:
    xeger-cli confound [-n <count>] [--seed <number>] <pattern> ...

TIP:
    use -h for short docs and --help for long docs

OPTIONS:
%options%
";

    let mut patterns = args::patterns::Config::default();
    let mut syntax = args::syntax::Config::default();
    let mut emit = args::emit::Config::default();
    let mut seed = args::seed::Config::default();
    args::configure(
        p,
        USAGE,
        &mut [&mut patterns, &mut syntax, &mut emit, &mut seed],
    )?;

    let xegers = syntax.xegers(patterns.get()?)?;
    let mut rng = seed.rng();
    let mut out = stdout().lock();
    for xeger in xegers.iter() {
        let confounded = xeger.confound().ok_or_else(|| {
            anyhow::anyhow!("/{}/ has nothing to confound", xeger.pattern())
        })?;
        for s in generate::strings(&confounded, &emit, &mut rng)? {
            writeln!(out, "{}", s)?;
        }
    }
    Ok(())
}
