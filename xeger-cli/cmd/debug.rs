use std::io::{stdout, Write};

use xeger::Matcher;

use crate::args;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &'static str = "\
Prints how each pattern was parsed.

This shows the parsed pattern printed back as a regex, its capture groups,
the engine used to match it, its confounded counterpart and an outline of
its syntax tree.

USAGE:
    xeger-cli debug <pattern> ...

TIP:
    use -h for short docs and --help for long docs

OPTIONS:
%options%
";

    let mut patterns = args::patterns::Config::default();
    let mut syntax = args::syntax::Config::default();
    args::configure(p, USAGE, &mut [&mut patterns, &mut syntax])?;

    let xegers = syntax.xegers(patterns.get()?)?;
    let mut out = stdout().lock();
    for (i, xeger) in xegers.iter().enumerate() {
        if i > 0 {
            writeln!(out, "")?;
        }
        let groups: Vec<String> = xeger
            .capture_groups()
            .iter()
            .map(|g| match g.name {
                None => g.index.to_string(),
                Some(ref name) => format!("{} <{}>", g.index, name),
            })
            .collect();
        let engine = if Matcher::new(xeger.pattern())?.is_backtracking() {
            "fancy-regex"
        } else {
            "regex"
        };
        writeln!(out, "pattern:    {}", xeger.pattern())?;
        writeln!(out, "parsed:     {}", xeger.ast())?;
        if groups.is_empty() {
            writeln!(out, "groups:     none")?;
        } else {
            writeln!(out, "groups:     {}", groups.join(", "))?;
        }
        writeln!(out, "engine:     {}", engine)?;
        match xeger.confound() {
            None => writeln!(out, "confounded: none")?,
            Some(c) => writeln!(out, "confounded: {}", c.ast())?,
        }
        writeln!(out, "outline:")?;
        for line in xeger.ast().outline().lines() {
            writeln!(out, "    {}", line)?;
        }
    }
    Ok(())
}
