use std::io::{stdout, Write};

use {
    rand::Rng,
    xeger::{ErrorKind, Xeger},
};

use crate::args;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &'static str = "\
Prints strings generated from each of the patterns given.

Strings are printed one per line, grouped by pattern in the order the patterns
were given. Without --checked, strings are printed as generated. Patterns with
anchors or word boundaries in the middle may then produce strings that do not
match.

USAGE:
    xeger-cli generate [-n <count>] [--seed <number>] <pattern> ...

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
        for s in strings(xeger, &emit, &mut rng)? {
            writeln!(out, "{}", s)?;
        }
    }
    Ok(())
}

/// Generate the strings asked for by the given configuration. For a
/// confounded `Xeger`, checked strings are those that do not match.
pub fn strings<R: Rng + ?Sized>(
    xeger: &Xeger,
    config: &args::emit::Config,
    rng: &mut R,
) -> anyhow::Result<Vec<String>> {
    let (count, attempts) = (config.count, config.attempts);
    let strings = if config.distinct {
        xeger
            .emit_set(count, rng, attempts)?
            .map(|set| set.into_iter().collect())
    } else if config.checked {
        xeger.emit_list(count, rng, attempts)?
    } else {
        unchecked(xeger, count, rng, attempts)?
    };
    match strings {
        Some(strings) => Ok(strings),
        None => anyhow::bail!(
            "could not generate {} {}strings for /{}/ in {} attempts",
            count,
            if config.distinct { "distinct " } else { "" },
            xeger.pattern(),
            attempts,
        ),
    }
}

/// Like `Xeger::emit_list`, but without consulting the matcher. Only
/// attempts that leave a backreference unbound are retried.
fn unchecked<R: Rng + ?Sized>(
    xeger: &Xeger,
    count: usize,
    rng: &mut R,
    attempts: usize,
) -> Result<Option<Vec<String>>, xeger::Error> {
    let mut list = Vec::with_capacity(count);
    for _ in 0..attempts.max(count) {
        if list.len() == count {
            break;
        }
        match xeger.emit(rng) {
            Ok(s) => list.push(s),
            Err(err) if is_unbound(&err) => {
                log::debug!("retrying /{}/: {}", xeger.pattern(), err);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(if list.len() == count { Some(list) } else { None })
}

fn is_unbound(err: &xeger::Error) -> bool {
    matches!(err.kind(), ErrorKind::UnboundBackreference(_))
}
