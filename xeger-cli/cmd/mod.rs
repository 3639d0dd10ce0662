mod check;
mod confound;
mod debug;
mod generate;

const USAGE: &'static str = "\
A tool for generating test strings from regular expressions.

USAGE:
    xeger-cli <command> ...

COMMANDS:
    check     Check whether patterns are good sources of test strings.
    confound  Print strings that are unlikely to match patterns.
    debug     Print how patterns were parsed.
    generate  Print strings that match patterns.
";

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let cmd = crate::args::next_as_command(USAGE, p)?;
    match &*cmd {
        "check" => check::run(p),
        "confound" => confound::run(p),
        "debug" => debug::run(p),
        "generate" => generate::run(p),
        unk => anyhow::bail!("unrecognized command '{unk}'"),
    }
}
