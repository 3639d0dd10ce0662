use {
    lexopt::{Arg, Parser},
    rand::{rngs::StdRng, SeedableRng},
};

use crate::args::{self, Configurable, Usage};

/// The seed of the random number generator used by a command.
#[derive(Debug, Default)]
pub struct Config {
    seed: Option<u64>,
}

impl Config {
    /// Returns a generator seeded with `--seed`, or with a fresh random seed
    /// when none was given. The seed is logged either way so that any run
    /// can be repeated.
    pub fn rng(&self) -> StdRng {
        let seed = self.seed.unwrap_or_else(rand::random);
        log::info!("seed: {}", seed);
        StdRng::seed_from_u64(seed)
    }
}

impl Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Long("seed") => {
                self.seed = Some(args::parse(p, "--seed")?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &'static [Usage] = &[Usage::new(
            "--seed <number>",
            "Seed the random number generator.",
            r#"
Seed the random number generator with the given 64-bit number. The same seed,
patterns and flags always produce the same output.

When absent, a random seed is chosen. Run with RUST_LOG=info to see it.
"#,
        )];
        USAGES
    }
}
