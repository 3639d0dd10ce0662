/*!
Random generation of strings from a parsed pattern.

The generator walks the tree once, left to right, making every random choice
as it goes. It never backtracks: a string is produced in a single pass and
whether it actually matches is for the caller to check. In practice the only
constructs that lead to non-matching output are anchors and word boundaries
in the middle of a pattern, since those contribute no text.
*/

use std::collections::HashMap;

use rand::Rng;

use crate::{
    ast::{CaptureGroup, Quantifier, RegexElement},
    error::Error,
};

/// The default upper bound on the number of repetitions of `*`, `+` and any
/// counted repetition whose maximum is larger.
pub const DEFAULT_REPETITION_CAP: u32 = 10;

/// Generate a string from the given tree with the default repetition cap.
pub fn emit<R: Rng + ?Sized>(
    ast: &RegexElement,
    rng: &mut R,
) -> Result<String, Error> {
    Emitter::default().emit(ast, rng)
}

/// A generator of random strings.
///
/// An emitter holds no state between calls. Each call to [`Emitter::emit`]
/// allocates a fresh context for capture group bindings, so one emitter may
/// be shared freely.
#[derive(Clone, Debug)]
pub struct Emitter {
    cap: u32,
}

impl Default for Emitter {
    fn default() -> Emitter {
        Emitter::new(DEFAULT_REPETITION_CAP)
    }
}

/// The mutable state of a single run of the generator.
#[derive(Debug, Default)]
struct Context {
    out: String,
    /// The text most recently produced by each capture group. A group inside
    /// a repetition is rebound on every iteration.
    groups: HashMap<u32, String>,
}

impl Emitter {
    /// Create an emitter whose unbounded (or very large) repetitions produce
    /// at most `cap` copies of their sub-expression. A repetition whose
    /// minimum exceeds the cap still produces exactly its minimum.
    pub fn new(cap: u32) -> Emitter {
        Emitter { cap }
    }

    /// The repetition cap of this emitter.
    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Generate one string from the given tree.
    ///
    /// For a fixed tree and a fixed stream of random numbers, the output is
    /// always the same.
    ///
    /// # Errors
    ///
    /// This returns an error when a backreference is reached before its
    /// group produced any text in this run, e.g., `(?:(a)|b)\1` when the
    /// second branch was chosen.
    pub fn emit<R: Rng + ?Sized>(
        &self,
        ast: &RegexElement,
        rng: &mut R,
    ) -> Result<String, Error> {
        let mut ctx = Context::default();
        self.emit_into(ast, rng, &mut ctx)?;
        Ok(ctx.out)
    }

    fn emit_into<R: Rng + ?Sized>(
        &self,
        el: &RegexElement,
        rng: &mut R,
        ctx: &mut Context,
    ) -> Result<(), Error> {
        match *el {
            RegexElement::Literal(ref lit) => ctx.out.push_str(lit),
            RegexElement::Class(ref class) => {
                let set = class.effective();
                if set.is_empty() {
                    return Err(Error::illegal_state(
                        "cannot draw from an empty character class",
                    ));
                }
                let ch = set.nth(rng.gen_range(0..set.len())).ok_or_else(
                    || Error::illegal_state("class member out of range"),
                )?;
                ctx.out.push(ch);
            }
            RegexElement::Anchor(_) => {}
            RegexElement::Sequence(ref subs) => {
                for sub in subs.iter() {
                    self.emit_into(sub, rng, ctx)?;
                }
            }
            RegexElement::Alternation(ref subs) => {
                if subs.is_empty() {
                    return Err(Error::illegal_state(
                        "cannot choose from an empty alternation",
                    ));
                }
                let i = rng.gen_range(0..subs.len());
                self.emit_into(&subs[i], rng, ctx)?;
            }
            RegexElement::Quantifier(ref q) => {
                let n = self.repetitions(q, rng);
                for _ in 0..n {
                    self.emit_into(&q.sub, rng, ctx)?;
                }
            }
            RegexElement::CaptureGroup(CaptureGroup {
                index, ref sub, ..
            }) => {
                let start = ctx.out.len();
                self.emit_into(sub, rng, ctx)?;
                let text = ctx.out[start..].to_string();
                ctx.groups.insert(index, text);
            }
            RegexElement::Backreference(index) => {
                let text = ctx
                    .groups
                    .get(&index)
                    .ok_or_else(|| Error::unbound(index))?;
                ctx.out.push_str(text);
            }
        }
        Ok(())
    }

    /// Pick how many times to repeat the given quantifier, uniformly from
    /// its minimum up to its maximum clamped to the cap.
    fn repetitions<R: Rng + ?Sized>(
        &self,
        q: &Quantifier,
        rng: &mut R,
    ) -> u32 {
        let max = q.max.unwrap_or(u32::MAX).min(self.cap);
        let hi = q.min.max(max);
        rng.gen_range(q.min..=hi)
    }
}
