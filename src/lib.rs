/*!
This crate generates random strings from regular expressions.

Given a pattern, it can produce strings that match it, and it can produce
"confounded" strings: near misses with the same shape as matching strings
but drawn from a disjoint set of characters. Both are useful as test data
for code that validates input against a pattern.

# Example

```
use rand::{rngs::StdRng, SeedableRng};
use xeger::{SamplingPolicy, Xeger};

let mut rng = StdRng::seed_from_u64(1);
let xeger = Xeger::new(r"^(0?[1-9]|1[0-2]):[0-5]\d\s?(am|pm)?")?;

// Strings that match.
let good = xeger.emit_set(5, &mut rng, 1000)?.unwrap();
assert!(good.iter().all(|s| xeger.matches(s).unwrap()));

// Strings that don't.
let confounded = xeger.confound().unwrap();
let bad = confounded.emit_checked(&mut rng, 1000)?.unwrap();
assert!(!xeger.matches(&bad)?);

// Is the pattern a good source of test data at all?
let report = SamplingPolicy::default().check(&xeger, &mut rng)?;
assert!(report.is_valid());
# Ok::<(), Box<dyn std::error::Error>>(())
```

# Supported syntax

The parser accepts most of the syntax shared by the `regex` crate and
Java-style engines: literals and escapes, `.`, bracketed classes with ranges
and POSIX classes, `\d \s \w` and their negations, every `\p{..}`
property known to the `regex` crate, anchors and word boundaries, capturing,
named and non-capturing groups, inline flags `i`, `m`, `s` and `U`,
alternation, greedy and lazy repetitions, and backreferences `\1` through
`\9`. Perl classes, properties and case folding under `i` follow the
`regex` crate's Unicode semantics, restricted to the universe in use.

Look-around, atomic groups, possessive repetitions and other constructs
that cannot be generated forward in a single pass are rejected with
[`ErrorKind::UnsupportedConstruct`].

# Character universes

Every character class is resolved against a finite [`Universe`] of
characters, ASCII by default. Negated classes and confounded classes are
complements within that universe, which keeps generation uniform and keeps
confounded strings printable enough to be useful.

# Crate features

* **logging** (enabled by default) - Emits log messages through the `log`
  crate, e.g., when the matcher falls back to the backtracking engine.
*/

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod macros;

pub use crate::{
    ast::{
        parse, Anchor, CaptureGroup, CharClass, ParserConfig, Quantifier,
        RegexElement,
    },
    charset::{CharsBitSet, Iter, Universe},
    confound::confound,
    emit::{emit, Emitter, DEFAULT_REPETITION_CAP},
    error::{Error, ErrorKind},
    matcher::{matches, Matcher},
    xeger::{Report, Sample, SamplingPolicy, Xeger, XegerBuilder},
};

mod ast;
mod charset;
mod confound;
mod emit;
mod error;
mod matcher;
mod xeger;
