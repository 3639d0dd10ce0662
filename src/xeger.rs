use std::{collections::BTreeSet, fmt, sync::Arc};

use rand::Rng;

use crate::{
    ast::{CaptureGroup, ParserConfig, RegexElement},
    charset::Universe,
    confound::confound,
    emit::{Emitter, DEFAULT_REPETITION_CAP},
    error::{Error, ErrorKind},
    matcher::Matcher,
};

/// A pattern ready for generating strings that match it, or, once
/// confounded, strings that are unlikely to.
///
/// A `Xeger` bundles the parsed tree, the generator and a compiled matcher
/// for the original pattern. It is cheap to clone, and it is `Send` and
/// `Sync`, so one value may be shared by many threads. Each thread should
/// bring its own random number generator.
///
/// # Example
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use xeger::Xeger;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let xeger = Xeger::new(r"[a-f]{3}-\d{2,4}")?;
/// let s = xeger.emit(&mut rng)?;
/// assert!(xeger.matches(&s)?);
///
/// let confounded = xeger.confound().unwrap();
/// let s = confounded.emit(&mut rng)?;
/// assert!(!xeger.matches(&s)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct Xeger {
    pattern: Arc<str>,
    ast: RegexElement,
    matcher: Arc<Matcher>,
    emitter: Emitter,
    confounded: bool,
}

impl Xeger {
    /// Parse the given pattern with the default configuration and compile
    /// its matcher.
    ///
    /// To configure the universe, the repetition cap or the initial flags,
    /// use a [`XegerBuilder`].
    pub fn new(pattern: &str) -> Result<Xeger, Error> {
        XegerBuilder::new(pattern).build()
    }

    /// The pattern as given by the caller. A confounded `Xeger` returns the
    /// pattern it was confounded from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The tree strings are generated from.
    pub fn ast(&self) -> &RegexElement {
        &self.ast
    }

    /// Returns true if this was produced by [`Xeger::confound`].
    pub fn is_confounded(&self) -> bool {
        self.confounded
    }

    /// Every capture group of the pattern, ordered by index.
    pub fn capture_groups(&self) -> Vec<&CaptureGroup> {
        self.ast.capture_groups()
    }

    /// Generate one string.
    ///
    /// Nothing is checked: the string may or may not match the pattern.
    pub fn emit<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, Error> {
        self.emitter.emit(&self.ast, rng)
    }

    /// Generate a string that matches the pattern or, for a confounded
    /// `Xeger`, one that does not. At most `attempts` strings are tried.
    ///
    /// Attempts that fail because a backreference was left unbound count as
    /// misses. Returns `None` when every attempt missed.
    pub fn emit_checked<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        attempts: usize,
    ) -> Result<Option<String>, Error> {
        for _ in 0..attempts {
            let candidate = match self.emit(rng) {
                Ok(candidate) => candidate,
                Err(err) if is_unbound(&err) => continue,
                Err(err) => return Err(err),
            };
            if self.matcher.is_match(&candidate)? != self.confounded {
                return Ok(Some(candidate));
            }
            trace!("rejected {:?} for /{}/", candidate, self.pattern);
        }
        Ok(None)
    }

    /// Generate `size` distinct checked strings, returned in sorted order.
    ///
    /// At most `attempts` strings are generated in total. If the set could
    /// not be filled in that many tries, for example because the language
    /// of the pattern is smaller than `size`, then `None` is returned.
    pub fn emit_set<R: Rng + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
        attempts: usize,
    ) -> Result<Option<BTreeSet<String>>, Error> {
        let mut set = BTreeSet::new();
        for _ in 0..attempts {
            if set.len() == size {
                break;
            }
            if let Some(s) = self.emit_checked(rng, 1)? {
                set.insert(s);
            }
        }
        Ok(if set.len() == size { Some(set) } else { None })
    }

    /// Generate `size` checked strings in the order they were produced.
    /// Unlike [`Xeger::emit_set`], duplicates are kept.
    ///
    /// At most `attempts` strings are generated in total.
    pub fn emit_list<R: Rng + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
        attempts: usize,
    ) -> Result<Option<Vec<String>>, Error> {
        let mut list = Vec::with_capacity(size);
        for _ in 0..attempts {
            if list.len() == size {
                break;
            }
            if let Some(s) = self.emit_checked(rng, 1)? {
                list.push(s);
            }
        }
        Ok(if list.len() == size { Some(list) } else { None })
    }

    /// Returns a `Xeger` that generates strings unlikely to match the
    /// pattern. It shares this value's pattern and matcher.
    ///
    /// Returns `None` if this is already confounded, or if the pattern has
    /// no literal or class that can be confounded.
    pub fn confound(&self) -> Option<Xeger> {
        if self.confounded {
            return None;
        }
        let ast = confound(&self.ast)?;
        Some(Xeger {
            pattern: Arc::clone(&self.pattern),
            ast,
            matcher: Arc::clone(&self.matcher),
            emitter: self.emitter.clone(),
            confounded: true,
        })
    }

    /// Returns true if the entire text matches the original pattern. This
    /// is never inverted, even for a confounded `Xeger`.
    pub fn matches(&self, text: &str) -> Result<bool, Error> {
        self.matcher.is_match(text)
    }

    /// Generate `n` strings and count how many match the original pattern.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
    ) -> Result<Sample, Error> {
        let mut sample = Sample { total: n, matched: 0, unbound: 0 };
        for _ in 0..n {
            let candidate = match self.emit(rng) {
                Ok(candidate) => candidate,
                Err(err) if is_unbound(&err) => {
                    sample.unbound += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };
            if self.matcher.is_match(&candidate)? {
                sample.matched += 1;
            }
        }
        Ok(sample)
    }
}

fn is_unbound(err: &Error) -> bool {
    matches!(err.kind(), ErrorKind::UnboundBackreference(_))
}

/// A builder for a [`Xeger`] with a non-default configuration.
#[derive(Clone, Debug)]
pub struct XegerBuilder {
    pattern: String,
    config: ParserConfig,
    cap: u32,
}

impl XegerBuilder {
    /// Create a new builder for the given pattern.
    pub fn new(pattern: &str) -> XegerBuilder {
        XegerBuilder {
            pattern: pattern.to_string(),
            config: ParserConfig::new(),
            cap: DEFAULT_REPETITION_CAP,
        }
    }

    /// Parse the pattern and compile the matcher.
    pub fn build(&self) -> Result<Xeger, Error> {
        let ast = self.config.parse(&self.pattern)?;
        let matcher = Matcher::new(&self.host_pattern())?;
        debug!(
            "built xeger for /{}/ with {} capture group(s)",
            self.pattern,
            ast.capture_groups().len(),
        );
        Ok(Xeger {
            pattern: Arc::from(self.pattern.as_str()),
            ast,
            matcher: Arc::new(matcher),
            emitter: Emitter::new(self.cap),
            confounded: false,
        })
    }

    /// Set the universe that classes are resolved in and complemented
    /// within. The default is [`Universe::ASCII`].
    pub fn universe(&mut self, universe: Universe) -> &mut XegerBuilder {
        self.config = self.config.universe(universe);
        self
    }

    /// Set the upper bound on repetitions of `*`, `+` and large counted
    /// repetitions. The default is [`DEFAULT_REPETITION_CAP`].
    pub fn repetition_cap(&mut self, cap: u32) -> &mut XegerBuilder {
        self.cap = cap;
        self
    }

    /// Set the nesting limit of the parser.
    pub fn nest_limit(&mut self, limit: u32) -> &mut XegerBuilder {
        self.config = self.config.nest_limit(limit);
        self
    }

    /// Parse the pattern as if it started with `(?i)`.
    pub fn case_insensitive(&mut self, yes: bool) -> &mut XegerBuilder {
        self.config = self.config.case_insensitive(yes);
        self
    }

    /// Parse the pattern as if it started with `(?s)`.
    pub fn dot_matches_new_line(&mut self, yes: bool) -> &mut XegerBuilder {
        self.config = self.config.dot_matches_new_line(yes);
        self
    }

    /// The pattern handed to the matcher, with the initial flags spelled
    /// out so that both sides agree on them.
    fn host_pattern(&self) -> String {
        let mut flags = String::new();
        if self.config.flags.case_insensitive {
            flags.push('i');
        }
        if self.config.flags.dot_matches_new_line {
            flags.push('s');
        }
        if flags.is_empty() {
            self.pattern.clone()
        } else {
            format!("(?{}){}", flags, self.pattern)
        }
    }
}

/// The outcome of [`Xeger::sample`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sample {
    /// The number of strings requested.
    pub total: usize,
    /// How many of them matched the original pattern.
    pub matched: usize,
    /// How many could not be generated because a backreference was left
    /// unbound. These count as non-matching.
    pub unbound: usize,
}

impl Sample {
    /// The fraction of requested strings that matched. An empty sample has
    /// a ratio of `0`.
    pub fn match_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.matched as f64 / self.total as f64
    }
}

/// Thresholds for deciding whether a pattern is good enough to generate
/// test data from.
///
/// A pattern passes when more than `min_match_ratio` of its generated
/// strings match it and, if it can be confounded, fewer than
/// `max_confounded_match_ratio` of its confounded strings do.
#[derive(Clone, Copy, Debug)]
pub struct SamplingPolicy {
    pub sample_size: usize,
    pub min_match_ratio: f64,
    pub max_confounded_match_ratio: f64,
}

impl Default for SamplingPolicy {
    fn default() -> SamplingPolicy {
        SamplingPolicy {
            sample_size: 100,
            min_match_ratio: 0.33,
            max_confounded_match_ratio: 0.70,
        }
    }
}

impl SamplingPolicy {
    /// Sample the given `Xeger` and its confounded counterpart.
    ///
    /// # Errors
    ///
    /// The `Xeger` must not itself be confounded. Errors from generating or
    /// matching are passed through.
    pub fn check<R: Rng + ?Sized>(
        &self,
        xeger: &Xeger,
        rng: &mut R,
    ) -> Result<Report, Error> {
        if xeger.is_confounded() {
            return Err(Error::illegal_state(
                "sampling policy must be checked against an unconfounded \
                 pattern",
            ));
        }
        let plain = xeger.sample(rng, self.sample_size)?;
        let confounded = match xeger.confound() {
            None => None,
            Some(c) => Some(c.sample(rng, self.sample_size)?),
        };
        let report = Report { policy: *self, plain, confounded };
        debug!("/{}/: {}", xeger.pattern(), report);
        Ok(report)
    }
}

/// The result of checking a pattern against a [`SamplingPolicy`].
#[derive(Clone, Copy, Debug)]
pub struct Report {
    policy: SamplingPolicy,
    plain: Sample,
    confounded: Option<Sample>,
}

impl Report {
    /// The sample of strings generated from the pattern.
    pub fn plain(&self) -> &Sample {
        &self.plain
    }

    /// The sample of confounded strings, if the pattern could be
    /// confounded.
    pub fn confounded(&self) -> Option<&Sample> {
        self.confounded.as_ref()
    }

    /// Returns true if enough generated strings matched.
    pub fn is_generative(&self) -> bool {
        self.plain.match_ratio() > self.policy.min_match_ratio
    }

    /// Returns true if the pattern could be confounded and few enough
    /// confounded strings matched.
    pub fn is_confoundable(&self) -> bool {
        self.confounded.map_or(false, |c| {
            c.match_ratio() < self.policy.max_confounded_match_ratio
        })
    }

    /// Returns true if the pattern passes the policy. A pattern that cannot
    /// be confounded at all passes on its plain sample alone.
    pub fn is_valid(&self) -> bool {
        self.is_generative()
            && (self.confounded.is_none() || self.is_confoundable())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "matched {:.1}%", 100.0 * self.plain.match_ratio())?;
        match self.confounded {
            None => write!(f, ", not confoundable")?,
            Some(ref c) => {
                let pct = 100.0 * c.match_ratio();
                write!(f, ", confounded matched {:.1}%", pct)?
            }
        }
        write!(f, ": {}", if self.is_valid() { "ok" } else { "rejected" })
    }
}
