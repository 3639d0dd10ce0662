/*!
An adapter over the host regex engines, used to check generated strings
against the pattern they were generated from.

Patterns are matched in their entirety: a candidate matches only if the
whole string is in the language of the pattern. The `regex` crate is tried
first. Patterns it rejects, most commonly because they contain
backreferences, are compiled with the backtracking engine from
`fancy-regex` instead.
*/

use crate::error::Error;

/// Returns true if the entire candidate is matched by the given pattern.
///
/// This compiles the pattern on every call. Use a [`Matcher`] to check many
/// candidates against the same pattern.
pub fn matches(candidate: &str, pattern: &str) -> Result<bool, Error> {
    Matcher::new(pattern)?.is_match(candidate)
}

/// A compiled pattern that checks whether strings match it in full.
#[derive(Clone, Debug)]
pub struct Matcher {
    pattern: String,
    engine: Engine,
}

#[derive(Clone, Debug)]
enum Engine {
    Finite(regex::Regex),
    Backtracking(fancy_regex::Regex),
}

impl Matcher {
    /// Compile the given pattern.
    ///
    /// # Errors
    ///
    /// This returns a [`HostRegex`](crate::ErrorKind::HostRegex) error when
    /// neither engine can compile the pattern.
    pub fn new(pattern: &str) -> Result<Matcher, Error> {
        let anchored = format!("^(?:{})$", pattern);
        let engine = match regex::Regex::new(&anchored) {
            Ok(re) => Engine::Finite(re),
            Err(_err) => {
                debug!(
                    "regex rejected /{}/ ({}), falling back to fancy-regex",
                    pattern,
                    _err.to_string().lines().last().unwrap_or(""),
                );
                let re =
                    fancy_regex::Regex::new(&anchored).map_err(Error::host)?;
                Engine::Backtracking(re)
            }
        };
        Ok(Matcher { pattern: pattern.to_string(), engine })
    }

    /// The pattern this matcher was compiled from, without the anchors added
    /// to force a full match.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if this matcher uses the backtracking engine.
    pub fn is_backtracking(&self) -> bool {
        matches!(self.engine, Engine::Backtracking(_))
    }

    /// Returns true if the entire candidate is matched by this pattern.
    ///
    /// # Errors
    ///
    /// The backtracking engine gives up on inputs that need too many steps.
    /// That is reported as a [`HostRegex`](crate::ErrorKind::HostRegex)
    /// error.
    pub fn is_match(&self, candidate: &str) -> Result<bool, Error> {
        match self.engine {
            Engine::Finite(ref re) => Ok(re.is_match(candidate)),
            Engine::Backtracking(ref re) => {
                re.is_match(candidate).map_err(Error::host)
            }
        }
    }
}
