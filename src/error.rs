use crate::charset::Universe;

/// An error that occurred while parsing, generating from or matching against
/// a regular expression, or while doing set algebra on character sets.
///
/// The specific failure is available via [`Error::kind`]. Parse errors carry
/// the byte offset into the pattern at which the offending construct begins.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    kind: ErrorKind,
}

/// The kind of an error.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The pattern is syntactically invalid.
    MalformedPattern {
        /// The byte offset at which the problem was detected.
        position: usize,
        /// A short description of what went wrong.
        reason: &'static str,
    },
    /// The pattern is syntactically valid, but uses a construct that is
    /// outside the subset this crate can generate strings for. Look-around
    /// is the most common example.
    UnsupportedConstruct {
        /// The byte offset at which the construct begins.
        position: usize,
        /// The text of the unsupported construct.
        token: String,
    },
    /// A backreference refers to a capture group that does not exist, or
    /// that has not been closed by the time the backreference appears.
    DanglingBackreference {
        /// The byte offset of the backreference's `\`.
        position: usize,
        /// The group index being referenced.
        index: u32,
    },
    /// Set algebra was attempted on two sets with different universes.
    DomainMismatch {
        /// The universe of the receiving set.
        expected: Universe,
        /// The universe of the other operand.
        found: Universe,
    },
    /// A character does not belong to the universe of the set it was added
    /// to.
    OutOfUniverse {
        /// The universe of the set.
        universe: Universe,
        /// The offending character.
        ch: char,
    },
    /// An operation was attempted on a value in a state that forbids it,
    /// for example, mutating a frozen character set.
    IllegalState(&'static str),
    /// During generation, a backreference was evaluated before its capture
    /// group produced any text in the current run.
    UnboundBackreference(u32),
    /// The host regex engine failed to compile or run the original pattern.
    HostRegex(String),
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error { kind }
    }

    pub(crate) fn malformed(position: usize, reason: &'static str) -> Error {
        Error::new(ErrorKind::MalformedPattern { position, reason })
    }

    pub(crate) fn unsupported(position: usize, token: &str) -> Error {
        let token = token.to_string();
        Error::new(ErrorKind::UnsupportedConstruct { position, token })
    }

    pub(crate) fn dangling(position: usize, index: u32) -> Error {
        Error::new(ErrorKind::DanglingBackreference { position, index })
    }

    pub(crate) fn mismatch(expected: Universe, found: Universe) -> Error {
        Error::new(ErrorKind::DomainMismatch { expected, found })
    }

    pub(crate) fn out_of_universe(universe: Universe, ch: char) -> Error {
        Error::new(ErrorKind::OutOfUniverse { universe, ch })
    }

    pub(crate) fn illegal_state(msg: &'static str) -> Error {
        Error::new(ErrorKind::IllegalState(msg))
    }

    pub(crate) fn unbound(index: u32) -> Error {
        Error::new(ErrorKind::UnboundBackreference(index))
    }

    pub(crate) fn host(err: impl core::fmt::Display) -> Error {
        Error::new(ErrorKind::HostRegex(err.to_string()))
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Return the byte offset into the pattern at which this error occurred,
    /// if it is a parse error.
    pub fn position(&self) -> Option<usize> {
        match self.kind {
            ErrorKind::MalformedPattern { position, .. }
            | ErrorKind::UnsupportedConstruct { position, .. }
            | ErrorKind::DanglingBackreference { position, .. } => {
                Some(position)
            }
            _ => None,
        }
    }

    /// Returns true if this error was produced while parsing a pattern.
    ///
    /// Callers generally treat a parse error as "this pattern cannot be used
    /// for generating test data" and skip it.
    pub fn is_parse_error(&self) -> bool {
        self.position().is_some()
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.kind {
            ErrorKind::MalformedPattern { position, reason } => {
                write!(
                    f,
                    "malformed pattern at offset {}: {}",
                    position, reason,
                )
            }
            ErrorKind::UnsupportedConstruct { position, ref token } => {
                write!(
                    f,
                    "unsupported construct '{}' at offset {}",
                    token, position
                )
            }
            ErrorKind::DanglingBackreference { position, index } => {
                write!(
                    f,
                    "backreference \\{} at offset {} does not refer to \
                     a preceding closed capture group",
                    index, position,
                )
            }
            ErrorKind::DomainMismatch { expected, found } => {
                write!(
                    f,
                    "character set universe mismatch: expected {}, found {}",
                    expected, found,
                )
            }
            ErrorKind::OutOfUniverse { universe, ch } => {
                write!(f, "character {:?} is outside of {}", ch, universe)
            }
            ErrorKind::IllegalState(msg) => {
                write!(f, "illegal state: {}", msg)
            }
            ErrorKind::UnboundBackreference(index) => write!(
                f,
                "backreference \\{} evaluated before its group was bound",
                index
            ),
            ErrorKind::HostRegex(ref msg) => {
                write!(f, "host regex engine error: {}", msg)
            }
        }
    }
}
