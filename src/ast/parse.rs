use core::cell::{Cell, RefCell};

use regex_syntax::hir::{
    Class, ClassUnicode, ClassUnicodeRange, HirKind, Literal,
};

use crate::{
    ast::{
        self, Anchor, CaptureGroup, CharClass, Flags, ParserConfig,
        Quantifier, RegexElement,
    },
    charset::CharsBitSet,
    error::Error,
};

// These are all of the reasons a pattern can be malformed. Each message is
// used in exactly one place, so given a message one can identify precisely
// which part of the parser reported it. They have names so that tests can
// refer to them.
//
// Constructs that are well formed but that we refuse to generate strings
// for are reported as unsupported instead, along with their text.
const ERR_TOO_MUCH_NESTING: &str = "pattern has too much nesting";
const ERR_TOO_MANY_CAPTURES: &str = "too many capture groups";
const ERR_DUPLICATE_CAPTURE_NAME: &str = "duplicate capture group name";
const ERR_UNCLOSED_GROUP: &str = "found open group without closing ')'";
const ERR_UNCLOSED_GROUP_QUESTION: &str =
    "expected closing ')', but got end of pattern";
const ERR_UNOPENED_GROUP: &str = "found closing ')' without matching '('";
const ERR_EMPTY_FLAGS: &str = "empty flag directive '(?)' is not allowed";
const ERR_MISSING_GROUP_NAME: &str =
    "expected capture group name, but got end of pattern";
const ERR_INVALID_GROUP_NAME: &str = "invalid group name";
const ERR_UNCLOSED_GROUP_NAME: &str =
    "expected end of capture group name, but got end of pattern";
const ERR_EMPTY_GROUP_NAME: &str = "empty capture group names are not allowed";
const ERR_FLAG_REPEATED_NEGATION: &str =
    "inline flag negation cannot be repeated";
const ERR_FLAG_DUPLICATE: &str = "duplicate inline flag is not allowed";
const ERR_FLAG_UNEXPECTED_EOF: &str =
    "expected ':' or ')' to end inline flags, but got end of pattern";
const ERR_FLAG_DANGLING_NEGATION: &str =
    "inline flags cannot end with negation directive";
const ERR_DECIMAL_NO_DIGITS: &str =
    "expected decimal number, but found no digits";
const ERR_DECIMAL_INVALID: &str = "got invalid decimal number";
const ERR_HEX_BRACE_INVALID_DIGIT: &str =
    "expected hexadecimal number in braces, but got non-hex digit";
const ERR_HEX_BRACE_UNEXPECTED_EOF: &str =
    "expected hexadecimal number, but saw end of pattern before closing brace";
const ERR_HEX_BRACE_EMPTY: &str =
    "expected hexadecimal number in braces, but got no digits";
const ERR_HEX_BRACE_INVALID: &str = "got invalid hexadecimal number in braces";
const ERR_HEX_FIXED_UNEXPECTED_EOF: &str =
    "expected fixed length hexadecimal number, but saw end of pattern first";
const ERR_HEX_FIXED_INVALID_DIGIT: &str =
    "expected fixed length hexadecimal number, but got non-hex digit";
const ERR_HEX_FIXED_INVALID: &str =
    "got invalid fixed length hexadecimal number";
const ERR_HEX_UNEXPECTED_EOF: &str =
    "expected hexadecimal number, but saw end of pattern first";
const ERR_ESCAPE_UNEXPECTED_EOF: &str =
    "saw start of escape sequence, but saw end of pattern before it finished";
const ERR_ESCAPE_UNRECOGNIZED: &str = "unrecognized escape sequence";
const ERR_UNICODE_CLASS_UNEXPECTED_EOF: &str =
    "expected property name after \\p or \\P, but got end of pattern";
const ERR_UNICODE_CLASS_UNCLOSED: &str =
    "expected '}' to end property name, but got end of pattern";
const ERR_UNCOUNTED_REP_SUB_MISSING: &str =
    "uncounted repetition operator must be applied to a sub-expression";
const ERR_COUNTED_REP_SUB_MISSING: &str =
    "counted repetition operator must be applied to a sub-expression";
const ERR_COUNTED_REP_UNCLOSED: &str =
    "found unclosed counted repetition operator";
const ERR_COUNTED_REP_MIN_UNCLOSED: &str =
    "found incomplete and unclosed counted repetition operator";
const ERR_COUNTED_REP_COMMA_UNCLOSED: &str =
    "found counted repetition operator with a comma that is unclosed";
const ERR_COUNTED_REP_MIN_MAX_UNCLOSED: &str =
    "found counted repetition with min and max that is unclosed";
const ERR_COUNTED_REP_INVALID: &str =
    "expected closing brace for counted repetition, but got something else";
const ERR_COUNTED_REP_INVALID_RANGE: &str =
    "found counted repetition with a min bigger than its max";
const ERR_CLASS_UNCLOSED_AFTER_ITEM: &str =
    "non-empty character class has no closing bracket";
const ERR_CLASS_INVALID_RANGE_ITEM: &str =
    "character class ranges must start and end with a single character";
const ERR_CLASS_INVALID_ITEM: &str =
    "invalid escape sequence in character class";
const ERR_CLASS_UNCLOSED_AFTER_DASH: &str =
    "non-empty character class has no closing bracket after dash";
const ERR_CLASS_UNCLOSED_AFTER_NEGATION: &str =
    "negated character class has no closing bracket";
const ERR_CLASS_UNCLOSED_AFTER_CLOSING: &str =
    "character class begins with literal ']' but has no closing bracket";
const ERR_CLASS_INVALID_RANGE: &str = "invalid range in character class";
const ERR_CLASS_UNCLOSED: &str = "found unclosed character class";

/// A single item in a bracketed character class, before it is resolved
/// against the universe.
#[derive(Clone, Debug)]
enum ClassItem {
    Range(char, char),
    Set(CharsBitSet),
}

/// A recursive descent parser from a pattern string to a [`RegexElement`].
///
/// All mutable state lives in cells so that the parsing routines can take
/// `&self`.
#[derive(Clone, Debug)]
pub(super) struct Parser<'a> {
    /// The configuration of the parser as given by the caller.
    config: ParserConfig,
    /// The pattern we're parsing as given by the caller.
    pattern: &'a str,
    /// The call depth of the parser. This is incremented for each
    /// sub-expression parsed. Its peak value is the maximum nesting of the
    /// pattern.
    depth: Cell<u32>,
    /// The current position of the parser.
    pos: Cell<usize>,
    /// The current codepoint of the parser. The codepoint corresponds to the
    /// codepoint encoded in `pattern` beginning at `pos`.
    ///
    /// This is `None` if and only if `pos == pattern.len()`.
    char: Cell<Option<char>>,
    /// The current capture index.
    capture_index: Cell<u32>,
    /// The flags that are currently set.
    flags: RefCell<Flags>,
    /// A sorted sequence of capture names. This is used to detect duplicate
    /// capture names and report an error if one is detected.
    capture_names: RefCell<Vec<String>>,
    /// Indexed by capture index. An entry is true once the group's closing
    /// parenthesis has been seen, at which point backreferences to it become
    /// legal.
    closed: RefCell<Vec<bool>>,
}

/// The constructor and a variety of helper routines.
impl<'a> Parser<'a> {
    /// Build a parser from this configuration with the given pattern.
    pub(super) fn new(config: ParserConfig, pattern: &'a str) -> Parser<'a> {
        Parser {
            config,
            pattern,
            depth: Cell::new(0),
            pos: Cell::new(0),
            char: Cell::new(pattern.chars().next()),
            capture_index: Cell::new(0),
            flags: RefCell::new(config.flags),
            capture_names: RefCell::new(vec![]),
            closed: RefCell::new(vec![false]),
        }
    }

    /// Returns the full pattern string that we're parsing.
    fn pattern(&self) -> &str {
        self.pattern
    }

    /// Return the current byte offset of the parser.
    fn pos(&self) -> usize {
        self.pos.get()
    }

    /// Increments the call depth of the parser.
    ///
    /// If the call depth would exceed the configured nest limit, then this
    /// returns an error.
    ///
    /// This returns the old depth.
    fn increment_depth(&self) -> Result<u32, Error> {
        let old = self.depth.get();
        if old > self.config.nest_limit {
            return Err(Error::malformed(self.pos(), ERR_TOO_MUCH_NESTING));
        }
        // OK because our depth starts at 0, and we return an error if it
        // ever reaches the limit. So the call depth can never exceed u32::MAX.
        let new = old.checked_add(1).unwrap();
        self.depth.set(new);
        Ok(old)
    }

    /// Decrements the call depth of the parser.
    ///
    /// This panics if the current depth is 0.
    fn decrement_depth(&self) {
        let old = self.depth.get();
        // If this fails then the caller has a bug in how they're incrementing
        // and decrementing the depth of the parser's call stack.
        let new = old.checked_sub(1).unwrap();
        self.depth.set(new);
    }

    /// Return the codepoint at the current position of the parser.
    ///
    /// This panics if the parser is positioned at the end of the pattern.
    fn char(&self) -> char {
        self.char.get().expect("codepoint, but parser is done")
    }

    /// Returns true if the next call to `bump` would return false.
    fn is_done(&self) -> bool {
        self.pos() == self.pattern.len()
    }

    /// Returns the flags that are current set for this pattern.
    fn flags(&self) -> Flags {
        *self.flags.borrow()
    }

    /// Bump the parser to the next Unicode scalar value.
    ///
    /// If the end of the input has been reached, then `false` is returned.
    fn bump(&self) -> bool {
        if self.is_done() {
            return false;
        }
        self.pos.set(self.pos() + self.char().len_utf8());
        self.char.set(self.pattern()[self.pos()..].chars().next());
        self.char.get().is_some()
    }

    /// If the substring starting at the current position of the parser has
    /// the given prefix, then bump the parser to the character immediately
    /// following the prefix and return true. Otherwise, don't bump the parser
    /// and return false.
    fn bump_if(&self, prefix: &str) -> bool {
        if self.pattern()[self.pos()..].starts_with(prefix) {
            for _ in 0..prefix.chars().count() {
                self.bump();
            }
            true
        } else {
            false
        }
    }

    /// Peek at the next character in the input without advancing the parser.
    ///
    /// If the input has been exhausted, then this returns `None`.
    fn peek(&self) -> Option<char> {
        if self.is_done() {
            return None;
        }
        self.pattern()[self.pos() + self.char().len_utf8()..].chars().next()
    }

    /// Build an "unsupported construct" error whose token is the text of the
    /// pattern from `start` up to the parser's current position.
    fn unsupported(&self, start: usize) -> Error {
        Error::unsupported(start, &self.pattern()[start..self.pos()])
    }

    /// Return the next capturing index. Each subsequent call increments the
    /// internal index. Since the way capture indices are computed is a public
    /// API guarantee, use of this routine depends on the parser being depth
    /// first and left-to-right.
    ///
    /// If the capture limit is exceeded, then an error is returned.
    fn next_capture_index(&self) -> Result<u32, Error> {
        let current = self.capture_index.get();
        let next = current.checked_add(1).ok_or_else(|| {
            Error::malformed(self.pos(), ERR_TOO_MANY_CAPTURES)
        })?;
        self.capture_index.set(next);
        self.closed.borrow_mut().push(false);
        Ok(next)
    }

    /// Record that the group with the given index has been closed.
    fn close_capture(&self, index: u32) {
        if let Some(closed) = self.closed.borrow_mut().get_mut(index as usize)
        {
            *closed = true;
        }
    }

    /// Adds the given capture name to this parser. If this capture name has
    /// already been used, then an error is returned.
    fn add_capture_name(&self, start: usize, name: &str) -> Result<(), Error> {
        let mut names = self.capture_names.borrow_mut();
        match names.binary_search_by(|n| name.cmp(n)) {
            Ok(_) => Err(Error::malformed(start, ERR_DUPLICATE_CAPTURE_NAME)),
            Err(i) => {
                names.insert(i, name.to_string());
                Ok(())
            }
        }
    }

    /// Returns true if and only if the parser is positioned at a look-around
    /// or atomic group prefix. The parser is advanced past the prefix when
    /// true is returned.
    ///
    /// This should only be called immediately after parsing the opening of
    /// a group.
    fn is_lookaround_prefix(&self) -> bool {
        self.bump_if("?=")
            || self.bump_if("?!")
            || self.bump_if("?<=")
            || self.bump_if("?<!")
            || self.bump_if("?>")
    }
}

/// The actual parser. We try to break out each kind of pattern syntax into
/// its own routine.
impl<'a> Parser<'a> {
    pub(super) fn parse(&self) -> Result<RegexElement, Error> {
        let ast = self.parse_inner()?;
        // The parser only counts recursive parse calls, but repetition
        // operators can be stacked without recursing. Everything downstream
        // recurses over the tree, so check its real depth too.
        check_nesting(&ast, self.config.nest_limit)?;
        Ok(ast)
    }

    fn parse_inner(&self) -> Result<RegexElement, Error> {
        let depth = self.increment_depth()?;
        let mut alternates = vec![];
        let mut concat = vec![];
        loop {
            if self.is_done() {
                break;
            }
            match self.char() {
                '(' => {
                    let open = self.pos();
                    // Save the old flags and reset them only when we close
                    // the group.
                    let oldflags = *self.flags.borrow();
                    if let Some(sub) = self.parse_group()? {
                        concat.push(sub);
                        // A `None` means a bare flag directive like `(?i)`,
                        // whose flags stay active until the end of the
                        // enclosing group.
                        *self.flags.borrow_mut() = oldflags;
                    }
                    if self.char.get() != Some(')') {
                        return Err(Error::malformed(open, ERR_UNCLOSED_GROUP));
                    }
                    self.bump();
                }
                ')' => {
                    if depth == 0 {
                        return Err(Error::malformed(
                            self.pos(),
                            ERR_UNOPENED_GROUP,
                        ));
                    }
                    break;
                }
                '|' => {
                    let branch = core::mem::take(&mut concat);
                    alternates.push(RegexElement::sequence(branch));
                    self.bump();
                }
                '[' => concat.push(self.parse_class()?),
                '?' | '*' | '+' => {
                    concat = self.parse_uncounted_repetition(concat)?;
                }
                '{' => {
                    concat = self.parse_counted_repetition(concat)?;
                }
                _ => concat.push(self.parse_primitive()?),
            }
        }
        self.decrement_depth();
        alternates.push(RegexElement::sequence(concat));
        // N.B. This strips off the "alternation" if there's only one branch.
        Ok(RegexElement::alternation(alternates))
    }

    /// Parses a "primitive" pattern. A primitive is any expression that does
    /// not contain any sub-expressions.
    ///
    /// This assumes the parser is pointing at the beginning of the primitive.
    fn parse_primitive(&self) -> Result<RegexElement, Error> {
        let start = self.pos();
        let ch = self.char();
        self.bump();
        match ch {
            '\\' => self.parse_escape(start),
            '.' => Ok(self.hir_dot()),
            '^' => Ok(RegexElement::Anchor(Anchor::Start)),
            '$' => Ok(RegexElement::Anchor(Anchor::End)),
            ch => Ok(self.hir_char(ch)),
        }
    }

    /// Parse an escape sequence. This always results in a "primitive"
    /// element, that is, one with no sub-expressions.
    ///
    /// This assumes the parser is positioned at the start of the sequence,
    /// immediately *after* the `\`, whose offset is `start`. It advances the
    /// parser to the first position immediately following the escape
    /// sequence.
    fn parse_escape(&self, start: usize) -> Result<RegexElement, Error> {
        if self.is_done() {
            return Err(Error::malformed(start, ERR_ESCAPE_UNEXPECTED_EOF));
        }
        let ch = self.char();
        // Put some of the more complicated routines into helpers.
        match ch {
            '1'..='9' => return self.parse_backreference(start),
            'p' | 'P' => return self.parse_unicode_class(start),
            'x' | 'u' | 'U' => return self.parse_hex(start),
            'd' | 's' | 'w' | 'D' | 'S' | 'W' => {
                return self.parse_perl_class(start);
            }
            // Octal escapes, control characters and named backreferences.
            '0' | 'c' | 'k' => {
                self.bump();
                if ch != '0' {
                    self.bump();
                }
                return Err(self.unsupported(start));
            }
            _ => {}
        }

        // Handle all of the one letter sequences inline.
        self.bump();
        if ast::is_meta_character(ch) || ast::is_escapeable_character(ch) {
            return Ok(self.hir_char(ch));
        }
        let special = |ch| Ok(self.hir_char(ch));
        match ch {
            'a' => special('\x07'),
            'f' => special('\x0C'),
            't' => special('\t'),
            'n' => special('\n'),
            'r' => special('\r'),
            'v' => special('\x0B'),
            'A' => Ok(RegexElement::Anchor(Anchor::Start)),
            'z' => Ok(RegexElement::Anchor(Anchor::End)),
            'b' => Ok(RegexElement::Anchor(Anchor::WordBoundary)),
            'B' => Ok(RegexElement::Anchor(Anchor::NotWordBoundary)),
            _ => Err(Error::malformed(start, ERR_ESCAPE_UNRECOGNIZED)),
        }
    }

    /// Parse a backreference. Only a single digit is consumed, so `\10` is a
    /// reference to group `1` followed by a literal `0`.
    ///
    /// The referenced group must have been closed already. This rules out
    /// forward references as well as references to an enclosing group.
    fn parse_backreference(
        &self,
        start: usize,
    ) -> Result<RegexElement, Error> {
        // OK because the caller checked that this is a digit in 1..=9.
        let index = self.char().to_digit(10).unwrap();
        self.bump();
        let closed = self
            .closed
            .borrow()
            .get(index as usize)
            .copied()
            .unwrap_or(false);
        if !closed {
            return Err(Error::dangling(start, index));
        }
        Ok(RegexElement::Backreference(index))
    }

    /// Parse a property class like `\pL`, `\p{Lu}` or `\P{Greek}`.
    ///
    /// Any property the host engine knows is accepted. Anything else is
    /// reported as unsupported.
    fn parse_unicode_class(
        &self,
        start: usize,
    ) -> Result<RegexElement, Error> {
        let negated = self.char() == 'P';
        if !self.bump() {
            return Err(Error::malformed(
                start,
                ERR_UNICODE_CLASS_UNEXPECTED_EOF,
            ));
        }
        let name = if self.char() == '{' {
            let name_start = self.pos() + 1;
            while self.bump() && self.char() != '}' {}
            if self.is_done() {
                return Err(Error::malformed(
                    start,
                    ERR_UNICODE_CLASS_UNCLOSED,
                ));
            }
            let name = &self.pattern()[name_start..self.pos()];
            self.bump();
            name
        } else {
            let name_start = self.pos();
            self.bump();
            &self.pattern()[name_start..self.pos()]
        };
        let set = match self.host_class(&format!(r"\p{{{}}}", name)) {
            Some(set) => set,
            None => return Err(self.unsupported(start)),
        };
        self.hir_class(start, set, negated)
    }

    /// Parse a hex representation of a Unicode codepoint. This handles both
    /// hex notations, i.e., `\xFF` and `\x{FFFF}`. This expects the parser to
    /// be positioned at the `x`, `u` or `U` prefix. The parser is advanced to
    /// the first character immediately following the hexadecimal literal.
    fn parse_hex(&self, start: usize) -> Result<RegexElement, Error> {
        let digit_len = match self.char() {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            unk => unreachable!(
                "invalid start of fixed length hexadecimal number {}",
                unk
            ),
        };
        if !self.bump() {
            return Err(Error::malformed(start, ERR_HEX_UNEXPECTED_EOF));
        }
        if self.char() == '{' {
            self.parse_hex_brace(start)
        } else {
            self.parse_hex_digits(start, digit_len)
        }
    }

    /// Parse an N-digit hex representation of a Unicode codepoint. This
    /// expects the parser to be positioned at the first digit and will advance
    /// the parser to the first character immediately following the escape
    /// sequence.
    fn parse_hex_digits(
        &self,
        start: usize,
        digit_len: usize,
    ) -> Result<RegexElement, Error> {
        let mut scratch = String::new();
        for i in 0..digit_len {
            if i > 0 && !self.bump() {
                return Err(Error::malformed(
                    start,
                    ERR_HEX_FIXED_UNEXPECTED_EOF,
                ));
            }
            if !is_hex(self.char()) {
                return Err(Error::malformed(
                    self.pos(),
                    ERR_HEX_FIXED_INVALID_DIGIT,
                ));
            }
            scratch.push(self.char());
        }
        // The final bump just moves the parser past the literal, which may
        // be EOF.
        self.bump();
        match u32::from_str_radix(&scratch, 16).ok().and_then(char::from_u32) {
            None => Err(Error::malformed(start, ERR_HEX_FIXED_INVALID)),
            Some(ch) => Ok(self.hir_char(ch)),
        }
    }

    /// Parse a hex representation of any Unicode scalar value. This expects
    /// the parser to be positioned at the opening brace `{` and will advance
    /// the parser to the first character following the closing brace `}`.
    fn parse_hex_brace(&self, start: usize) -> Result<RegexElement, Error> {
        let mut scratch = String::new();
        while self.bump() && self.char() != '}' {
            if !is_hex(self.char()) {
                return Err(Error::malformed(
                    self.pos(),
                    ERR_HEX_BRACE_INVALID_DIGIT,
                ));
            }
            scratch.push(self.char());
        }
        if self.is_done() {
            return Err(Error::malformed(start, ERR_HEX_BRACE_UNEXPECTED_EOF));
        }
        assert_eq!(self.char(), '}');
        self.bump();

        if scratch.is_empty() {
            return Err(Error::malformed(start, ERR_HEX_BRACE_EMPTY));
        }
        match u32::from_str_radix(&scratch, 16).ok().and_then(char::from_u32) {
            None => Err(Error::malformed(start, ERR_HEX_BRACE_INVALID)),
            Some(ch) => Ok(self.hir_char(ch)),
        }
    }

    /// Parse a decimal number into a u32 while trimming leading and trailing
    /// whitespace.
    ///
    /// This expects the parser to be positioned at the first position where
    /// a decimal digit could occur. This will advance the parser to the byte
    /// immediately following the last contiguous decimal digit.
    ///
    /// If no decimal digit could be found or if there was a problem parsing
    /// the complete set of digits into a u32, then an error is returned.
    fn parse_decimal(&self) -> Result<u32, Error> {
        let mut scratch = String::new();
        while !self.is_done() && self.char().is_whitespace() {
            self.bump();
        }
        let start = self.pos();
        while !self.is_done() && '0' <= self.char() && self.char() <= '9' {
            scratch.push(self.char());
            self.bump();
        }
        while !self.is_done() && self.char().is_whitespace() {
            self.bump();
        }
        let digits = scratch.as_str();
        if digits.is_empty() {
            return Err(Error::malformed(start, ERR_DECIMAL_NO_DIGITS));
        }
        match u32::from_str_radix(digits, 10).ok() {
            Some(n) => Ok(n),
            None => Err(Error::malformed(start, ERR_DECIMAL_INVALID)),
        }
    }

    /// Parses an uncounted repetition operator. An uncounted repetition
    /// operator includes `?`, `*` and `+`, but does not include the `{m,n}`
    /// syntax. The current character should be one of `?`, `*` or `+`. Any
    /// other character will result in a panic.
    ///
    /// This assumes that the parser is currently positioned at the repetition
    /// operator and advances the parser to the first character after the
    /// operator. (Note that the operator may include a single additional `?`,
    /// which makes the operator ungreedy.)
    ///
    /// The caller should include the concatenation that is being built. The
    /// concatenation returned includes the repetition operator applied to the
    /// last expression in the given concatenation.
    ///
    /// If the concatenation is empty, then this returns an error.
    fn parse_uncounted_repetition(
        &self,
        mut concat: Vec<RegexElement>,
    ) -> Result<Vec<RegexElement>, Error> {
        let start = self.pos();
        let sub = match concat.pop() {
            Some(el) => Box::new(el),
            None => {
                return Err(Error::malformed(
                    start,
                    ERR_UNCOUNTED_REP_SUB_MISSING,
                ));
            }
        };
        let (min, max) = match self.char() {
            '?' => (0, Some(1)),
            '*' => (0, None),
            '+' => (1, None),
            unk => unreachable!("unrecognized repetition operator '{}'", unk),
        };
        let greedy = self.parse_greediness(start)?;
        concat.push(RegexElement::Quantifier(Quantifier {
            min,
            max,
            greedy,
            sub,
        }));
        Ok(concat)
    }

    /// Parses a counted repetition operation. A counted repetition operator
    /// corresponds to the `{m,n}` syntax, and does not include the `?`, `*` or
    /// `+` operators.
    ///
    /// This assumes that the parser is currently at the opening `{` and
    /// advances the parser to the first character after the operator. (Note
    /// that the operator may include a single additional `?`, which makes the
    /// operator ungreedy.)
    ///
    /// If the concatenation is empty, then this returns an error.
    fn parse_counted_repetition(
        &self,
        mut concat: Vec<RegexElement>,
    ) -> Result<Vec<RegexElement>, Error> {
        assert_eq!(self.char(), '{', "expected opening brace");
        let start = self.pos();
        let sub = match concat.pop() {
            Some(el) => Box::new(el),
            None => {
                return Err(Error::malformed(
                    start,
                    ERR_COUNTED_REP_SUB_MISSING,
                ));
            }
        };
        if !self.bump() {
            return Err(Error::malformed(start, ERR_COUNTED_REP_UNCLOSED));
        }
        let min = self.parse_decimal()?;
        let mut max = Some(min);
        if self.is_done() {
            return Err(Error::malformed(start, ERR_COUNTED_REP_MIN_UNCLOSED));
        }
        if self.char() == ',' {
            if !self.bump() {
                return Err(Error::malformed(
                    start,
                    ERR_COUNTED_REP_COMMA_UNCLOSED,
                ));
            }
            if self.char() != '}' {
                max = Some(self.parse_decimal()?);
            } else {
                max = None;
            }
            if self.is_done() {
                return Err(Error::malformed(
                    start,
                    ERR_COUNTED_REP_MIN_MAX_UNCLOSED,
                ));
            }
        }
        if self.char() != '}' {
            return Err(Error::malformed(self.pos(), ERR_COUNTED_REP_INVALID));
        }
        let greedy = self.parse_greediness(start)?;
        if max.map_or(false, |max| min > max) {
            return Err(Error::malformed(start, ERR_COUNTED_REP_INVALID_RANGE));
        }
        concat.push(RegexElement::Quantifier(Quantifier {
            min,
            max,
            greedy,
            sub,
        }));
        Ok(concat)
    }

    /// Bump past the final character of a repetition operator and consume
    /// an optional `?` marking it lazy. A trailing `+` marks a possessive
    /// operator, which is unsupported.
    fn parse_greediness(&self, start: usize) -> Result<bool, Error> {
        let mut greedy = true;
        if self.bump() {
            if self.char() == '?' {
                greedy = false;
                self.bump();
            } else if self.char() == '+' {
                self.bump();
                return Err(self.unsupported(start));
            }
        }
        if self.flags().swap_greed {
            greedy = !greedy;
        }
        Ok(greedy)
    }

    /// Parses the part of a pattern that starts with a `(`. This is usually
    /// a group sub-expression, but might just be a directive that enables
    /// (or disables) certain flags.
    ///
    /// This assumes the parser is pointing at the opening `(`.
    fn parse_group(&self) -> Result<Option<RegexElement>, Error> {
        assert_eq!(self.char(), '(');
        let open = self.pos();
        self.bump();
        if self.is_lookaround_prefix() {
            return Err(self.unsupported(open));
        }
        if self.bump_if("?P<") || self.bump_if("?<") {
            let index = self.next_capture_index()?;
            let name = Some(Box::from(self.parse_capture_name()?));
            let sub = Box::new(self.parse_inner()?);
            self.close_capture(index);
            let group = CaptureGroup { index, name, sub };
            Ok(Some(RegexElement::CaptureGroup(group)))
        } else if self.bump_if("?") {
            if self.is_done() {
                return Err(Error::malformed(
                    open,
                    ERR_UNCLOSED_GROUP_QUESTION,
                ));
            }
            let start = self.pos();
            // The flags get reset in 'parse_inner'.
            *self.flags.borrow_mut() = self.parse_flags()?;
            let consumed = self.pos() - start;
            if self.char() == ')' {
                // We don't allow empty flags, e.g., `(?)`.
                if consumed == 0 {
                    return Err(Error::malformed(open, ERR_EMPTY_FLAGS));
                }
                Ok(None)
            } else {
                assert_eq!(':', self.char());
                self.bump();
                self.parse_inner().map(Some)
            }
        } else {
            let index = self.next_capture_index()?;
            let sub = Box::new(self.parse_inner()?);
            self.close_capture(index);
            let group = CaptureGroup { index, name: None, sub };
            Ok(Some(RegexElement::CaptureGroup(group)))
        }
    }

    /// Parses a capture group name. Assumes that the parser is positioned at
    /// the first character in the name following the opening `<` (and may
    /// possibly be EOF). This advances the parser to the first character
    /// following the closing `>`.
    fn parse_capture_name(&self) -> Result<&str, Error> {
        if self.is_done() {
            return Err(Error::malformed(self.pos(), ERR_MISSING_GROUP_NAME));
        }
        let start = self.pos();
        loop {
            if self.char() == '>' {
                break;
            }
            if !is_capture_char(self.char(), self.pos() == start) {
                return Err(Error::malformed(
                    self.pos(),
                    ERR_INVALID_GROUP_NAME,
                ));
            }
            if !self.bump() {
                break;
            }
        }
        let end = self.pos();
        if self.is_done() {
            return Err(Error::malformed(start, ERR_UNCLOSED_GROUP_NAME));
        }
        assert_eq!(self.char(), '>');
        self.bump();
        let name = &self.pattern()[start..end];
        if name.is_empty() {
            return Err(Error::malformed(start, ERR_EMPTY_GROUP_NAME));
        }
        self.add_capture_name(start, name)?;
        Ok(name)
    }

    /// Parse a sequence of flags starting at the current character.
    ///
    /// This advances the parser to the character immediately following the
    /// flags, which is guaranteed to be either `:` or `)`.
    ///
    /// # Errors
    ///
    /// If any flags are duplicated, then an error is returned.
    ///
    /// If the negation operator is used more than once, then an error is
    /// returned.
    ///
    /// If no flags could be found or if the negation operation is not followed
    /// by any flags, then an error is returned.
    fn parse_flags(&self) -> Result<Flags, Error> {
        let mut flags = *self.flags.borrow();
        let mut negate = false;
        // Keeps track of whether the previous flag item was a '-'. We use this
        // to detect whether there is a dangling '-', which is invalid.
        let mut last_was_negation = false;
        // A set to keep track of the flags we've seen. Since all flags are
        // ASCII, we only need 128 bytes.
        let mut seen = [false; 128];
        while self.char() != ':' && self.char() != ')' {
            if self.char() == '-' {
                last_was_negation = true;
                if negate {
                    return Err(Error::malformed(
                        self.pos(),
                        ERR_FLAG_REPEATED_NEGATION,
                    ));
                }
                negate = true;
            } else {
                last_was_negation = false;
                self.parse_flag(&mut flags, negate)?;
                // OK because every valid flag is ASCII, and we're only here if
                // the flag is valid.
                let flag_byte = u8::try_from(self.char()).unwrap();
                if seen[usize::from(flag_byte)] {
                    return Err(Error::malformed(
                        self.pos(),
                        ERR_FLAG_DUPLICATE,
                    ));
                }
                seen[usize::from(flag_byte)] = true;
            }
            if !self.bump() {
                return Err(Error::malformed(
                    self.pos(),
                    ERR_FLAG_UNEXPECTED_EOF,
                ));
            }
        }
        if last_was_negation {
            return Err(Error::malformed(
                self.pos(),
                ERR_FLAG_DANGLING_NEGATION,
            ));
        }
        Ok(flags)
    }

    /// Parse the current character as a flag. Do not advance the parser.
    ///
    /// This sets the appropriate boolean value in place on the set of flags
    /// given. The boolean is inverted when `negate` is true.
    ///
    /// # Errors
    ///
    /// Any flag other than `i`, `m`, `s`, `U` and `u` is reported as
    /// unsupported. That includes `x`, since whitespace insensitive patterns
    /// are not handled.
    fn parse_flag(
        &self,
        flags: &mut Flags,
        negate: bool,
    ) -> Result<(), Error> {
        let enabled = !negate;
        match self.char() {
            'i' => flags.case_insensitive = enabled,
            'm' => flags.multi_line = enabled,
            's' => flags.dot_matches_new_line = enabled,
            'U' => flags.swap_greed = enabled,
            // Accepted as a no-op, since every pattern is Unicode aware.
            'u' => {}
            ch => {
                let mut buf = [0; 4];
                return Err(Error::unsupported(
                    self.pos(),
                    ch.encode_utf8(&mut buf),
                ));
            }
        }
        Ok(())
    }

    /// Parse a standard character class consisting primarily of characters or
    /// character ranges.
    ///
    /// This assumes the parser is positioned at the opening `[`. If parsing
    /// is successful, then the parser is advanced to the position immediately
    /// following the closing `]`.
    ///
    /// A class that names a character outside the universe, or whose
    /// effective set is empty, is unsupported.
    fn parse_class(&self) -> Result<RegexElement, Error> {
        assert_eq!(self.char(), '[');
        let start = self.pos();

        let mut union = vec![];
        if !self.bump() {
            return Err(Error::malformed(start, ERR_CLASS_UNCLOSED));
        }
        // Determine whether the class is negated or not.
        let negate = if self.char() != '^' {
            false
        } else {
            if !self.bump() {
                return Err(Error::malformed(
                    start,
                    ERR_CLASS_UNCLOSED_AFTER_NEGATION,
                ));
            }
            true
        };
        // Accept any number of `-` as literal `-`.
        while self.char() == '-' {
            union.push(ClassItem::Range('-', '-'));
            if !self.bump() {
                return Err(Error::malformed(
                    start,
                    ERR_CLASS_UNCLOSED_AFTER_DASH,
                ));
            }
        }
        // If `]` is the *first* char in a set, then interpret it as a literal
        // `]`. That is, an empty class is impossible to write.
        if union.is_empty() && self.char() == ']' {
            union.push(ClassItem::Range(']', ']'));
            if !self.bump() {
                return Err(Error::malformed(
                    start,
                    ERR_CLASS_UNCLOSED_AFTER_CLOSING,
                ));
            }
        }
        loop {
            if self.is_done() {
                return Err(Error::malformed(start, ERR_CLASS_UNCLOSED));
            }
            match self.char() {
                '[' => {
                    // Attempt to treat this as the beginning of a POSIX class.
                    // If POSIX class parsing fails, then the parser backs up
                    // to `[`.
                    if let Some(set) = self.maybe_parse_posix_class() {
                        union.push(ClassItem::Set(set));
                        continue;
                    }
                    // ... otherwise we don't support nested classes.
                    self.bump();
                    return Err(self.unsupported(self.pos() - 1));
                }
                ']' => {
                    self.bump();
                    return self.build_class(start, union, negate);
                }
                '&' | '-' | '~' if self.peek() == Some(self.char()) => {
                    let op = self.pos();
                    self.bump();
                    self.bump();
                    return Err(self.unsupported(op));
                }
                _ => self.parse_class_range(start, &mut union)?,
            }
        }
    }

    /// Resolve the items of a bracketed class against the universe.
    fn build_class(
        &self,
        start: usize,
        union: Vec<ClassItem>,
        negate: bool,
    ) -> Result<RegexElement, Error> {
        let mut set = CharsBitSet::builder(self.config.universe);
        for item in union.iter() {
            let added = match *item {
                ClassItem::Range(lo, hi) => set.add_range(lo, hi),
                ClassItem::Set(ref other) => set.add_set(other),
            };
            if added.is_err() {
                return Err(self.unsupported(start));
            }
        }
        // Case folding must happen before negation! Otherwise `(?i)[^x]`
        // would still allow `X`.
        if self.flags().case_insensitive {
            set = self.case_fold(&set);
        }
        self.hir_class(start, set, negate)
    }

    /// Parse a single primitive item in a character class set. The item to
    /// be parsed can either be one of a simple literal character, a range
    /// between two simple literal characters or a "primitive" character
    /// class like `\w`.
    ///
    /// If an invalid escape is found, or if a character class is found where
    /// a simple literal is expected (e.g., in a range), then an error is
    /// returned.
    fn parse_class_range(
        &self,
        start: usize,
        union: &mut Vec<ClassItem>,
    ) -> Result<(), Error> {
        let item_start = self.pos();
        let prim1 = self.parse_class_item()?;
        if self.is_done() {
            return Err(Error::malformed(start, ERR_CLASS_UNCLOSED_AFTER_ITEM));
        }
        // If the next char isn't a `-`, then we don't have a range. If the
        // char after a `-` is a `]`, then `-` is interpreted as a literal `-`
        // and will be picked up by the next call. A `--` is a difference
        // operation, which the caller rejects.
        if self.char() != '-'
            || self.peek() == Some(']')
            || self.peek() == Some('-')
        {
            union.push(into_class_item(item_start, prim1)?);
            return Ok(());
        }
        // OK, now we're parsing a range, so bump past the `-` and parse the
        // second half of the range.
        if !self.bump() {
            return Err(Error::malformed(start, ERR_CLASS_UNCLOSED_AFTER_DASH));
        }
        let prim2 = self.parse_class_item()?;
        let lo = into_class_item_range(item_start, prim1)?;
        let hi = into_class_item_range(item_start, prim2)?;
        if lo > hi {
            return Err(Error::malformed(item_start, ERR_CLASS_INVALID_RANGE));
        }
        union.push(ClassItem::Range(lo, hi));
        Ok(())
    }

    /// Parse a single item in a character class as a primitive, where the
    /// primitive either consists of a verbatim literal or a single escape
    /// sequence.
    ///
    /// Note that it is the caller's responsibility to report an error if an
    /// illegal primitive was parsed.
    fn parse_class_item(&self) -> Result<RegexElement, Error> {
        let start = self.pos();
        let ch = self.char();
        self.bump();
        if ch == '\\' {
            self.parse_escape(start)
        } else {
            Ok(RegexElement::Literal(ch.to_string()))
        }
    }

    /// Attempt to parse a POSIX character class, e.g., `[:alnum:]`.
    ///
    /// This assumes the parser is positioned at the opening `[`.
    ///
    /// If no valid POSIX character class could be found, then this does not
    /// advance the parser and `None` is returned. Otherwise, the parser is
    /// advanced to the first byte following the closing `]` and the
    /// effective set of the POSIX class is returned.
    fn maybe_parse_posix_class(&self) -> Option<CharsBitSet> {
        // A misspelled class like `[[:loower:]]` is not an error here. It
        // falls through to the nested class check in the caller.
        assert_eq!(self.char(), '[');

        // If parsing fails, then we back up the parser to this starting point.
        let start_pos = self.pos();
        let start_char = self.char.get();
        let reset = || {
            self.pos.set(start_pos);
            self.char.set(start_char);
        };

        let mut negated = false;
        if !self.bump() || self.char() != ':' {
            reset();
            return None;
        }
        if !self.bump() {
            reset();
            return None;
        }
        if self.char() == '^' {
            negated = true;
            if !self.bump() {
                reset();
                return None;
            }
        }
        let name_start = self.pos();
        while self.char() != ':' && self.bump() {}
        if self.is_done() {
            reset();
            return None;
        }
        let name = &self.pattern()[name_start..self.pos()];
        if !self.bump_if(":]") {
            reset();
            return None;
        }
        if let Some(table) = posix_class(name) {
            let set = self.table_set(table);
            return Some(if negated { set.complement() } else { set });
        }
        reset();
        None
    }

    /// Parse a Perl character class, e.g., `\d` or `\W`. This assumes the
    /// parser is currently at a valid character class name and will be
    /// advanced to the character immediately following the class.
    fn parse_perl_class(&self, start: usize) -> Result<RegexElement, Error> {
        let ch = self.char();
        self.bump();
        let class = match ch {
            'd' | 'D' => r"\d",
            's' | 'S' => r"\s",
            'w' | 'W' => r"\w",
            unk => unreachable!("invalid Perl class \\{}", unk),
        };
        let set = match self.host_class(class) {
            Some(set) => set,
            None => return Err(self.unsupported(start)),
        };
        self.hir_class(start, set, ch.is_ascii_uppercase())
    }

    /// Build a frozen set of every character in the given table that also
    /// belongs to the working universe.
    fn table_set(&self, table: &[(u8, u8)]) -> CharsBitSet {
        let universe = self.config.universe;
        let mut set = CharsBitSet::builder(universe);
        for &(lo, hi) in table.iter() {
            for byte in lo..=hi {
                let ch = char::from(byte);
                if universe.contains(ch) {
                    // OK because the builder is mutable and `ch` is in the
                    // universe.
                    set.add(ch).unwrap();
                }
            }
        }
        set.freeze()
    }

    /// Resolve a Perl or property class, e.g., `\w` or `\p{Greek}`, exactly
    /// as the host engine would, keeping only the members that belong to
    /// the working universe. Returns `None` if the host does not know the
    /// class.
    fn host_class(&self, class: &str) -> Option<CharsBitSet> {
        let hir = regex_syntax::ParserBuilder::new()
            .case_insensitive(self.flags().case_insensitive)
            .build()
            .parse(class)
            .ok()?;
        let cls = match *hir.kind() {
            HirKind::Class(Class::Unicode(ref cls)) => cls.clone(),
            // Classes with a single member come back as literals.
            HirKind::Literal(Literal(ref bytes)) => {
                let text = core::str::from_utf8(bytes).ok()?;
                ClassUnicode::new(
                    text.chars().map(|ch| ClassUnicodeRange::new(ch, ch)),
                )
            }
            _ => return None,
        };
        Some(self.clip(&cls))
    }

    /// Add every simple case folding of every member of the given set, as
    /// the host engine does under `(?i)`, as long as it belongs to the
    /// universe.
    fn case_fold(&self, set: &CharsBitSet) -> CharsBitSet {
        let mut cls = ClassUnicode::new(
            set.iter().map(|ch| ClassUnicodeRange::new(ch, ch)),
        );
        cls.case_fold_simple();
        self.clip(&cls)
    }

    /// The members of a host class that belong to the working universe.
    fn clip(&self, cls: &ClassUnicode) -> CharsBitSet {
        let universe = self.config.universe;
        let mut set = CharsBitSet::builder(universe);
        for range in cls.ranges() {
            let lo = range.start().max(universe.start());
            let hi = range.end().min(universe.end());
            if lo <= hi {
                // OK because both ends were clamped to the universe.
                set.add_range(lo, hi).unwrap();
            }
        }
        set.freeze()
    }

    /// Build a class element, rejecting classes that cannot produce any
    /// character.
    fn hir_class(
        &self,
        start: usize,
        set: CharsBitSet,
        negated: bool,
    ) -> Result<RegexElement, Error> {
        let class = CharClass::new(set, negated);
        if class.effective().is_empty() {
            return Err(self.unsupported(start));
        }
        Ok(RegexElement::Class(class))
    }

    /// The class for `.`, which is written as the negation of the set of
    /// characters it may not produce.
    fn hir_dot(&self) -> RegexElement {
        let universe = self.config.universe;
        let mut set = CharsBitSet::builder(universe);
        if !self.flags().dot_matches_new_line && universe.contains('\n') {
            // OK because the builder is mutable and '\n' is in the universe.
            set.add('\n').unwrap();
        }
        RegexElement::Class(CharClass::new(set, true))
    }

    /// A single literal character. Under `(?i)`, a character with another
    /// case in the universe becomes a class of all its cases.
    fn hir_char(&self, ch: char) -> RegexElement {
        if self.flags().case_insensitive {
            let mut cls = ClassUnicode::new([ClassUnicodeRange::new(ch, ch)]);
            cls.case_fold_simple();
            let set = self.clip(&cls);
            if set.len() > 1 {
                return RegexElement::Class(CharClass::new(set, false));
            }
        }
        RegexElement::Literal(ch.to_string())
    }
}

/// This checks the depth of the given tree, and if it exceeds the given
/// limit, then an error is returned.
fn check_nesting(ast: &RegexElement, limit: u32) -> Result<(), Error> {
    fn recurse(
        el: &RegexElement,
        limit: u32,
        depth: u32,
    ) -> Result<(), Error> {
        if depth > limit {
            return Err(Error::malformed(0, ERR_TOO_MUCH_NESTING));
        }
        let Some(next_depth) = depth.checked_add(1) else {
            return Err(Error::malformed(0, ERR_TOO_MUCH_NESTING));
        };
        for sub in el.subs().iter() {
            recurse(sub, limit, next_depth)?;
        }
        Ok(())
    }
    recurse(ast, limit, 0)
}

/// Converts the given element to a literal char if it is just a single
/// character. Otherwise this returns an error.
///
/// This is useful in contexts where you can only accept a single character,
/// but where it is convenient to parse something more general. For example,
/// parsing a single part of a character class range.
fn into_class_item_range(
    position: usize,
    el: RegexElement,
) -> Result<char, Error> {
    if let RegexElement::Literal(ref lit) = el {
        let mut chars = lit.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Ok(ch);
        }
    }
    Err(Error::malformed(position, ERR_CLASS_INVALID_RANGE_ITEM))
}

fn into_class_item(
    position: usize,
    el: RegexElement,
) -> Result<ClassItem, Error> {
    match el {
        RegexElement::Class(ref class) => {
            Ok(ClassItem::Set(class.effective().clone()))
        }
        RegexElement::Literal(_) => {
            let ch = into_class_item_range(position, el)?;
            Ok(ClassItem::Range(ch, ch))
        }
        _ => Err(Error::malformed(position, ERR_CLASS_INVALID_ITEM)),
    }
}

/// Returns the ASCII ranges of the given named POSIX character class, or
/// `None` if there is no such class.
fn posix_class(kind: &str) -> Option<&'static [(u8, u8)]> {
    let slice: &'static [(u8, u8)] = match kind {
        "alnum" => &[(b'0', b'9'), (b'A', b'Z'), (b'a', b'z')],
        "alpha" => &[(b'A', b'Z'), (b'a', b'z')],
        "ascii" => &[(b'\x00', b'\x7F')],
        "blank" => &[(b'\t', b'\t'), (b' ', b' ')],
        "cntrl" => &[(b'\x00', b'\x1F'), (b'\x7F', b'\x7F')],
        "digit" => &[(b'0', b'9')],
        "graph" => &[(b'!', b'~')],
        "lower" => &[(b'a', b'z')],
        "print" => &[(b' ', b'~')],
        "punct" => &[(b'!', b'/'), (b':', b'@'), (b'[', b'`'), (b'{', b'~')],
        "space" => &[
            (b'\t', b'\t'),
            (b'\n', b'\n'),
            (b'\x0B', b'\x0B'),
            (b'\x0C', b'\x0C'),
            (b'\r', b'\r'),
            (b' ', b' '),
        ],
        "upper" => &[(b'A', b'Z')],
        "word" => &[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')],
        "xdigit" => &[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')],
        _ => return None,
    };
    Some(slice)
}

/// Returns true if the given character is a hexadecimal digit.
fn is_hex(c: char) -> bool {
    ('0' <= c && c <= '9') || ('a' <= c && c <= 'f') || ('A' <= c && c <= 'F')
}

/// Returns true if the given character is a valid in a capture group name.
///
/// If `first` is true, then `c` is treated as the first character in the
/// group name (which must be alphabetic or underscore).
fn is_capture_char(c: char, first: bool) -> bool {
    if first {
        c == '_' || c.is_alphabetic()
    } else {
        c == '_' || c == '.' || c == '[' || c == ']' || c.is_alphanumeric()
    }
}

#[cfg(test)]
mod tests {
    use crate::{charset::Universe, error::ErrorKind};

    use super::*;

    fn p(pattern: &str) -> RegexElement {
        Parser::new(ParserConfig::default(), pattern).parse().unwrap()
    }

    fn perr(pattern: &str) -> Error {
        Parser::new(ParserConfig::default(), pattern).parse().unwrap_err()
    }

    fn reason(pattern: &str) -> &'static str {
        match *perr(pattern).kind() {
            ErrorKind::MalformedPattern { reason, .. } => reason,
            ref kind => panic!("expected malformed pattern, got {:?}", kind),
        }
    }

    fn token(pattern: &str) -> (usize, String) {
        match *perr(pattern).kind() {
            ErrorKind::UnsupportedConstruct { position, ref token } => {
                (position, token.clone())
            }
            ref kind => {
                panic!("expected unsupported construct, got {:?}", kind)
            }
        }
    }

    fn lit(s: &str) -> RegexElement {
        RegexElement::Literal(s.to_string())
    }

    fn class(chars: &str) -> RegexElement {
        let set = CharsBitSet::from_literal(Universe::ASCII, chars).unwrap();
        RegexElement::Class(CharClass::new(set, false))
    }

    fn rep(min: u32, max: Option<u32>, sub: RegexElement) -> RegexElement {
        RegexElement::Quantifier(Quantifier {
            min,
            max,
            greedy: true,
            sub: Box::new(sub),
        })
    }

    fn cap(index: u32, sub: RegexElement) -> RegexElement {
        RegexElement::CaptureGroup(CaptureGroup {
            index,
            name: None,
            sub: Box::new(sub),
        })
    }

    fn effective(el: &RegexElement) -> String {
        match *el {
            RegexElement::Class(ref class) => class.effective().to_string(),
            ref el => panic!("expected class, got {:?}", el),
        }
    }

    #[test]
    fn ok_literal() {
        assert_eq!(p("a"), lit("a"));
        assert_eq!(p("ab"), lit("ab"));
        assert_eq!(p("💩"), lit("💩"));
        assert_eq!(p(""), RegexElement::empty());
    }

    #[test]
    fn ok_meta_escapes() {
        assert_eq!(p(r"\*"), lit("*"));
        assert_eq!(p(r"\+"), lit("+"));
        assert_eq!(p(r"\?"), lit("?"));
        assert_eq!(p(r"\|"), lit("|"));
        assert_eq!(p(r"\("), lit("("));
        assert_eq!(p(r"\)"), lit(")"));
        assert_eq!(p(r"\^"), lit("^"));
        assert_eq!(p(r"\$"), lit("$"));
        assert_eq!(p(r"\["), lit("["));
        assert_eq!(p(r"\]"), lit("]"));
        assert_eq!(p(r"\/\.\-"), lit("/.-"));
    }

    #[test]
    fn ok_special_escapes() {
        assert_eq!(p(r"\a"), lit("\x07"));
        assert_eq!(p(r"\f"), lit("\x0C"));
        assert_eq!(p(r"\t"), lit("\t"));
        assert_eq!(p(r"\n"), lit("\n"));
        assert_eq!(p(r"\r"), lit("\r"));
        assert_eq!(p(r"\v"), lit("\x0B"));
        assert_eq!(p(r"\A"), RegexElement::Anchor(Anchor::Start));
        assert_eq!(p(r"\z"), RegexElement::Anchor(Anchor::End));
        assert_eq!(p(r"\b"), RegexElement::Anchor(Anchor::WordBoundary));
        assert_eq!(p(r"\B"), RegexElement::Anchor(Anchor::NotWordBoundary));
    }

    #[test]
    fn ok_hex() {
        assert_eq!(p(r"\x41"), lit("A"));
        assert_eq!(p(r"\u2603"), lit("☃"));
        assert_eq!(p(r"\U0001F4A9"), lit("💩"));
        assert_eq!(p(r"\x{1F4A9}"), lit("💩"));
        assert_eq!(p(r"\u{1F4A9}"), lit("💩"));
    }

    #[test]
    fn ok_perl() {
        assert_eq!(effective(&p(r"\d")), "0123456789");
        assert_eq!(effective(&p(r"\s")), r"\x09\x0A\x0B\x0C\x0D ");
        assert_eq!(effective(&p(r"\w")).len(), 63);
        assert_eq!(effective(&p(r"\w")).chars().last(), Some('z'));

        let digits = p(r"\D");
        match digits {
            RegexElement::Class(ref class) => {
                assert!(class.is_negated());
                assert_eq!(118, class.effective().len());
                assert!(!class.effective().contains('5'));
            }
            ref el => panic!("expected class, got {:?}", el),
        }
    }

    #[test]
    fn ok_property() {
        assert_eq!(effective(&p(r"\p{Lu}")), "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(effective(&p(r"\pN")), "0123456789");
        assert_eq!(
            effective(&p(r"\p{Punctuation}")),
            r##"!"#%&'()*,-./:;?@[\]_{}"##,
        );
        match p(r"\P{L}") {
            RegexElement::Class(ref class) => {
                assert_eq!(128 - 52, class.effective().len());
            }
            ref el => panic!("expected class, got {:?}", el),
        }
    }

    #[test]
    fn ok_class() {
        assert_eq!(effective(&p("[a-c]")), "abc");
        assert_eq!(effective(&p("[a-c1]")), "1abc");
        assert_eq!(effective(&p("[-a]")), "-a");
        assert_eq!(effective(&p("[a-]")), "-a");
        assert_eq!(effective(&p("[]a]")), "]a");
        assert_eq!(effective(&p(r"[\d.]")), ".0123456789");
        assert_eq!(effective(&p("[[:xdigit:]]")), "0123456789ABCDEFabcdef");
        assert_eq!(effective(&p("[^\x00-\x60\x62-\x7F]")), "a");
        assert_eq!(p("[abc]"), class("abc"));
    }

    #[test]
    fn ok_dot() {
        let dot = effective(&p("."));
        assert!(!dot.contains(r"\x0A"));
        match p("(?s).") {
            RegexElement::Class(ref class) => {
                assert_eq!(128, class.effective().len());
            }
            ref el => panic!("expected class, got {:?}", el),
        }
    }

    #[test]
    fn ok_flags() {
        assert_eq!(p("(?i)a"), class("aA"));
        assert_eq!(p("(?i:a)b"), RegexElement::sequence(vec![
            class("aA"),
            lit("b"),
        ]));
        assert_eq!(effective(&p("(?i)[a-c]")), "ABCabc");
        assert_eq!(p("(?i)1"), lit("1"));
        assert_eq!(p("(?m)^a$"), RegexElement::sequence(vec![
            RegexElement::Anchor(Anchor::Start),
            lit("a"),
            RegexElement::Anchor(Anchor::End),
        ]));
        match p("(?U)a*") {
            RegexElement::Quantifier(ref q) => assert!(!q.greedy),
            ref el => panic!("expected quantifier, got {:?}", el),
        }
    }

    #[test]
    fn ok_repetition() {
        assert_eq!(p("a?"), rep(0, Some(1), lit("a")));
        assert_eq!(p("a*"), rep(0, None, lit("a")));
        assert_eq!(p("a+"), rep(1, None, lit("a")));
        assert_eq!(p("a{2}"), rep(2, Some(2), lit("a")));
        assert_eq!(p("a{2,}"), rep(2, None, lit("a")));
        assert_eq!(p("a{2,5}"), rep(2, Some(5), lit("a")));
        assert_eq!(p("a{0,0}"), rep(0, Some(0), lit("a")));
        assert_eq!(
            p("ab+"),
            RegexElement::sequence(vec![lit("a"), rep(1, None, lit("b"))]),
        );
        match p("a+?") {
            RegexElement::Quantifier(ref q) => assert!(!q.greedy),
            ref el => panic!("expected quantifier, got {:?}", el),
        }
    }

    #[test]
    fn ok_group() {
        assert_eq!(p("(a)"), cap(1, lit("a")));
        assert_eq!(p("(?:a)"), lit("a"));
        assert_eq!(p("()"), cap(1, RegexElement::empty()));
        assert_eq!(
            p("(a)|(b)"),
            RegexElement::Alternation(vec![
                cap(1, lit("a")),
                cap(2, lit("b")),
            ]),
        );
        assert_eq!(
            p("(?<year>a)"),
            RegexElement::CaptureGroup(CaptureGroup {
                index: 1,
                name: Some(Box::from("year")),
                sub: Box::new(lit("a")),
            }),
        );
    }

    #[test]
    fn ok_backreference() {
        assert_eq!(
            p(r"(a)\1"),
            RegexElement::sequence(vec![
                cap(1, lit("a")),
                RegexElement::Backreference(1),
            ]),
        );
        assert_eq!(
            p(r"(a)\10"),
            RegexElement::sequence(vec![
                cap(1, lit("a")),
                RegexElement::Backreference(1),
                lit("0"),
            ]),
        );
    }

    #[test]
    fn err_malformed() {
        assert_eq!(reason("(abc"), ERR_UNCLOSED_GROUP);
        assert_eq!(perr("(abc").position(), Some(0));
        assert_eq!(reason("abc)"), ERR_UNOPENED_GROUP);
        assert_eq!(reason("a{3,2}"), ERR_COUNTED_REP_INVALID_RANGE);
        assert_eq!(reason("a{"), ERR_COUNTED_REP_UNCLOSED);
        assert_eq!(reason("a{x}"), ERR_DECIMAL_NO_DIGITS);
        assert_eq!(reason("*"), ERR_UNCOUNTED_REP_SUB_MISSING);
        assert_eq!(reason("{2}"), ERR_COUNTED_REP_SUB_MISSING);
        assert_eq!(reason("[a"), ERR_CLASS_UNCLOSED_AFTER_ITEM);
        assert_eq!(reason("[z-a]"), ERR_CLASS_INVALID_RANGE);
        assert_eq!(reason(r"[\d-z]"), ERR_CLASS_INVALID_RANGE_ITEM);
        assert_eq!(reason(r"\"), ERR_ESCAPE_UNEXPECTED_EOF);
        assert_eq!(reason(r"\e"), ERR_ESCAPE_UNRECOGNIZED);
        assert_eq!(reason(r"\xZZ"), ERR_HEX_FIXED_INVALID_DIGIT);
        assert_eq!(reason("(?)"), ERR_EMPTY_FLAGS);
        assert_eq!(reason("(?i-)"), ERR_FLAG_DANGLING_NEGATION);
        assert_eq!(reason("(?ii)"), ERR_FLAG_DUPLICATE);
        assert_eq!(reason("(?<a>x)(?<a>y)"), ERR_DUPLICATE_CAPTURE_NAME);
        assert_eq!(reason("(?<>x)"), ERR_EMPTY_GROUP_NAME);
        assert_eq!(reason(r"\p{L"), ERR_UNICODE_CLASS_UNCLOSED);
    }

    #[test]
    fn err_unsupported() {
        assert_eq!(token("(?=abc)"), (0, "(?=".to_string()));
        assert_eq!(token("a(?!b)"), (1, "(?!".to_string()));
        assert_eq!(token("(?<=a)b"), (0, "(?<=".to_string()));
        assert_eq!(token("(?<!a)b"), (0, "(?<!".to_string()));
        assert_eq!(token("(?>a)"), (0, "(?>".to_string()));
        assert_eq!(token("(?x)a b"), (2, "x".to_string()));
        assert_eq!(token("a*+"), (1, "*+".to_string()));
        assert_eq!(token(r"\0"), (0, r"\0".to_string()));
        assert_eq!(token(r"a\cM"), (1, r"\cM".to_string()));
        assert_eq!(token(r"\p{Bogus}"), (0, r"\p{Bogus}".to_string()));
        // Known to the host, but with no members in ASCII.
        assert_eq!(token(r"\p{Greek}"), (0, r"\p{Greek}".to_string()));
        assert_eq!(token("[a&&b]"), (2, "&&".to_string()));
        assert_eq!(token("[a-z--m]"), (4, "--".to_string()));
        assert_eq!(token("[a~~b]"), (2, "~~".to_string()));
        assert_eq!(token("[a[b]]"), (2, "[".to_string()));
        assert_eq!(token("[é]"), (0, "[é]".to_string()));
        assert_eq!(token("[\x00-\x7F&&[b]]").1, "&&");
    }

    #[test]
    fn err_empty_class() {
        assert_eq!(token(r"[^\x00-\x7F]"), (0, r"[^\x00-\x7F]".to_string()));
        assert_eq!(token(r"x[^\s\S]"), (1, r"[^\s\S]".to_string()));
    }

    #[test]
    fn err_dangling_backreference() {
        let err = perr(r"(a)\2");
        assert_eq!(
            &ErrorKind::DanglingBackreference { position: 3, index: 2 },
            err.kind(),
        );
        // Forward references and references into an enclosing group are
        // both dangling.
        assert!(matches!(
            perr(r"\1(a)").kind(),
            ErrorKind::DanglingBackreference { position: 0, index: 1 },
        ));
        assert!(matches!(
            perr(r"(a\1)").kind(),
            ErrorKind::DanglingBackreference { position: 2, index: 1 },
        ));
    }

    #[test]
    fn err_nesting() {
        let config = ParserConfig::new().nest_limit(3);
        assert!(Parser::new(config, "((a))").parse().is_ok());
        let err = Parser::new(config, "((((((a))))))").parse().unwrap_err();
        assert!(err.is_parse_error());
        let err = Parser::new(config, "a*****").parse().unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn classes_follow_the_host_in_wider_universes() {
        let parse = |universe, pattern| {
            let config = ParserConfig::new().universe(universe);
            Parser::new(config, pattern).parse().unwrap()
        };
        let class = |el: &RegexElement| match *el {
            RegexElement::Class(ref class) => class.effective().clone(),
            ref el => panic!("expected class, got {:?}", el),
        };

        let word = class(&parse(Universe::LATIN1, r"\w"));
        assert!(word.contains('é'));
        assert!(word.contains('ª'));
        assert!(!word.contains('÷'));
        let not_word = class(&parse(Universe::LATIN1, r"\W"));
        assert!(!not_word.contains('é'));
        assert!(not_word.contains('÷'));

        let space = class(&parse(Universe::LATIN1, r"\s"));
        assert!(space.contains('\u{85}'));
        assert!(space.contains('\u{A0}'));

        let not_digit = class(&parse(Universe::BMP, r"\D"));
        assert!(!not_digit.contains('٣'));
        assert!(not_digit.contains('²'));

        let greek = class(&parse(Universe::BMP, r"\p{Greek}"));
        assert!(greek.contains('α'));
        assert!(!greek.contains('a'));
        let not_letter = class(&parse(Universe::BMP, r"\P{L}"));
        assert!(!not_letter.contains('ж'));

        // Case folding uses the host's simple folding, not just ASCII.
        let folded = class(&parse(Universe::LATIN1, "(?i)é"));
        assert_eq!("Éé", folded.to_string());
        let folded = class(&parse(Universe::BMP, "(?i)k"));
        assert_eq!("Kk\u{212A}", folded.iter().collect::<String>());
        let not_e = class(&parse(Universe::LATIN1, "(?i)[^é]"));
        assert!(!not_e.contains('É'));
    }

    #[test]
    fn universe_restricts_classes() {
        let config =
            ParserConfig::new().universe(Universe::new('a', 'z').unwrap());
        let ast = Parser::new(config, r"\w").parse().unwrap();
        assert_eq!(26, effective(&ast).len());
        let err = Parser::new(config, r"\d").parse().unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedConstruct { position: 0, .. },
        ));
        let ast = Parser::new(config, "(?i)a").parse().unwrap();
        assert_eq!(lit("a"), ast);
    }
}
