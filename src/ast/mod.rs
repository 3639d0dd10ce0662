/*!
The abstract syntax tree produced by parsing a pattern.

A [`RegexElement`] is immutable once the parser hands it back. Character
classes are fully resolved into [`CharsBitSet`]s at parse time, capture
groups carry the index assigned to them in left-to-right order of their
opening parenthesis, and every backreference is known to refer to a group
that was closed before it.
*/

use crate::{
    charset::{CharsBitSet, Universe},
    error::Error,
};

mod parse;
mod print;

/// Returns true if the given character has significance in a regex.
///
/// These are the characters that the printer escapes when writing literals.
fn is_meta_character(c: char) -> bool {
    match c {
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{'
        | '}' | '^' | '$' | '#' | '&' | '-' | '~' => true,
        _ => false,
    }
}

/// Returns true if the given character can be escaped in a regex.
///
/// This is every meta character plus every other ASCII character that is
/// neither a letter nor a digit. So `\%` and `\/` are accepted as a literal
/// `%` and `/`, while `\e` is not.
fn is_escapeable_character(c: char) -> bool {
    if is_meta_character(c) {
        return true;
    }
    if !c.is_ascii() {
        return false;
    }
    match c {
        '0'..='9' | 'A'..='Z' | 'a'..='z' => false,
        '<' | '>' => false,
        _ => true,
    }
}

/// Parse the given pattern with a default configuration.
///
/// This is a convenience for `ParserConfig::new().parse(pattern)`.
pub fn parse(pattern: &str) -> Result<RegexElement, Error> {
    ParserConfig::new().parse(pattern)
}

/// The configuration for the pattern parser.
///
/// The most important knob is the working [`Universe`]: every character
/// class is resolved relative to it, and the confounder complements classes
/// within it.
#[derive(Clone, Copy, Debug)]
pub struct ParserConfig {
    pub(crate) universe: Universe,
    /// The maximum number of times we're allowed to recurse.
    ///
    /// The parser, the generator and the confounder all recurse over the
    /// tree, so this bounds the stack usage of all three.
    pub(crate) nest_limit: u32,
    pub(crate) flags: Flags,
}

impl Default for ParserConfig {
    fn default() -> ParserConfig {
        ParserConfig {
            universe: Universe::ASCII,
            nest_limit: 50,
            flags: Flags::default(),
        }
    }
}

impl ParserConfig {
    /// Create a new configuration with the ASCII universe, a nest limit of
    /// `50` and all flags disabled.
    pub fn new() -> ParserConfig {
        ParserConfig::default()
    }

    /// Set the universe that character classes are resolved in.
    pub fn universe(mut self, universe: Universe) -> ParserConfig {
        self.universe = universe;
        self
    }

    /// Set the nesting limit of the parser.
    pub fn nest_limit(mut self, limit: u32) -> ParserConfig {
        self.nest_limit = limit;
        self
    }

    /// Enable the `i` flag for the whole pattern. Only ASCII letters are
    /// case folded.
    pub fn case_insensitive(mut self, yes: bool) -> ParserConfig {
        self.flags.case_insensitive = yes;
        self
    }

    /// Enable the `s` flag for the whole pattern, so that `.` may produce
    /// `\n`.
    pub fn dot_matches_new_line(mut self, yes: bool) -> ParserConfig {
        self.flags.dot_matches_new_line = yes;
        self
    }

    /// Parse the given pattern into an AST.
    pub fn parse(&self, pattern: &str) -> Result<RegexElement, Error> {
        let ast = parse::Parser::new(*self, pattern).parse()?;
        trace!("parsed /{}/ into {:?}", pattern, ast);
        Ok(ast)
    }
}

/// Flags that control the interpretation of a pattern. They can be set via
/// [`ParserConfig`] or changed during parsing via inline flags, e.g.,
/// `a(?i:b)c` or `(?s).`.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Flags {
    /// The `i` flag.
    pub(crate) case_insensitive: bool,
    /// The `m` flag. Anchors never produce text, so this is only tracked so
    /// that the flag is accepted.
    pub(crate) multi_line: bool,
    /// The `s` flag.
    pub(crate) dot_matches_new_line: bool,
    /// The `U` flag.
    pub(crate) swap_greed: bool,
}

/// A node in the abstract syntax tree of a pattern.
///
/// This is a closed set of variants. The parser, the generator, the
/// confounder and the printer all match on it exhaustively.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegexElement {
    /// Exact text.
    Literal(String),
    /// A single character drawn from a set.
    Class(CharClass),
    /// A zero-width assertion.
    Anchor(Anchor),
    /// A concatenation. The empty sequence matches the empty string.
    Sequence(Vec<RegexElement>),
    /// A choice between two or more branches.
    Alternation(Vec<RegexElement>),
    /// A repetition of a sub-expression.
    Quantifier(Quantifier),
    /// A capturing group.
    CaptureGroup(CaptureGroup),
    /// A reference to the text produced by an earlier capturing group.
    Backreference(u32),
}

impl RegexElement {
    /// The empty expression.
    pub fn empty() -> RegexElement {
        RegexElement::Sequence(vec![])
    }

    /// Build a concatenation. Adjacent literals are merged, nested sequences
    /// are flattened and a concatenation of exactly one expression is that
    /// expression.
    pub fn sequence(subs: Vec<RegexElement>) -> RegexElement {
        let mut flat: Vec<RegexElement> = Vec::with_capacity(subs.len());
        for sub in subs {
            match sub {
                RegexElement::Sequence(inner) => {
                    for el in inner {
                        push_merging(&mut flat, el);
                    }
                }
                sub => push_merging(&mut flat, sub),
            }
        }
        if flat.len() == 1 {
            // OK because we just checked the length.
            flat.pop().unwrap()
        } else {
            RegexElement::Sequence(flat)
        }
    }

    /// Build an alternation. An alternation of exactly one branch is that
    /// branch.
    pub fn alternation(mut subs: Vec<RegexElement>) -> RegexElement {
        if subs.len() == 1 {
            subs.pop().unwrap()
        } else {
            RegexElement::Alternation(subs)
        }
    }

    /// Returns the direct children of this node.
    pub fn subs(&self) -> &[RegexElement] {
        use core::slice::from_ref;

        match *self {
            RegexElement::Literal(_)
            | RegexElement::Class(_)
            | RegexElement::Anchor(_)
            | RegexElement::Backreference(_) => &[],
            RegexElement::Sequence(ref subs)
            | RegexElement::Alternation(ref subs) => subs,
            RegexElement::Quantifier(Quantifier { ref sub, .. }) => {
                from_ref(sub)
            }
            RegexElement::CaptureGroup(CaptureGroup { ref sub, .. }) => {
                from_ref(sub)
            }
        }
    }

    /// Walk this tree in pre-order, calling `visit` with the depth of each
    /// node (the receiver has depth `0`) and the node itself.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(usize, &RegexElement),
    {
        let mut stack = vec![(0, self)];
        while let Some((depth, el)) = stack.pop() {
            visit(depth, el);
            for sub in el.subs().iter().rev() {
                stack.push((depth + 1, sub));
            }
        }
    }

    /// Returns every capture group in this tree, ordered by index.
    pub fn capture_groups(&self) -> Vec<&CaptureGroup> {
        let mut groups = vec![];
        let mut stack = vec![self];
        // Pre-order visits groups in order of their opening parenthesis,
        // which is exactly the order of their indices.
        while let Some(el) = stack.pop() {
            if let RegexElement::CaptureGroup(ref group) = *el {
                groups.push(group);
            }
            stack.extend(el.subs().iter().rev());
        }
        groups
    }

    /// Render this tree as an indented outline, one node per line. This is
    /// useful for debugging why a pattern generates what it does.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.traverse(|depth, el| {
            for _ in 0..depth {
                out.push_str("  ");
            }
            out.push_str(&print::describe(el));
            out.push('\n');
        });
        out
    }
}

fn push_merging(flat: &mut Vec<RegexElement>, el: RegexElement) {
    if let RegexElement::Literal(ref next) = el {
        if let Some(RegexElement::Literal(ref mut prev)) = flat.last_mut() {
            prev.push_str(next);
            return;
        }
    }
    flat.push(el);
}

/// A character class resolved against the parser's working universe.
///
/// The set as written and its negation flag are kept so that the class can
/// be printed and confounded. The effective set, i.e., the set of
/// characters the class actually allows, is computed exactly once when the
/// class is built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CharClass {
    set: CharsBitSet,
    negated: bool,
    effective: CharsBitSet,
}

impl CharClass {
    /// Create a new class from the given set. When `negated` is true, the
    /// class allows every character of the set's universe that is *not* in
    /// `set`.
    pub fn new(set: CharsBitSet, negated: bool) -> CharClass {
        let effective =
            if negated { set.complement() } else { set.clone().freeze() };
        CharClass { set: set.freeze(), negated, effective }
    }

    /// The set as written in the pattern.
    pub fn set(&self) -> &CharsBitSet {
        &self.set
    }

    /// Whether the class was written negated, e.g., `[^a-z]`.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The set of characters this class allows.
    pub fn effective(&self) -> &CharsBitSet {
        &self.effective
    }

    /// Returns the class that allows exactly the characters this class does
    /// not.
    pub fn negate(&self) -> CharClass {
        CharClass::new(self.set.clone(), !self.negated)
    }
}

/// A zero-width assertion.
///
/// Anchors never contribute text when generating. Whether a generated string
/// actually satisfies them is left to the matcher.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Anchor {
    /// `^` or `\A`.
    Start,
    /// `$` or `\z`.
    End,
    /// `\b`.
    WordBoundary,
    /// `\B`.
    NotWordBoundary,
}

/// A repetition operator applied to a sub-expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Quantifier {
    /// The minimum number of repetitions.
    ///
    /// Note that `?`, `*` and `+` are translated into `{0,1}`, `{0,}` and
    /// `{1,}`, respectively.
    pub min: u32,
    /// The maximum number of repetitions, or `None` when unbounded.
    pub max: Option<u32>,
    /// Whether the operator was greedy. The generator ignores this; it is
    /// kept so that the tree can be printed faithfully.
    pub greedy: bool,
    /// The expression being repeated.
    pub sub: Box<RegexElement>,
}

/// A capturing group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaptureGroup {
    /// The index of the group. The first group has index `1`.
    pub index: u32,
    /// The name of the group, if it was written as `(?<name>...)`.
    pub name: Option<Box<str>>,
    /// The expression inside the group, which may be empty.
    pub sub: Box<RegexElement>,
}
