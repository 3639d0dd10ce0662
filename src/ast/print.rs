/*!
This module turns a [`RegexElement`] back into a pattern string.

Character classes are written out as their effective set, so `\d` prints as
`[0-9]` and `.` prints every allowed range. The printed pattern therefore
describes exactly what the generator draws from, which is what matters when
looking at a confounded tree.
*/

use core::fmt;

use crate::{
    ast::{is_meta_character, Anchor, CaptureGroup, Quantifier, RegexElement},
    charset::{write_display_char, CharsBitSet},
};

impl fmt::Display for RegexElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Writer { wtr: f }.write(self, false)
    }
}

/// A one line summary of a single node, not including its children.
pub(super) fn describe(el: &RegexElement) -> String {
    let mut out = String::new();
    Writer { wtr: &mut out }
        .write_summary(el)
        .expect("writing to a String never fails");
    out
}

struct Writer<W> {
    wtr: W,
}

impl<W: fmt::Write> Writer<W> {
    /// Write a summary of the given element without its children. Leaf
    /// elements are written out in full.
    fn write_summary(&mut self, el: &RegexElement) -> fmt::Result {
        match *el {
            RegexElement::Literal(_)
            | RegexElement::Class(_)
            | RegexElement::Anchor(_)
            | RegexElement::Backreference(_) => self.write(el, false),
            RegexElement::Sequence(ref subs) => {
                write!(self.wtr, "sequence ({} items)", subs.len())
            }
            RegexElement::Alternation(ref subs) => {
                write!(self.wtr, "alternation ({} branches)", subs.len())
            }
            RegexElement::Quantifier(ref q) => {
                self.wtr.write_str("repeat ")?;
                self.write_bounds(q)
            }
            RegexElement::CaptureGroup(CaptureGroup {
                index,
                ref name,
                ..
            }) => match *name {
                None => write!(self.wtr, "group {}", index),
                Some(ref name) => {
                    write!(self.wtr, "group {} <{}>", index, name)
                }
            },
        }
    }

    /// Write the given element. When `wrap` is true and the element would
    /// not bind tightly to a following repetition operator or neighbor, it
    /// is enclosed in a non-capturing group.
    fn write(&mut self, el: &RegexElement, wrap: bool) -> fmt::Result {
        match *el {
            RegexElement::Literal(ref lit) => {
                let wrap = wrap && lit.chars().count() != 1;
                self.open(wrap)?;
                for ch in lit.chars() {
                    self.write_literal_char(ch)?;
                }
                self.close(wrap)
            }
            RegexElement::Class(ref class) => {
                self.write_class(class.effective())
            }
            RegexElement::Anchor(anchor) => self.wtr.write_str(match anchor {
                Anchor::Start => "^",
                Anchor::End => "$",
                Anchor::WordBoundary => r"\b",
                Anchor::NotWordBoundary => r"\B",
            }),
            RegexElement::Sequence(ref subs) => {
                let wrap = wrap && subs.len() != 1;
                self.open(wrap)?;
                let mut after_backref = false;
                for sub in subs.iter() {
                    // `\1` followed by `0` would read back as `\10`.
                    if after_backref && starts_with_digit(sub) {
                        self.wtr.write_str("(?:")?;
                        self.write(sub, false)?;
                        self.wtr.write_str(")")?;
                    } else {
                        let needs =
                            matches!(*sub, RegexElement::Alternation(_));
                        self.write(sub, needs)?;
                    }
                    after_backref =
                        matches!(*sub, RegexElement::Backreference(_));
                }
                self.close(wrap)
            }
            RegexElement::Alternation(ref subs) => {
                self.open(wrap)?;
                for (i, sub) in subs.iter().enumerate() {
                    if i > 0 {
                        self.wtr.write_str("|")?;
                    }
                    self.write(sub, false)?;
                }
                self.close(wrap)
            }
            RegexElement::Quantifier(ref q) => {
                self.open(wrap)?;
                self.write(&q.sub, true)?;
                self.write_bounds(q)?;
                self.close(wrap)
            }
            RegexElement::CaptureGroup(ref group) => {
                match group.name {
                    None => self.wtr.write_str("(")?,
                    Some(ref name) => write!(self.wtr, "(?<{}>", name)?,
                }
                self.write(&group.sub, false)?;
                self.wtr.write_str(")")
            }
            RegexElement::Backreference(index) => {
                write!(self.wtr, r"\{}", index)
            }
        }
    }

    fn open(&mut self, wrap: bool) -> fmt::Result {
        if wrap {
            self.wtr.write_str("(?:")?;
        }
        Ok(())
    }

    fn close(&mut self, wrap: bool) -> fmt::Result {
        if wrap {
            self.wtr.write_str(")")?;
        }
        Ok(())
    }

    fn write_bounds(&mut self, q: &Quantifier) -> fmt::Result {
        match (q.min, q.max) {
            (0, Some(1)) => self.wtr.write_str("?")?,
            (0, None) => self.wtr.write_str("*")?,
            (1, None) => self.wtr.write_str("+")?,
            (min, None) => write!(self.wtr, "{{{},}}", min)?,
            (min, Some(max)) if min == max => write!(self.wtr, "{{{}}}", min)?,
            (min, Some(max)) => write!(self.wtr, "{{{},{}}}", min, max)?,
        }
        if !q.greedy {
            self.wtr.write_str("?")?;
        }
        Ok(())
    }

    /// Write the set as a bracketed class of maximal contiguous ranges.
    fn write_class(&mut self, set: &CharsBitSet) -> fmt::Result {
        self.wtr.write_str("[")?;
        let mut run: Option<(char, char)> = None;
        for ch in set.iter() {
            match run {
                Some((start, end)) if u32::from(end) + 1 == u32::from(ch) => {
                    run = Some((start, ch));
                }
                Some((start, end)) => {
                    self.write_class_range(start, end)?;
                    run = Some((ch, ch));
                }
                None => run = Some((ch, ch)),
            }
        }
        if let Some((start, end)) = run {
            self.write_class_range(start, end)?;
        }
        self.wtr.write_str("]")
    }

    fn write_class_range(&mut self, start: char, end: char) -> fmt::Result {
        self.write_literal_char(start)?;
        if start != end {
            if u32::from(end) - u32::from(start) > 1 {
                self.wtr.write_str("-")?;
            }
            self.write_literal_char(end)?;
        }
        Ok(())
    }

    fn write_literal_char(&mut self, c: char) -> fmt::Result {
        if is_meta_character(c) {
            self.wtr.write_str("\\")?;
            return self.wtr.write_char(c);
        }
        write_display_char(&mut self.wtr, c)
    }
}

/// Returns true if the printed form of the given element begins with an
/// ASCII digit.
fn starts_with_digit(el: &RegexElement) -> bool {
    match *el {
        RegexElement::Literal(ref lit) => {
            lit.chars().next().map_or(false, |ch| ch.is_ascii_digit())
        }
        RegexElement::Quantifier(ref q) => starts_with_digit(&q.sub),
        RegexElement::Sequence(ref subs) => {
            subs.first().map_or(false, starts_with_digit)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::parse;

    fn roundtrip(given: &str, expected: &str) {
        let ast = parse(given).unwrap();
        assert_eq!(expected, ast.to_string(), "printing /{}/", given);
    }

    #[test]
    fn print_literal() {
        roundtrip("a", "a");
        roundtrip(r"\xff", "\u{FF}");
        roundtrip("☃", "☃");
        roundtrip(r"a\.b\*", r"a\.b\*");
        roundtrip(r"\n\t", r"\x0A\x09");
    }

    #[test]
    fn print_class() {
        roundtrip("[a-c]", "[a-c]");
        roundtrip("[ab]", "[ab]");
        roundtrip("[abcx-z]", "[a-cx-z]");
        roundtrip(r"\d", "[0-9]");
        roundtrip(r"[\-\]]", r"[\-\]]");
        roundtrip(r"[^\x00-\x60\x62-\x7f]", "[a]");
        roundtrip("(?i)a", "[Aa]");
        roundtrip(".", r"[\x00-\x09\x0B-\x7F]");
    }

    #[test]
    fn print_anchor() {
        roundtrip("^a$", "^a$");
        roundtrip(r"\Aa\z", "^a$");
        roundtrip(r"\bx\B", r"\bx\B");
    }

    #[test]
    fn print_repetition() {
        roundtrip("a?", "a?");
        roundtrip("a*?", "a*?");
        roundtrip("a+", "a+");
        roundtrip("a{5}", "a{5}");
        roundtrip("a{5,}", "a{5,}");
        roundtrip("a{5,10}?", "a{5,10}?");
        roundtrip("ab*", "ab*");
        roundtrip("(?:ab)*", "(?:ab)*");
        roundtrip("(?:a|b)+", "(?:a|b)+");
        roundtrip("(?:a*)+", "(?:a*)+");
    }

    #[test]
    fn print_group() {
        roundtrip("(a)", "(a)");
        roundtrip("(?<year>a)", "(?<year>a)");
        roundtrip("()", "()");
        roundtrip(r"(a)\1", r"(a)\1");
    }

    #[test]
    fn print_backreference_before_digit() {
        roundtrip(r"(a)\1(?:0)", r"(a)\1(?:0)");
        roundtrip(r"(a)\1(?:0)+", r"(a)\1(?:0+)");
        roundtrip(r"(a)\1(?:0b)", r"(a)\1(?:0b)");
        roundtrip(r"(a)\1b0", r"(a)\1b0");
        let ast = parse(r"(a)\1(?:12)").unwrap();
        assert_eq!(ast, parse(&ast.to_string()).unwrap());
    }

    #[test]
    fn print_alternation() {
        roundtrip("a|b", "a|b");
        roundtrip("x(?:a|b)y", "x(?:a|b)y");
        roundtrip("(a|b)c", "(a|b)c");
    }

    #[test]
    fn outline() {
        let ast = parse(r"(a|b){2}\1").unwrap();
        let expected = "\
sequence (2 items)
  repeat {2}
    group 1
      alternation (2 branches)
        a
        b
  \\1
";
        assert_eq!(expected, ast.outline());
    }
}
