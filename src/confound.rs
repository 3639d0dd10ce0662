/*!
Rewrites a tree so that the strings it generates are unlikely to match the
original pattern.

Only the leaves that produce text change. Every character class is replaced
by its complement within the working universe and every literal is replaced
by a literal of the same length drawn from a disjoint alphabet. The shape of
the tree stays the same: repetition bounds, anchors, the number of branches
in an alternation, capture groups and backreferences are all preserved.

The result is not guaranteed to never match. For example, confounding
`[a-z]|[^a-z]` yields the same language. Callers that need certainty filter
generated strings through the original pattern.
*/

use crate::ast::{CaptureGroup, Quantifier, RegexElement};

/// Return a confounded copy of the given tree, or `None` when confounding
/// would not change anything.
pub fn confound(ast: &RegexElement) -> Option<RegexElement> {
    let mut changed = false;
    let confounded = confound_element(ast, &mut changed);
    if !changed {
        debug!("pattern has nothing to confound: {}", ast);
        return None;
    }
    trace!("confounded /{}/ into /{}/", ast, confounded);
    Some(confounded)
}

fn confound_element(el: &RegexElement, changed: &mut bool) -> RegexElement {
    match *el {
        RegexElement::Literal(ref lit) => {
            let swapped: String = lit.chars().map(confound_char).collect();
            if swapped != *lit {
                *changed = true;
            }
            RegexElement::Literal(swapped)
        }
        RegexElement::Class(ref class) => {
            let negated = class.negate();
            if negated.effective().is_empty() {
                return RegexElement::Class(class.clone());
            }
            *changed = true;
            RegexElement::Class(negated)
        }
        RegexElement::Anchor(anchor) => RegexElement::Anchor(anchor),
        RegexElement::Sequence(ref subs) => RegexElement::Sequence(
            subs.iter().map(|sub| confound_element(sub, changed)).collect(),
        ),
        RegexElement::Alternation(ref subs) => RegexElement::Alternation(
            subs.iter().map(|sub| confound_element(sub, changed)).collect(),
        ),
        RegexElement::Quantifier(ref q) => {
            RegexElement::Quantifier(Quantifier {
                min: q.min,
                max: q.max,
                greedy: q.greedy,
                sub: Box::new(confound_element(&q.sub, changed)),
            })
        }
        RegexElement::CaptureGroup(ref group) => {
            RegexElement::CaptureGroup(CaptureGroup {
                index: group.index,
                name: group.name.clone(),
                sub: Box::new(confound_element(&group.sub, changed)),
            })
        }
        RegexElement::Backreference(index) => {
            RegexElement::Backreference(index)
        }
    }
}

/// Map a character to one from a disjoint alphabet. Digits become
/// lowercase letters, letters become digits and other printable ASCII
/// becomes a lowercase letter. Everything else maps to itself.
fn confound_char(ch: char) -> char {
    if !ch.is_ascii() {
        return ch;
    }
    let b = ch as u8;
    match ch {
        '0'..='9' => char::from(b'a' + (b - b'0')),
        'a'..='z' => char::from(b'0' + (b - b'a') % 10),
        'A'..='Z' => char::from(b'0' + (b - b'A') % 10),
        ' '..='~' => char::from(b'a' + b % 26),
        _ => ch,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ast::{parse, Anchor, ParserConfig},
        charset::Universe,
    };

    use super::*;

    fn c(pattern: &str) -> Option<RegexElement> {
        confound(&parse(pattern).unwrap())
    }

    fn lit(s: &str) -> RegexElement {
        RegexElement::Literal(s.to_string())
    }

    #[test]
    fn chars() {
        assert_eq!('a', confound_char('0'));
        assert_eq!('j', confound_char('9'));
        assert_eq!('0', confound_char('a'));
        assert_eq!('9', confound_char('j'));
        assert_eq!('0', confound_char('k'));
        assert_eq!('5', confound_char('Z'));
        assert!(confound_char('@').is_ascii_lowercase());
        assert!(confound_char(' ').is_ascii_lowercase());
        assert_eq!('\n', confound_char('\n'));
        assert_eq!('☃', confound_char('☃'));
    }

    #[test]
    fn literal() {
        assert_eq!(Some(lit("012")), c("abc"));
        assert_eq!(Some(lit("bcd")), c("123"));
        assert_eq!(None, c("☃"));
        assert_eq!(None, c(""));
    }

    #[test]
    fn class() {
        let confounded = c("[a-z]").unwrap();
        match confounded {
            RegexElement::Class(ref class) => {
                assert!(class.is_negated());
                assert_eq!(128 - 26, class.effective().len());
                assert!(!class.effective().contains('q'));
            }
            ref el => panic!("expected class, got {:?}", el),
        }
        // A class that already allows everything has no complement.
        assert_eq!(None, c("(?s)."));
    }

    #[test]
    fn shape_is_preserved() {
        let confounded = c(r"^(a|b){2,5}\1$").unwrap();
        let expected = RegexElement::Sequence(vec![
            RegexElement::Anchor(Anchor::Start),
            RegexElement::Quantifier(Quantifier {
                min: 2,
                max: Some(5),
                greedy: true,
                sub: Box::new(RegexElement::CaptureGroup(CaptureGroup {
                    index: 1,
                    name: None,
                    sub: Box::new(RegexElement::Alternation(vec![
                        lit("0"),
                        lit("1"),
                    ])),
                })),
            }),
            RegexElement::Backreference(1),
            RegexElement::Anchor(Anchor::End),
        ]);
        assert_eq!(expected, confounded);
    }

    #[test]
    fn universe_is_respected() {
        let config = ParserConfig::new().universe(Universe::LATIN1);
        let ast = config.parse("[a-z]").unwrap();
        match confound(&ast).unwrap() {
            RegexElement::Class(ref class) => {
                assert_eq!(256 - 26, class.effective().len());
                assert!(class.effective().contains('é'));
            }
            ref el => panic!("expected class, got {:?}", el),
        }
    }
}
