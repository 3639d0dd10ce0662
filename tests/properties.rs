use {
    quickcheck::{Arbitrary, Gen, QuickCheck, Testable},
    xeger::{CharsBitSet, Universe},
};

fn qc<T: Testable>(t: T) {
    QuickCheck::new().tests(1_000).max_tests(10_000).quickcheck(t);
}

/// A set over the Latin-1 universe, so that the last word of the bit set is
/// full and the first is partially populated by typical inputs.
#[derive(Clone, Debug)]
struct Set(CharsBitSet);

impl Arbitrary for Set {
    fn arbitrary(g: &mut Gen) -> Set {
        let bytes = Vec::<u8>::arbitrary(g);
        let mut set = CharsBitSet::builder(Universe::LATIN1);
        for b in bytes {
            set.add(char::from(b)).unwrap();
        }
        if bool::arbitrary(g) {
            // Ranges exercise runs that cross word boundaries.
            let (lo, hi) = (u8::arbitrary(g), u8::arbitrary(g));
            set.add_range(char::from(lo), char::from(hi)).unwrap();
        }
        Set(set.freeze())
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Set>> {
        let chars: Vec<char> = self.0.iter().collect();
        Box::new(chars.shrink().map(|chars| {
            let s: String = chars.into_iter().collect();
            Set(CharsBitSet::from_literal(Universe::LATIN1, &s).unwrap())
        }))
    }
}

#[test]
fn union_commutes() {
    fn prop(a: Set, b: Set) -> bool {
        a.0.union(&b.0).unwrap() == b.0.union(&a.0).unwrap()
    }
    qc(prop as fn(Set, Set) -> bool);
}

#[test]
fn intersection_with_complement_is_empty() {
    fn prop(a: Set) -> bool {
        a.0.intersection(&a.0.complement()).unwrap().is_empty()
    }
    qc(prop as fn(Set) -> bool);
}

#[test]
fn union_with_complement_is_universe() {
    fn prop(a: Set) -> bool {
        let all = a.0.union(&a.0.complement()).unwrap();
        all.len() == Universe::LATIN1.len()
    }
    qc(prop as fn(Set) -> bool);
}

#[test]
fn double_complement() {
    fn prop(a: Set) -> bool {
        a.0.complement().complement() == a.0
    }
    qc(prop as fn(Set) -> bool);
}

#[test]
fn de_morgan() {
    fn prop(a: Set, b: Set) -> bool {
        let lhs = a.0.union(&b.0).unwrap().complement();
        let rhs =
            a.0.complement().intersection(&b.0.complement()).unwrap();
        lhs == rhs
    }
    qc(prop as fn(Set, Set) -> bool);
}

#[test]
fn difference_is_intersection_with_complement() {
    fn prop(a: Set, b: Set) -> bool {
        a.0.difference(&b.0).unwrap()
            == a.0.intersection(&b.0.complement()).unwrap()
    }
    qc(prop as fn(Set, Set) -> bool);
}

#[test]
fn len_agrees_with_iter() {
    fn prop(a: Set) -> bool {
        a.0.len() == a.0.iter().count() && a.0.is_empty() == (a.0.len() == 0)
    }
    qc(prop as fn(Set) -> bool);
}

#[test]
fn iter_is_sorted_and_nth_agrees() {
    fn prop(a: Set) -> bool {
        let members: Vec<char> = a.0.iter().collect();
        members.windows(2).all(|w| w[0] < w[1])
            && members.iter().enumerate().all(|(i, &c)| a.0.nth(i) == Some(c))
            && a.0.nth(members.len()).is_none()
            && members.iter().all(|&c| a.0.contains(c))
    }
    qc(prop as fn(Set) -> bool);
}

#[test]
fn intersects_agrees_with_intersection() {
    fn prop(a: Set, b: Set) -> bool {
        a.0.intersects(&b.0).unwrap()
            == !a.0.intersection(&b.0).unwrap().is_empty()
    }
    qc(prop as fn(Set, Set) -> bool);
}
