/*!
A compact, ordered set of characters over a bounded universe of code points.

Every character class in a parsed pattern is resolved into a [`CharsBitSet`]
at parse time. Membership is a single bit test, iteration is in ascending
code point order and the set algebra needed by the confounder (notably
[`CharsBitSet::complement`]) is always computed relative to the set's
[`Universe`].
*/

use core::fmt;

use crate::error::Error;

/// An inclusive range of code points that a [`CharsBitSet`] is defined over.
///
/// A universe never straddles the surrogate range, so every code point in it
/// is a valid `char`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Universe {
    start: u32,
    end: u32,
}

impl Universe {
    /// The ASCII range, `U+0000..=U+007F`. This is the default working
    /// universe of the parser.
    pub const ASCII: Universe = Universe { start: 0x00, end: 0x7F };

    /// The Latin-1 range, `U+0000..=U+00FF`.
    pub const LATIN1: Universe = Universe { start: 0x00, end: 0xFF };

    /// Everything in the basic multilingual plane that precedes the
    /// surrogate range, `U+0000..=U+D7FF`.
    pub const BMP: Universe = Universe { start: 0x00, end: 0xD7FF };

    /// Create a new universe spanning `start..=end`.
    ///
    /// This returns an error if `start > end` or if the range would include
    /// any surrogate code points.
    pub fn new(start: char, end: char) -> Result<Universe, Error> {
        let (start, end) = (u32::from(start), u32::from(end));
        if start > end {
            return Err(Error::illegal_state(
                "universe start must not exceed its end",
            ));
        }
        // A valid char is never a surrogate, so the only way to include one
        // is to span the whole gap.
        if start < 0xD800 && end > 0xDFFF {
            return Err(Error::illegal_state(
                "universe must not span the surrogate range",
            ));
        }
        Ok(Universe { start, end })
    }

    /// The smallest character in this universe.
    pub fn start(&self) -> char {
        // OK because construction guarantees valid scalar values.
        char::from_u32(self.start).unwrap()
    }

    /// The largest character in this universe.
    pub fn end(&self) -> char {
        char::from_u32(self.end).unwrap()
    }

    /// The number of characters in this universe.
    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    /// Returns true if the given character is in this universe.
    pub fn contains(&self, ch: char) -> bool {
        let cp = u32::from(ch);
        self.start <= cp && cp <= self.end
    }

    fn words(&self) -> usize {
        (self.len() + 63) / 64
    }

    fn offset(&self, ch: char) -> Result<usize, Error> {
        if !self.contains(ch) {
            return Err(Error::out_of_universe(*self, ch));
        }
        Ok((u32::from(ch) - self.start) as usize)
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "U+{:04X}..=U+{:04X}", self.start, self.end)
    }
}

/// An ordered set of characters within a fixed [`Universe`].
///
/// A set starts out either frozen (every constructor except
/// [`CharsBitSet::builder`]) or in builder mode. Only a set in builder mode
/// may be mutated; once [`CharsBitSet::freeze`] is called, `add` and friends
/// fail with an `IllegalState` error. Every set returned by set algebra is
/// frozen.
///
/// Binary operations require both operands to share a universe. Otherwise a
/// `DomainMismatch` error is returned.
#[derive(Clone, Debug)]
pub struct CharsBitSet {
    universe: Universe,
    bits: Vec<u64>,
    frozen: bool,
}

// Whether a set is frozen is a property of the value's lifecycle, not of its
// contents, so it doesn't participate in equality.
impl PartialEq for CharsBitSet {
    fn eq(&self, other: &CharsBitSet) -> bool {
        self.universe == other.universe && self.bits == other.bits
    }
}

impl Eq for CharsBitSet {}

impl CharsBitSet {
    /// Create a frozen set that is either empty or contains every character
    /// in the given universe.
    pub fn new(universe: Universe, populated: bool) -> CharsBitSet {
        let mut set = CharsBitSet {
            universe,
            bits: vec![0; universe.words()],
            frozen: true,
        };
        if populated {
            set.bits.iter_mut().for_each(|w| *w = !0);
            set.clear_tail();
        }
        set
    }

    /// Create an empty, mutable set. Call [`CharsBitSet::freeze`] once all
    /// characters have been added.
    pub fn builder(universe: Universe) -> CharsBitSet {
        let mut set = CharsBitSet::new(universe, false);
        set.frozen = false;
        set
    }

    /// Create a frozen set containing every character in `chars`. Duplicate
    /// characters are ignored.
    pub fn from_literal(
        universe: Universe,
        chars: &str,
    ) -> Result<CharsBitSet, Error> {
        let mut set = CharsBitSet::builder(universe);
        for ch in chars.chars() {
            set.add(ch)?;
        }
        Ok(set.freeze())
    }

    /// Create a frozen set containing the inclusive range `lo..=hi`. The
    /// bounds may be given in either order.
    pub fn from_range(
        universe: Universe,
        lo: char,
        hi: char,
    ) -> Result<CharsBitSet, Error> {
        let mut set = CharsBitSet::builder(universe);
        set.add_range(lo, hi)?;
        Ok(set.freeze())
    }

    /// Freeze this set, forbidding any further mutation.
    pub fn freeze(mut self) -> CharsBitSet {
        self.frozen = true;
        self
    }

    /// Returns true if this set can no longer be mutated.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The universe this set is defined over.
    pub fn universe(&self) -> Universe {
        self.universe
    }

    /// Add a single character to this set.
    pub fn add(&mut self, ch: char) -> Result<(), Error> {
        self.add_range(ch, ch)
    }

    /// Add every character in the inclusive range `lo..=hi` to this set.
    ///
    /// The bounds may be given in either order.
    pub fn add_range(&mut self, lo: char, hi: char) -> Result<(), Error> {
        self.check_mutable()?;
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let (lo, hi) = (self.universe.offset(lo)?, self.universe.offset(hi)?);
        for i in lo..=hi {
            self.bits[i / 64] |= 1 << (i % 64);
        }
        Ok(())
    }

    /// Add every member of `other` to this set.
    pub fn add_set(&mut self, other: &CharsBitSet) -> Result<(), Error> {
        self.check_mutable()?;
        self.check_universe(other)?;
        for (w, o) in self.bits.iter_mut().zip(other.bits.iter()) {
            *w |= *o;
        }
        Ok(())
    }

    /// Returns true if the given character is in this set.
    ///
    /// Characters outside of this set's universe are never members.
    pub fn contains(&self, ch: char) -> bool {
        match self.universe.offset(ch) {
            Ok(i) => self.bits[i / 64] & (1 << (i % 64)) != 0,
            Err(_) => false,
        }
    }

    /// The number of characters in this set.
    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns true if this set has no members.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Iterate over the members of this set in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        let cur = self.bits.first().copied().unwrap_or(0);
        Iter { set: self, word: 0, cur }
    }

    /// Returns the `n`th smallest member of this set, starting at `0`.
    pub fn nth(&self, mut n: usize) -> Option<char> {
        for (wi, &word) in self.bits.iter().enumerate() {
            let count = word.count_ones() as usize;
            if n >= count {
                n -= count;
                continue;
            }
            let mut word = word;
            for _ in 0..n {
                word &= word - 1;
            }
            let bit = word.trailing_zeros() as usize;
            return Some(self.char_at(wi * 64 + bit));
        }
        None
    }

    /// The smallest member of this set.
    pub fn first(&self) -> Option<char> {
        self.iter().next()
    }

    /// The largest member of this set.
    pub fn last(&self) -> Option<char> {
        let (wi, word) =
            self.bits.iter().enumerate().rev().find(|&(_, &w)| w != 0)?;
        Some(self.char_at(wi * 64 + 63 - word.leading_zeros() as usize))
    }

    /// Returns the set of characters in either this set or `other`.
    pub fn union(&self, other: &CharsBitSet) -> Result<CharsBitSet, Error> {
        self.zip_with(other, |a, b| a | b)
    }

    /// Returns the set of characters in both this set and `other`.
    pub fn intersection(
        &self,
        other: &CharsBitSet,
    ) -> Result<CharsBitSet, Error> {
        self.zip_with(other, |a, b| a & b)
    }

    /// Returns the set of characters in this set but not in `other`.
    pub fn difference(
        &self,
        other: &CharsBitSet,
    ) -> Result<CharsBitSet, Error> {
        self.zip_with(other, |a, b| a & !b)
    }

    /// Returns every character of this set's universe that is not in this
    /// set.
    pub fn complement(&self) -> CharsBitSet {
        let mut set = CharsBitSet {
            universe: self.universe,
            bits: self.bits.iter().map(|w| !w).collect(),
            frozen: true,
        };
        set.clear_tail();
        set
    }

    /// Returns true if this set and `other` have at least one member in
    /// common.
    pub fn intersects(&self, other: &CharsBitSet) -> Result<bool, Error> {
        self.check_universe(other)?;
        Ok(self.bits.iter().zip(other.bits.iter()).any(|(a, b)| a & b != 0))
    }

    fn zip_with(
        &self,
        other: &CharsBitSet,
        op: impl Fn(u64, u64) -> u64,
    ) -> Result<CharsBitSet, Error> {
        self.check_universe(other)?;
        let bits = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(&a, &b)| op(a, b))
            .collect();
        Ok(CharsBitSet { universe: self.universe, bits, frozen: true })
    }

    fn check_universe(&self, other: &CharsBitSet) -> Result<(), Error> {
        if self.universe != other.universe {
            return Err(Error::mismatch(self.universe, other.universe));
        }
        Ok(())
    }

    fn check_mutable(&self) -> Result<(), Error> {
        if self.frozen {
            return Err(Error::illegal_state("character set is frozen"));
        }
        Ok(())
    }

    /// Clear the bits past the end of the universe in the last word.
    fn clear_tail(&mut self) {
        let used = self.universe.len() % 64;
        if used != 0 {
            if let Some(last) = self.bits.last_mut() {
                *last &= (1 << used) - 1;
            }
        }
    }

    fn char_at(&self, offset: usize) -> char {
        // OK because offsets only come from set bits, which are always
        // within the universe, and universes never contain surrogates.
        char::from_u32(self.universe.start + offset as u32).unwrap()
    }
}

impl<'a> IntoIterator for &'a CharsBitSet {
    type Item = char;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl fmt::Display for CharsBitSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for ch in self.iter() {
            write_display_char(&mut *f, ch)?;
        }
        Ok(())
    }
}

/// An iterator over the members of a [`CharsBitSet`], in ascending order.
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    set: &'a CharsBitSet,
    word: usize,
    cur: u64,
}

impl<'a> Iterator for Iter<'a> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        while self.cur == 0 {
            self.word += 1;
            self.cur = *self.set.bits.get(self.word)?;
        }
        let bit = self.cur.trailing_zeros() as usize;
        self.cur &= self.cur - 1;
        Some(self.set.char_at(self.word * 64 + bit))
    }
}

/// Writes a character such that control and other invisible characters are
/// escaped.
pub(crate) fn write_display_char<W: fmt::Write>(
    mut wtr: W,
    ch: char,
) -> fmt::Result {
    let printable = ch == ' '
        || ch.is_ascii_graphic()
        || (!ch.is_ascii() && !ch.is_control());
    if printable {
        wtr.write_char(ch)
    } else if u32::from(ch) <= 0xFF {
        write!(wtr, "\\x{:02X}", u32::from(ch))
    } else {
        write!(wtr, "\\x{{{:X}}}", u32::from(ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn lit(s: &str) -> CharsBitSet {
        CharsBitSet::from_literal(Universe::ASCII, s).unwrap()
    }

    #[test]
    fn literal_is_deduped_and_sorted() {
        let set = lit("abalone");
        assert_eq!("abelno", set.to_string());
        assert_eq!(6, set.len());
        for ch in "abelno".chars() {
            assert!(set.contains(ch), "missing {:?}", ch);
        }
        assert!(!set.contains('k'));
        assert_eq!("abelno", set.iter().collect::<String>());
        // Iteration is restartable.
        assert_eq!("abelno", set.iter().collect::<String>());
    }

    #[test]
    fn algebra() {
        let one = lit("abalone");
        let two = lit("abacus");
        assert_eq!("abcsu", two.to_string());
        assert_eq!("ab", one.intersection(&two).unwrap().to_string());
        assert_eq!("abcelnosu", one.union(&two).unwrap().to_string());
        assert_eq!("elno", one.difference(&two).unwrap().to_string());
        assert!(one.intersects(&two).unwrap());

        let complement = one.complement();
        assert!(!complement.intersects(&one).unwrap());
        assert!(complement.intersects(&two).unwrap());
        assert_eq!(128 - 6, complement.len());
    }

    #[test]
    fn populated() {
        let full = CharsBitSet::new(Universe::ASCII, true);
        assert_eq!(128, full.len());
        assert!(full.complement().is_empty());
        assert_eq!(Some('\x00'), full.first());
        assert_eq!(Some('\x7F'), full.last());

        let empty = CharsBitSet::new(Universe::LATIN1, false);
        assert!(empty.is_empty());
        assert_eq!(None, empty.first());
        assert_eq!(None, empty.last());
        assert_eq!(256, empty.complement().len());
    }

    #[test]
    fn ranges() {
        let set =
            CharsBitSet::from_range(Universe::ASCII, ' ', '\x7F').unwrap();
        assert_eq!(127 - 31, set.len());
        for cp in 0u8..128 {
            assert_eq!(cp >= 32, set.contains(char::from(cp)));
        }

        let mut set = CharsBitSet::builder(Universe::ASCII);
        set.add_range('j', 'e').unwrap();
        assert_eq!("efghij", set.to_string());
    }

    #[test]
    fn nth() {
        let set = lit("zay09");
        assert_eq!(Some('0'), set.nth(0));
        assert_eq!(Some('9'), set.nth(1));
        assert_eq!(Some('a'), set.nth(2));
        assert_eq!(Some('z'), set.nth(4));
        assert_eq!(None, set.nth(5));

        let wide = CharsBitSet::from_range(Universe::BMP, 'a', '\u{D000}')
            .unwrap();
        assert_eq!(Some('\u{D000}'), wide.nth(wide.len() - 1));
        assert_eq!(Some('\u{D000}'), wide.last());
    }

    #[test]
    fn frozen_sets_reject_mutation() {
        let mut set = lit("abc");
        let err = set.add('d').unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::IllegalState(_)));

        let mut set = CharsBitSet::builder(Universe::ASCII);
        set.add('d').unwrap();
        let mut set = set.freeze();
        assert!(set.add_range('a', 'c').is_err());
        assert_eq!("d", set.to_string());
    }

    #[test]
    fn universe_mismatch() {
        let ascii = lit("abc");
        let latin1 =
            CharsBitSet::from_literal(Universe::LATIN1, "abc").unwrap();
        assert_ne!(ascii, latin1);
        let err = ascii.union(&latin1).unwrap_err();
        assert_eq!(
            &ErrorKind::DomainMismatch {
                expected: Universe::ASCII,
                found: Universe::LATIN1,
            },
            err.kind(),
        );
        assert!(ascii.intersects(&latin1).is_err());
        assert!(ascii.intersection(&latin1).is_err());
    }

    #[test]
    fn out_of_universe() {
        let err =
            CharsBitSet::from_literal(Universe::ASCII, "é").unwrap_err();
        assert_eq!(
            &ErrorKind::OutOfUniverse { universe: Universe::ASCII, ch: 'é' },
            err.kind(),
        );
        assert!(!lit("e").contains('é'));
    }

    #[test]
    fn universe_bounds() {
        assert!(Universe::new('z', 'a').is_err());
        assert!(Universe::new('\x00', '\u{E000}').is_err());
        let u = Universe::new('a', 'z').unwrap();
        assert_eq!(26, u.len());
        let set = CharsBitSet::new(u, true);
        assert_eq!("abcdefghijklmnopqrstuvwxyz", set.to_string());
        assert_eq!(26, set.len());
    }

    #[test]
    fn display_escapes() {
        let set = lit("\t a");
        assert_eq!(r"\x09 a", set.to_string());
    }
}
