use {
    anyhow::Result,
    xeger::{
        emit, parse, Emitter, ErrorKind, RegexElement, SamplingPolicy,
        Universe, Xeger, XegerBuilder,
    },
};

use crate::{rng, PATTERNS};

#[test]
fn generated_strings_match() -> Result<()> {
    let policy = SamplingPolicy::default();
    let mut rng = rng();
    for &pattern in PATTERNS.iter() {
        let xeger = Xeger::new(pattern)?;
        let sample = xeger.sample(&mut rng, policy.sample_size)?;
        assert!(
            sample.match_ratio() > policy.min_match_ratio,
            "only {} of {} strings matched /{}/",
            sample.matched,
            sample.total,
            pattern,
        );
    }
    Ok(())
}

#[test]
fn simple_patterns_always_match() -> Result<()> {
    let simple = [
        "abc",
        "[a-z]+",
        r"\d{3}-\d{4}",
        "(?:foo|bar)baz?",
        r"(\w+)@\1\.org",
        "(?i)hello world",
        "[[:upper:]][[:lower:]]*",
        r"\p{Lu}\p{Ll}{2,}",
    ];
    let mut rng = rng();
    for pattern in simple {
        let xeger = Xeger::new(pattern)?;
        for _ in 0..100 {
            let s = xeger.emit(&mut rng)?;
            let ok = xeger.matches(&s)?;
            assert!(ok, "{:?} does not match /{}/", s, pattern);
        }
    }
    Ok(())
}

#[test]
fn unicode_classes_in_wider_universes() -> Result<()> {
    let patterns = [r"\W{3}", r"\P{L}{3}", r"\D{3}", r"\w{3}", r"\s\S\d"];
    let mut rng = rng();
    for universe in [Universe::LATIN1, Universe::BMP] {
        for pattern in patterns {
            let xeger =
                XegerBuilder::new(pattern).universe(universe).build()?;
            let plain = xeger.sample(&mut rng, 100)?;
            assert_eq!(
                100, plain.matched,
                "/{}/ in {}: {:?}",
                pattern, universe, plain,
            );
            let confounded = xeger.confound().unwrap();
            let sample = confounded.sample(&mut rng, 100)?;
            assert_eq!(
                0, sample.matched,
                "confounded /{}/ in {}: {:?}",
                pattern, universe, sample,
            );
        }
    }
    Ok(())
}

#[test]
fn deterministic() -> Result<()> {
    for &pattern in PATTERNS.iter() {
        let ast = parse(pattern)?;
        let (mut rng1, mut rng2) = (rng(), rng());
        for _ in 0..20 {
            assert_eq!(emit(&ast, &mut rng1)?, emit(&ast, &mut rng2)?);
        }
    }
    Ok(())
}

#[test]
fn backreference_consistency() -> Result<()> {
    let xeger = Xeger::new(r"(\d{2})-(\d{2})-(\d{4}) \3/\2/\1")?;
    let mut rng = rng();
    for _ in 0..100 {
        let s = xeger.emit(&mut rng)?;
        let (date, rev) = s.split_once(' ').unwrap();
        let parts: Vec<&str> = date.split('-').collect();
        let revs: Vec<&str> = rev.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(vec![parts[2], parts[1], parts[0]], revs);
    }

    let xeger = Xeger::new(r"([a-z]{1,8})\1")?;
    for _ in 0..100 {
        let s = xeger.emit(&mut rng)?;
        let (left, right) = s.split_at(s.len() / 2);
        assert_eq!(left, right);
    }
    Ok(())
}

#[test]
fn repetition_boundaries() -> Result<()> {
    let mut rng = rng();
    let cases: &[(&str, usize, usize)] = &[
        ("a{0,0}", 0, 0),
        ("a{3,3}", 3, 3),
        ("a{2,4}", 2, 4),
        ("a*", 0, 10),
        ("a+", 1, 10),
        ("a?", 0, 1),
        ("a{7,}", 7, 10),
        ("(?:ab){2}", 4, 4),
    ];
    for &(pattern, min, max) in cases {
        let ast = parse(pattern)?;
        for _ in 0..100 {
            let len = emit(&ast, &mut rng)?.len();
            assert!(
                min <= len && len <= max,
                "/{}/ emitted {} chars, expected {}..={}",
                pattern,
                len,
                min,
                max,
            );
        }
    }

    let ast = parse("a*")?;
    let emitter = Emitter::new(0);
    assert_eq!("", emitter.emit(&ast, &mut rng)?);
    let xeger = XegerBuilder::new("(?:ab)+").repetition_cap(2).build()?;
    for _ in 0..50 {
        let s = xeger.emit(&mut rng)?;
        assert!(s == "ab" || s == "abab", "{:?}", s);
    }
    Ok(())
}

#[test]
fn parse_errors() {
    let err = parse("(abc").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedPattern { .. }));
    assert_eq!(Some(0), err.position());

    let err = parse("(?=abc)").unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnsupportedConstruct { position: 0, .. },
    ));

    let err = parse(r"(a)\2").unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::DanglingBackreference { position: 3, index: 2 },
    ));

    // Parse errors never surface from the matcher.
    let err = Xeger::new("a{3,2}").unwrap_err();
    assert!(err.is_parse_error());
}

#[test]
fn traverse_visits_every_group() -> Result<()> {
    let ast = parse(r"(\d{2})-(\d{2})-(\d{4}) \3/\2/\1")?;
    let mut groups = vec![];
    let mut refs = vec![];
    let mut max_depth = 0;
    ast.traverse(|depth, el| {
        max_depth = max_depth.max(depth);
        match *el {
            RegexElement::CaptureGroup(ref g) => groups.push((depth, g.index)),
            RegexElement::Backreference(i) => refs.push((depth, i)),
            _ => {}
        }
    });
    assert_eq!(vec![(1, 1), (1, 2), (1, 3)], groups);
    assert_eq!(vec![(1, 3), (1, 2), (1, 1)], refs);
    // sequence -> group -> quantifier -> class
    assert_eq!(3, max_depth);
    Ok(())
}
