use {
    anyhow::Result,
    xeger::{confound, parse, SamplingPolicy, Universe, Xeger, XegerBuilder},
};

use crate::{rng, PATTERNS};

#[test]
fn confounded_strings_rarely_match() -> Result<()> {
    let policy = SamplingPolicy::default();
    let mut rng = rng();
    for &pattern in PATTERNS.iter() {
        let xeger = Xeger::new(pattern)?;
        let confounded = xeger.confound().unwrap();
        let sample = confounded.sample(&mut rng, policy.sample_size)?;
        assert!(
            sample.match_ratio() < policy.max_confounded_match_ratio,
            "{} of {} confounded strings matched /{}/",
            sample.matched,
            sample.total,
            pattern,
        );
    }
    Ok(())
}

#[test]
fn every_pattern_passes_the_policy() -> Result<()> {
    let policy = SamplingPolicy::default();
    let mut rng = rng();
    for &pattern in PATTERNS.iter() {
        let report = policy.check(&Xeger::new(pattern)?, &mut rng)?;
        assert!(report.is_valid(), "/{}/: {}", pattern, report);
    }
    Ok(())
}

#[test]
fn confounded_set_never_matches() -> Result<()> {
    let xeger = Xeger::new(r"^[0-9a-f]{8}-[a-f0-9]{4}$")?;
    let confounded = xeger.confound().unwrap();
    let mut rng = rng();
    let set = confounded.emit_set(20, &mut rng, 1000)?.unwrap();
    for s in set.iter() {
        assert_eq!(13, s.chars().count());
        assert!(!xeger.matches(s)?);
    }
    Ok(())
}

#[test]
fn confounding_keeps_structure() -> Result<()> {
    let ast = parse(r"(?<user>[a-z]+)@(\d{1,3})\.com")?;
    let confounded = confound(&ast).unwrap();
    let before: Vec<(u32, Option<String>)> = ast
        .capture_groups()
        .iter()
        .map(|g| (g.index, g.name.as_deref().map(String::from)))
        .collect();
    let after: Vec<(u32, Option<String>)> = confounded
        .capture_groups()
        .iter()
        .map(|g| (g.index, g.name.as_deref().map(String::from)))
        .collect();
    assert_eq!(before, after);

    let mut shape_before = vec![];
    ast.traverse(|depth, el| shape_before.push((depth, el.subs().len())));
    let mut shape_after = vec![];
    confounded
        .traverse(|depth, el| shape_after.push((depth, el.subs().len())));
    assert_eq!(shape_before, shape_after);
    Ok(())
}

#[test]
fn unconfoundable_patterns() -> Result<()> {
    assert!(Xeger::new("(?s).*")?.confound().is_none());
    assert!(Xeger::new("")?.confound().is_none());
    assert!(Xeger::new("^$")?.confound().is_none());
    Ok(())
}

#[test]
fn wider_universe() -> Result<()> {
    let xeger = XegerBuilder::new(r"[[:alpha:]]{4}")
        .universe(Universe::BMP)
        .build()?;
    let confounded = xeger.confound().unwrap();
    let mut rng = rng();
    let mut non_ascii = 0;
    for _ in 0..50 {
        let s = confounded.emit(&mut rng)?;
        assert!(!xeger.matches(&s)?);
        non_ascii += s.chars().filter(|c| !c.is_ascii()).count();
    }
    // Nearly all of the complement of an ASCII class lies outside ASCII.
    assert!(non_ascii > 150);
    Ok(())
}
