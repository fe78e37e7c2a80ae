use sindi::{
    compare, CancelToken, Compare, Comparator, Config, Domain, Frontend, RulesComparator,
    SubstitutionTable, Verdict,
};
use std::time::Duration;

fn full(first: &str, second: &str) -> Verdict {
    Comparator::default().compare(first, second)
}

#[test]
fn halved_bound_is_weaker() {
    assert_eq!(
        compare("(a+1) > b / 2", "(a+1) > b"),
        Verdict::SecondStronger
    );
}

#[test]
fn doubled_bound_is_stronger_for_unsigned_values() {
    assert_eq!(full("a > b * 2", "a > b * 1"), Verdict::FirstStronger);
}

#[test]
fn doubled_bound_is_incomparable_over_integers() {
    let cmp = Comparator::new(Config::new().with_domain(Domain::Integer));
    assert_eq!(cmp.compare("a > b * 2", "a > b * 1"), Verdict::Incomparable);
}

#[test]
fn strict_versus_inclusive() {
    assert_eq!(full("x < y", "x <= y"), Verdict::FirstStronger);
    assert_eq!(full("x <= y", "x < y"), Verdict::SecondStronger);
}

#[test]
fn integer_bounds_are_exact() {
    assert_eq!(full("x >= 6", "x > 5"), Verdict::Equivalent);
    assert_eq!(full("x < y", "x + 1 <= y"), Verdict::Equivalent);
    assert_eq!(full("2 * x > 4", "x >= 3"), Verdict::Equivalent);
}

#[test]
fn conjunct_strengthens() {
    assert_eq!(
        full("msg.sender == owner && amount >= limit", "msg.sender == owner"),
        Verdict::FirstStronger
    );
}

#[test]
fn disjunct_weakens() {
    assert_eq!(full("paused", "paused || locked"), Verdict::FirstStronger);
    assert_eq!(full("x > 10 || y > 10", "x > 5 || y > 5"), Verdict::FirstStronger);
}

#[test]
fn unrelated_atoms_are_incomparable() {
    assert_eq!(full("a > 0", "b > 0"), Verdict::Incomparable);
    assert_eq!(full("paused", "locked"), Verdict::Incomparable);
}

#[test]
fn every_predicate_is_equivalent_to_itself() {
    for p in [
        "x < y",
        "(x & y) > 0",
        "balances[msg.sender].amount >= 1e18 && !paused",
        "a ** b > c",
        "f(g(x)) == 0",
    ] {
        assert_eq!(full(p, p), Verdict::Equivalent, "{p}");
    }
}

#[test]
fn swapping_arguments_reverses_the_verdict() {
    let pairs = [
        ("x < y", "x <= y"),
        ("(a+1) > b / 2", "(a+1) > b"),
        ("a > 0", "b > 0"),
        ("x >= 6", "x > 5"),
        ("paused && x > 3", "x > 2"),
    ];
    let cmp = Comparator::default();
    for (p, q) in pairs {
        assert_eq!(cmp.compare(q, p), cmp.compare(p, q).reversed(), "{p} vs {q}");
    }
}

#[test]
fn owner_idiom_is_structurally_equal() {
    let out = Comparator::default().explain("isOwner()", "msg.sender == owner()");
    assert_eq!(out.verdict, Verdict::Equivalent);
    assert_eq!(out.forward.as_deref(), Some("structural"));
}

#[test]
fn flag_idiom_is_understood() {
    assert_eq!(
        full(
            "(x & MarketplaceLib.FLAG_MASK_FINALIZED) == 0 && y > 1",
            "!MarketplaceLib.isFinalized(x)"
        ),
        Verdict::FirstStronger
    );
}

#[test]
fn mapping_reads_are_functions_of_their_key() {
    assert_eq!(
        full("balances[a] > 5", "balances[a] >= 5"),
        Verdict::FirstStronger
    );
    assert_eq!(
        full("balances[a] > 5", "balances[b] >= 5"),
        Verdict::Incomparable
    );
}

#[test]
fn opaque_atoms_are_reported() {
    let out = Comparator::default().explain("(x & y) > 1", "(x & y) > 0");
    assert_eq!(out.verdict, Verdict::FirstStronger);
    assert!(!out.opaque.is_empty());
}

#[test]
fn explain_reports_how_each_direction_was_settled() {
    let out = Comparator::default().explain("x >= 6", "x > 5");
    assert_eq!(out.forward.as_deref(), Some("simplifier"));
    assert_eq!(out.backward.as_deref(), Some("simplifier"));

    let out = Comparator::default().explain("a > b * 2", "a > b * 1");
    assert_eq!(out.forward.as_deref(), Some("solver:fourier-motzkin"));
    assert_eq!(out.backward, None);
}

#[test]
fn errors_become_verdicts() {
    match full("a +", "a") {
        Verdict::Error(reason) => assert!(reason.contains("syntax error")),
        other => panic!("unexpected verdict: {:?}", other),
    }
    match full("a # b", "a") {
        Verdict::Error(reason) => assert!(reason.starts_with("lex error")),
        other => panic!("unexpected verdict: {:?}", other),
    }
    match full("a + (b && c) > 1", "a > 1") {
        Verdict::Error(reason) => assert!(reason.contains("cannot be used as an integer")),
        other => panic!("unexpected verdict: {:?}", other),
    }
}

#[test]
fn cancelled_solver_leaves_directions_unproven() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let cmp = Comparator::new(Config::new().with_cancel(cancel));
    assert_eq!(cmp.compare("a > b * 2", "a > b * 1"), Verdict::Incomparable);
    // The simplifier alone still settles easy pairs.
    assert_eq!(cmp.compare("x >= 6", "x > 5"), Verdict::Equivalent);
}

#[test]
fn expired_deadline_leaves_directions_unproven() {
    let cmp = Comparator::new(Config::new().with_timeout(Some(Duration::ZERO)));
    assert_eq!(cmp.compare("a > b * 2", "a > b * 1"), Verdict::Incomparable);
    assert_eq!(cmp.compare("x >= 6", "x > 5"), Verdict::Equivalent);
}

#[test]
fn differences_may_be_negative() {
    // a = 0, b = 2 satisfies the first but not the second.
    assert_eq!(full("a < b", "(a - b) % 2 == 1"), Verdict::Incomparable);
    // a = 2 satisfies the first.
    assert_eq!(full("(0 - a) / 2 != 0", "false"), Verdict::SecondStronger);
}

#[test]
fn quotients_of_uint_values_are_floored() {
    assert_eq!(full("a / 2 > 3", "a > 3"), Verdict::FirstStronger);
    assert_eq!(full("(a + b) % 4 < 4", "true"), Verdict::Equivalent);
}

#[test]
fn oversized_literals_stay_symbolic() {
    let rules = RulesComparator::default();
    assert_eq!(rules.compare("x > 1e30000000", "x > 0"), Verdict::Incomparable);
    assert_eq!(full("x > 1e30000000", "x > 0"), Verdict::FirstStronger);
    assert!(!full("x > 1.5e-2147483648", "x > 0").is_error());
}

#[test]
fn units_and_aliases_are_rewritten_first() {
    let config = Config::default();
    let cmp = Comparator::new(config.clone())
        .with_frontend(Frontend::with_rewriter(&config, SubstitutionTable::solidity()));
    assert_eq!(
        cmp.compare("msg.value >= 1 ether", "msg.value > 10 ** 17"),
        Verdict::FirstStronger
    );
    assert_eq!(
        cmp.compare("deadline <= now + 1 days", "deadline <= block.timestamp + 86400"),
        Verdict::Equivalent
    );
}

#[test]
fn verdict_strings_are_stable() {
    assert_eq!(Verdict::Equivalent.to_string(), "The predicates are equivalent.");
    assert_eq!(
        Verdict::FirstStronger.to_string(),
        "The first predicate is stronger."
    );
    assert_eq!(
        Verdict::SecondStronger.to_string(),
        "The second predicate is stronger."
    );
    assert_eq!(
        Verdict::Incomparable.to_string(),
        "The predicates are incomparable."
    );
    assert_eq!(Verdict::Error("boom".into()).to_string(), "Error: boom");
}

#[test]
fn verdict_tags_and_json() {
    assert_eq!(Verdict::FirstStronger.tag(), "first-stronger");
    assert_eq!(Verdict::Error("x".into()).tag(), "error");
    assert_eq!(
        serde_json::to_string(&Verdict::SecondStronger).unwrap(),
        "\"second-stronger\""
    );
    assert_eq!(
        serde_json::to_string(&Verdict::Error("x".into())).unwrap(),
        "{\"error\":\"x\"}"
    );
    let out = Comparator::default().explain("x < y", "x <= y");
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["verdict"], "first-stronger");
    assert_eq!(json["first"]["source"], "x < y");
}

#[test]
fn from_directions_covers_all_cases() {
    assert_eq!(Verdict::from_directions(true, true), Verdict::Equivalent);
    assert_eq!(Verdict::from_directions(true, false), Verdict::FirstStronger);
    assert_eq!(Verdict::from_directions(false, true), Verdict::SecondStronger);
    assert_eq!(Verdict::from_directions(false, false), Verdict::Incomparable);
}
