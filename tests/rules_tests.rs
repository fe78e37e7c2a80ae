use sindi::{compare_rules, Compare, RulesComparator, Verdict, RULES};

#[test]
fn strict_relation_is_stronger() {
    assert_eq!(compare_rules("x < y", "x <= y"), Verdict::FirstStronger);
    assert_eq!(compare_rules("x <= y", "x < y"), Verdict::SecondStronger);
    assert_eq!(compare_rules("x > y", "x != y"), Verdict::FirstStronger);
    assert_eq!(compare_rules("a == b", "a <= b"), Verdict::FirstStronger);
}

#[test]
fn mirrored_operands_are_aligned() {
    assert_eq!(compare_rules("y > x", "x <= y"), Verdict::FirstStronger);
    assert_eq!(compare_rules("b == a", "a >= b"), Verdict::FirstStronger);
}

#[test]
fn structurally_equal_predicates_are_equivalent() {
    assert_eq!(compare_rules("a == b", "b == a"), Verdict::Equivalent);
    assert_eq!(compare_rules("b + a > c", "a + b > c"), Verdict::Equivalent);
    assert_eq!(compare_rules("x < y - 1", "x + 1 < y"), Verdict::Equivalent);
}

#[test]
fn literal_bounds_nest() {
    assert_eq!(compare_rules("x > 5", "x > 3"), Verdict::FirstStronger);
    assert_eq!(compare_rules("x <= 3", "x < 5"), Verdict::FirstStronger);
    assert_eq!(compare_rules("5 < x", "x > 3"), Verdict::FirstStronger);
    assert_eq!(compare_rules("x == 4", "x != 7"), Verdict::FirstStronger);
    assert_eq!(compare_rules("x == 4", "x < 4"), Verdict::Incomparable);
}

#[test]
fn literal_bounds_are_read_over_the_reals() {
    // Equivalent over integers, but the rules do not know that.
    assert_eq!(compare_rules("x >= 6", "x > 5"), Verdict::FirstStronger);
}

#[test]
fn different_scaling_is_out_of_reach() {
    assert_eq!(compare_rules("a > b * 2", "a > b * 1"), Verdict::Incomparable);
}

#[test]
fn conjunctions_and_disjunctions() {
    assert_eq!(compare_rules("a && b", "a"), Verdict::FirstStronger);
    assert_eq!(compare_rules("a", "a || b"), Verdict::FirstStronger);
    assert_eq!(compare_rules("a && b && c", "c && a"), Verdict::FirstStronger);
    assert_eq!(compare_rules("a || b", "a || b || c"), Verdict::FirstStronger);
}

#[test]
fn clauses_subsume_through_literal_rules() {
    assert_eq!(
        compare_rules("x > 5 && y == 1", "x > 3"),
        Verdict::FirstStronger
    );
    assert_eq!(compare_rules("x > 5", "x > 3 || paused"), Verdict::FirstStronger);
    assert_eq!(
        compare_rules("x > 5 && y < z", "x >= 5 && y <= z"),
        Verdict::FirstStronger
    );
}

#[test]
fn unrelated_predicates_are_incomparable() {
    assert_eq!(compare_rules("a < b", "c < d"), Verdict::Incomparable);
    assert_eq!(compare_rules("paused", "locked"), Verdict::Incomparable);
}

#[test]
fn malformed_input_is_an_error_verdict() {
    match compare_rules("a <", "a < b") {
        Verdict::Error(reason) => assert!(reason.contains("syntax error")),
        other => panic!("unexpected verdict: {:?}", other),
    }
    match compare_rules("a < b", "a < b < c") {
        Verdict::Error(reason) => assert!(reason.contains("relations do not chain")),
        other => panic!("unexpected verdict: {:?}", other),
    }
}

#[test]
fn explain_names_the_rule() {
    let cmp = RulesComparator::default();
    let out = cmp.explain("x < y", "x <= y");
    assert_eq!(out.verdict, Verdict::FirstStronger);
    assert_eq!(out.forward.as_deref(), Some("rule:relational-strength"));
    assert_eq!(out.backward, None);
    assert!(out.first.is_some() && out.second.is_some());

    let out = cmp.explain("x > 5", "x > 3");
    assert_eq!(out.forward.as_deref(), Some("rule:literal-bound"));

    let out = cmp.explain("a == b", "b == a");
    assert_eq!(out.forward.as_deref(), Some("structural"));
}

#[test]
fn rule_table_order() {
    let names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
    assert_eq!(
        names,
        vec![
            "relational-strength",
            "literal-bound",
            "conjunction-elimination",
            "disjunction-introduction",
            "clause-subsumption",
        ]
    );
}
