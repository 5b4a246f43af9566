use quillon::pricing::DEFAULT_RATE_PER_1K;
use quillon::{PricingTable, QuillonError};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn known_models_use_their_rate() {
    let table = PricingTable::default();
    assert!(approx(table.calculate_cost(1_000, "gpt-4"), 0.03));
    assert!(approx(table.calculate_cost(1_500, "gpt-4"), 0.045));
    assert!(approx(table.calculate_cost(2_000, "gpt-4"), 0.06));
    assert!(approx(table.calculate_cost(2_000, "claude-3-haiku"), 0.0005));
    assert!(approx(table.calculate_cost(1_000, "gemini-pro"), 0.001));
}

#[test]
fn unknown_models_use_the_default_rate() {
    let table = PricingTable::default();
    assert!(approx(table.rate_for("some-new-model"), DEFAULT_RATE_PER_1K));
    assert!(approx(table.calculate_cost(500, "some-new-model"), 0.001));
}

#[test]
fn zero_tokens_cost_nothing() {
    let table = PricingTable::default();
    assert_eq!(table.calculate_cost(0, "gpt-4"), 0.0);
}

#[test]
fn cost_scales_linearly_with_tokens() {
    let table = PricingTable::default();
    let one = table.calculate_cost(1_234, "gpt-4o");
    let three = table.calculate_cost(3 * 1_234, "gpt-4o");
    assert!(approx(three, 3.0 * one));
}

#[test]
fn toml_overrides_layer_on_builtins() {
    let table = PricingTable::from_toml_str(
        r#"
        default_rate = 0.004

        [rates]
        "gpt-4" = 0.06
        my-finetune = 0.012
        "#,
    )
    .unwrap();

    assert!(approx(table.rate_for("gpt-4"), 0.06));
    assert!(approx(table.rate_for("my-finetune"), 0.012));
    assert!(approx(table.rate_for("claude-3-opus"), 0.015));
    assert!(approx(table.default_rate(), 0.004));
}

#[test]
fn negative_rates_are_rejected() {
    let err = PricingTable::from_toml_str(
        r#"
        [rates]
        "gpt-4" = -1.0
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, QuillonError::Configuration(_)));
}

#[test]
fn flat_table_ignores_model() {
    let table = PricingTable::flat(0.01);
    assert!(approx(table.calculate_cost(1_000, "gpt-4"), 0.01));
    assert!(approx(table.calculate_cost(1_000, "anything"), 0.01));
}
