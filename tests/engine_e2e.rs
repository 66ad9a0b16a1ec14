use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use parlance::{
    DefaultSanitizer, Lemmatizer, Match, OutputMode, PropertyValue, ResponseEngine, Rule, RuleId,
    ANY_TARGET, PROP_OUTPUT_MODE, PROP_PREFER_CURRENT_TOPIC,
};

const ALICE: &str = "alice@example.org";
const BOB: &str = "bob@example.org";

fn sequential(engine: &ResponseEngine) {
    engine
        .set_property(PROP_OUTPUT_MODE, PropertyValue::Mode(OutputMode::Sequential))
        .unwrap();
}

#[test]
fn exact_rule_beats_wildcard_rule() {
    let engine = ResponseEngine::new();
    engine.set_rules(vec![
        Rule::new(RuleId::new(1), ["* soccer *"], ["wildcard answer"]),
        Rule::new(RuleId::new(2), ["do you like soccer"], ["exact answer"]),
    ]);

    for _ in 0..3 {
        let response = engine.get_response("do you like soccer", ANY_TARGET);
        assert_eq!(response.output, "exact answer");
        assert_eq!(response.matches, vec![Match::new(RuleId::new(2), 0)]);
    }
}

#[test]
fn targeted_rule_beats_generic_rule() {
    let engine = ResponseEngine::new();
    engine.set_rules(vec![
        Rule::new(RuleId::new(1), ["hello"], ["generic hello"]),
        Rule::new(RuleId::new(2), ["hello"], ["hello alice"]).with_targets([ALICE]),
    ]);

    let response = engine.get_response("hello", ALICE);
    assert_eq!(response.output, "hello alice");
    assert_eq!(response.matches[0].rule_id, RuleId::new(2));
}

#[test]
fn targeted_wildcard_beats_generic_exact() {
    // Target scoping is the strongest differentiator, ahead of wildcard
    // specificity.
    let engine = ResponseEngine::new();
    engine.set_rules(vec![
        Rule::new(RuleId::new(1), ["do you like cats"], ["generic exact"]),
        Rule::new(RuleId::new(2), ["* cats *"], ["alice wildcard"]).with_targets([ALICE]),
    ]);

    let response = engine.get_response("do you like cats", ALICE);
    assert_eq!(response.output, "alice wildcard");
}

#[test]
fn unscoped_rule_is_fallback_for_unknown_target() {
    let engine = ResponseEngine::new();
    engine.set_rules(vec![
        Rule::new(RuleId::new(1), ["hello"], ["alice only"]).with_targets([ALICE]),
        Rule::new(RuleId::new(2), ["do you like soccer"], ["for everyone"]),
    ]);

    // Bob gets no personalized rule for this input but still reaches the
    // unscoped one.
    let response = engine.get_response("do you like soccer", BOB);
    assert_eq!(response.output, "for everyone");
    assert_eq!(response.matches[0].rule_id, RuleId::new(2));

    // And a partner with no matching rule anywhere gets nothing.
    assert!(engine.get_response("hello", BOB).is_empty());
}

#[test]
fn topic_preference_biases_selection() {
    let engine = ResponseEngine::new();
    sequential(&engine);
    engine
        .set_property(PROP_PREFER_CURRENT_TOPIC, PropertyValue::Bool(true))
        .unwrap();

    engine.set_rules(vec![
        Rule::new(RuleId::new(1), ["lets talk cars"], ["cars it is"]).with_topic("cars"),
        Rule::new(RuleId::new(2), ["lets talk football"], ["football it is"])
            .with_topic("football"),
        Rule::new(RuleId::new(3), ["tell me more"], ["more about cars"]).with_topic("cars"),
        Rule::new(RuleId::new(4), ["tell me more"], ["more about football"])
            .with_topic("football"),
    ]);

    engine.get_response("lets talk football", ALICE);
    let response = engine.get_response("tell me more", ALICE);
    assert_eq!(response.output, "more about football");
    assert_eq!(response.matches[0].rule_id, RuleId::new(4));

    engine.get_response("lets talk cars", ALICE);
    let response = engine.get_response("tell me more", ALICE);
    assert_eq!(response.output, "more about cars");
    assert_eq!(response.matches[0].rule_id, RuleId::new(3));
}

#[test]
fn next_topic_moves_the_conversation() {
    let engine = ResponseEngine::new();
    engine
        .set_property(PROP_PREFER_CURRENT_TOPIC, PropertyValue::Bool(true))
        .unwrap();

    engine.set_rules(vec![
        // Matching under "quiz" hands the topic over to "answers".
        Rule::new(RuleId::new(1), ["start the quiz"], ["first question"])
            .with_next_topic("quiz"),
        Rule::new(RuleId::new(2), ["go on"], ["next question"])
            .with_topic("quiz")
            .with_next_topic("answers"),
        Rule::new(RuleId::new(3), ["go on"], ["the answers"]).with_topic("answers"),
    ]);

    engine.get_response("start the quiz", ALICE);
    assert_eq!(engine.get_response("go on", ALICE).output, "next question");
    assert_eq!(engine.get_response("go on", ALICE).output, "the answers");
}

#[test]
fn topics_tracked_per_partner() {
    let engine = ResponseEngine::new();
    engine
        .set_property(PROP_PREFER_CURRENT_TOPIC, PropertyValue::Bool(true))
        .unwrap();

    engine.set_rules(vec![
        Rule::new(RuleId::new(1), ["lets talk cars"], ["ok"]).with_topic("cars"),
        Rule::new(RuleId::new(2), ["lets talk football"], ["ok"]).with_topic("football"),
        Rule::new(RuleId::new(3), ["tell me more"], ["about cars"]).with_topic("cars"),
        Rule::new(RuleId::new(4), ["tell me more"], ["about football"]).with_topic("football"),
    ]);

    engine.get_response("lets talk cars", ALICE);
    engine.get_response("lets talk football", BOB);

    assert_eq!(engine.get_response("tell me more", ALICE).output, "about cars");
    assert_eq!(
        engine.get_response("tell me more", BOB).output,
        "about football"
    );
}

#[test]
fn sequential_rotation_is_deterministic() {
    let engine = ResponseEngine::new();
    sequential(&engine);
    engine.set_rules(vec![Rule::new(
        RuleId::new(1),
        ["hello"],
        ["O0", "O1", "O2"],
    )]);

    let drawn: Vec<String> = (0..7)
        .map(|_| engine.get_response("hello", ANY_TARGET).output)
        .collect();
    assert_eq!(drawn, ["O0", "O1", "O2", "O0", "O1", "O2", "O0"]);
}

#[test]
fn random_rotation_covers_outputs_without_immediate_repeats() {
    let engine = ResponseEngine::new();
    engine.set_rules(vec![Rule::new(
        RuleId::new(1),
        ["hello"],
        ["O0", "O1", "O2"],
    )]);

    let mut previous = String::new();
    let mut cycles = Vec::new();
    for _ in 0..15 {
        let mut cycle = Vec::new();
        for _ in 0..3 {
            let output = engine.get_response("hello", ANY_TARGET).output;
            assert!(!output.is_empty());
            assert_ne!(output, previous, "repeated output across consecutive calls");
            previous = output.clone();
            cycle.push(output);
        }
        let mut sorted = cycle.clone();
        sorted.sort();
        assert_eq!(sorted, ["O0", "O1", "O2"], "cycle missed an output");
        cycles.push(cycle);
    }

    let distinct: HashSet<_> = cycles.iter().collect();
    assert!(distinct.len() > 1, "rotation collapsed into a fixed sequence");
}

#[test]
fn no_match_is_idempotent() {
    let engine = ResponseEngine::new();
    engine.set_rules(vec![Rule::new(RuleId::new(1), ["hello"], ["hey"])]);

    for _ in 0..5 {
        let response = engine.get_response("completely unrelated", ANY_TARGET);
        assert!(response.output.is_empty());
        assert!(response.matches.is_empty());
    }
}

#[test]
fn redirect_cycle_terminates_with_empty_response() {
    let engine = ResponseEngine::new();
    engine.set_rules(vec![
        Rule::new(RuleId::new(1), ["ping"], [Rule::redirect("pong")]),
        Rule::new(RuleId::new(2), ["pong"], [Rule::redirect("ping")]),
    ]);

    // A -> B -> A never hangs; the depth bound turns it into a no-match.
    let response = engine.get_response("ping", ANY_TARGET);
    assert!(response.output.is_empty());
    assert!(response.matches.is_empty());
}

#[test]
fn redirect_chain_within_bound_resolves() {
    let engine = ResponseEngine::new();
    engine.set_rules(vec![
        Rule::new(RuleId::new(1), ["good morning"], [Rule::redirect("greetings")]),
        Rule::new(RuleId::new(2), ["greetings"], [Rule::redirect("hello")]),
        Rule::new(RuleId::new(3), ["hello"], ["hi there"]),
    ]);

    let response = engine.get_response("good morning", ANY_TARGET);
    assert_eq!(response.output, "hi there");
    assert_eq!(response.matches, vec![Match::new(RuleId::new(3), 0)]);
}

#[test]
fn replacement_resets_rotation_and_is_all_or_nothing() {
    let engine = ResponseEngine::new();
    sequential(&engine);
    engine.set_rules(vec![Rule::new(RuleId::new(1), ["hello"], ["old A", "old B"])]);

    assert_eq!(engine.get_response("hello", ANY_TARGET).output, "old A");
    assert_eq!(engine.get_response("hello", ANY_TARGET).output, "old B");

    engine.set_rules(vec![Rule::new(RuleId::new(1), ["hello"], ["new A", "new B"])]);

    // Cursor was cleared with the old set; the new list starts from its head.
    assert_eq!(engine.get_response("hello", ANY_TARGET).output, "new A");
}

#[test]
fn replacement_is_atomic_under_concurrency() {
    let engine = Arc::new(ResponseEngine::new());
    engine.set_rules(vec![Rule::new(RuleId::new(1), ["hello"], ["from set one"])]);

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..200 {
                engine.set_rules(vec![Rule::new(RuleId::new(2), ["hello"], ["from set two"])]);
                engine.set_rules(vec![Rule::new(RuleId::new(1), ["hello"], ["from set one"])]);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..200 {
                    let response = engine.get_response("hello", ANY_TARGET);
                    // Every observed response is consistent with exactly one
                    // rule-set version.
                    match response.output.as_str() {
                        "from set one" => {
                            assert_eq!(response.matches[0].rule_id, RuleId::new(1));
                        }
                        "from set two" => {
                            assert_eq!(response.matches[0].rule_id, RuleId::new(2));
                        }
                        other => panic!("unexpected output: {other}"),
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn match_identity_reports_input_variant() {
    let engine = ResponseEngine::new();
    engine.set_rules(vec![Rule::new(
        RuleId::new(7),
        ["hello", "hi", "hey"],
        ["greeting"],
    )]);

    let response = engine.get_response("hi", ANY_TARGET);
    assert_eq!(response.matches, vec![Match::new(RuleId::new(7), 1)]);
}

#[test]
fn default_sanitizer_normalizes_end_to_end() {
    let engine = ResponseEngine::with_sanitizer(Box::new(DefaultSanitizer));
    engine.set_rules(vec![
        Rule::new(RuleId::new(1), ["Hello"], ["hey"]),
        Rule::new(RuleId::new(6), ["¿Cuál es tu barrio?"], ["Palermo"]),
    ]);

    for input in ["Hello", "hello", "HELLO", "HELLO,", "HELLO;!?"] {
        let response = engine.get_response(input, ANY_TARGET);
        assert_eq!(response.output, "hey", "input {input:?} failed to match");
    }

    assert_eq!(
        engine.get_response("CUAL ES TU BARRIO", ANY_TARGET).output,
        "Palermo"
    );
}

#[test]
fn lemmatizer_applies_to_input_and_patterns() {
    struct StemEd;
    impl Lemmatizer for StemEd {
        fn lemmatize(&self, text: &str) -> String {
            text.split_whitespace()
                .map(|w| w.strip_suffix("ed").unwrap_or(w))
                .collect::<Vec<_>>()
                .join(" ")
        }
    }

    let engine = ResponseEngine::with_pipeline(
        Box::new(DefaultSanitizer),
        Box::new(StemEd),
        Box::new(parlance::NullSanitizer),
    );
    engine.set_rules(vec![Rule::new(
        RuleId::new(1),
        ["you walked here"],
        ["indeed"],
    )]);

    // Both the pattern and the input reduce to "you walk here".
    assert_eq!(engine.get_response("You walk here!", ANY_TARGET).output, "indeed");
    assert_eq!(engine.get_response("you walked here", ANY_TARGET).output, "indeed");
}

#[test]
fn rule_set_loads_from_json_fixture() {
    let fixture = r#"[
        {"id": 1, "inputs": ["hello", "hi *"], "outputs": ["Hey!"],
         "targets": ["alice@example.org"]},
        {"id": 2, "inputs": ["* cars *"], "outputs": ["I love cars"],
         "topic": "cars"}
    ]"#;

    let rules: Vec<Rule> = serde_json::from_str(fixture).unwrap();
    let engine = ResponseEngine::new();
    engine.set_rules(rules);

    assert_eq!(engine.get_response("hello", ALICE).output, "Hey!");
    assert_eq!(
        engine.get_response("those cars are fast", ANY_TARGET).output,
        "I love cars"
    );
}
