//! Integration-level scenarios exercising the engine end to end, one per
//! testable property in the design notes: tokenizing a METAR skeleton,
//! reporting a missing required field, lookahead past an optional middle
//! token, a repeatable one-of starting a fresh iteration, grammar
//! inheritance by `extends`, SIGMET detection, and a VAA template
//! round-trip.

use indexmap::IndexMap;
use pretty_assertions::assert_eq;

use tac_engine::grammar::document::{
    Cardinality, GrammarDocument, StructureNode, TemplateDoc, TemplateFieldDoc, TokenDef,
};
use tac_engine::Engine;

fn pattern_token(pattern: &str, description: &str) -> TokenDef {
    TokenDef {
        pattern: Some(pattern.to_string()),
        values: None,
        style: None,
        description: description.to_string(),
    }
}

fn metar_document(name: &str, extends: Option<&str>) -> GrammarDocument {
    let mut tokens = IndexMap::new();
    tokens.insert("icao".to_string(), pattern_token("[A-Z]{4}", "ICAO code"));
    tokens.insert("time".to_string(), pattern_token(r"\d{6}Z", "Observation time"));
    tokens.insert("wind".to_string(), pattern_token(r"\d{3}\d{2,3}KT", "Wind"));
    tokens.insert("pressure".to_string(), pattern_token(r"Q\d{4}", "QNH"));

    GrammarDocument {
        name: name.to_string(),
        version: None,
        description: Some("METAR".into()),
        identifier: Some(vec!["METAR".into()]),
        extends: extends.map(str::to_string),
        category: None,
        multiline: None,
        template_mode: None,
        tokens,
        structure: Some(vec![
            StructureNode::Token { id: "icao".into(), cardinality: Cardinality::new(1, Some(1)) },
            StructureNode::Token { id: "time".into(), cardinality: Cardinality::new(1, Some(1)) },
            StructureNode::Token { id: "wind".into(), cardinality: Cardinality::new(0, Some(1)) },
            StructureNode::Token { id: "pressure".into(), cardinality: Cardinality::new(1, Some(1)) },
        ]),
        template: None,
        suggestions: Default::default(),
    }
}

#[test]
fn tokenizes_and_validates_a_complete_metar_skeleton() {
    let mut engine = Engine::new();
    engine.register_grammar(metar_document("metar", None));
    engine.resolve_grammars();
    engine.select_grammar("metar");

    let text = "LFPG 261430Z 24015KT Q1013";
    let tokens = engine.tokenize(text);
    assert_eq!(tokens.len(), 4);

    for token in &tokens {
        let classification = engine.classify(&token.text).expect("known token");
        assert!(engine.try_match(&classification.kind));
    }

    let report = engine.validate(text).unwrap();
    assert!(report.is_valid());
}

#[test]
fn reports_missing_required_pressure_group() {
    let mut engine = Engine::new();
    engine.register_grammar(metar_document("metar", None));
    engine.resolve_grammars();
    engine.select_grammar("metar");

    let report = engine.validate("LFPG 261430Z 24015KT").unwrap();
    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.diagnostics[0].message().contains("pressure"));
}

#[test]
fn skips_optional_wind_group_and_still_matches_pressure() {
    let mut engine = Engine::new();
    engine.register_grammar(metar_document("metar", None));
    engine.resolve_grammars();
    engine.select_grammar("metar");

    let report = engine.validate("LFPG 261430Z Q1013").unwrap();
    assert!(report.is_valid());
}

#[test]
fn repeatable_one_of_accepts_a_second_iteration() {
    let mut tokens = IndexMap::new();
    tokens.insert("a".to_string(), pattern_token("A", "a"));
    tokens.insert("b".to_string(), pattern_token("B", "b"));

    let document = GrammarDocument {
        name: "alt".into(),
        version: None,
        description: None,
        identifier: Some(vec!["ALT".into()]),
        extends: None,
        category: None,
        multiline: None,
        template_mode: None,
        tokens,
        structure: Some(vec![StructureNode::OneOf {
            children: vec![
                StructureNode::Token { id: "a".into(), cardinality: Cardinality::new(1, Some(1)) },
                StructureNode::Token { id: "b".into(), cardinality: Cardinality::new(1, Some(1)) },
            ],
            cardinality: Cardinality::new(1, None),
        }]),
        template: None,
        suggestions: Default::default(),
    };

    let mut engine = Engine::new();
    engine.register_grammar(document);
    engine.resolve_grammars();
    engine.select_grammar("alt");

    assert!(engine.try_match("a"));
    assert!(engine.expected_token_ids().contains("b"));
    assert!(engine.try_match("b"));
    assert!(engine.expected_token_ids().contains("a"));
}

#[test]
fn child_grammar_inherits_parent_tokens_and_structure() {
    let mut speci = GrammarDocument {
        name: "speci".into(),
        version: None,
        description: None,
        identifier: Some(vec!["SPECI".into()]),
        extends: Some("metar".into()),
        category: None,
        multiline: None,
        template_mode: None,
        tokens: IndexMap::new(),
        structure: None,
        template: None,
        suggestions: Default::default(),
    };
    // SPECI adds no tokens of its own; everything should fall back to METAR's.
    speci.tokens.clear();

    let mut engine = Engine::new();
    engine.register_grammar(metar_document("metar", None));
    engine.register_grammar(speci);
    engine.resolve_grammars();

    engine.select_grammar("speci");
    let report = engine.validate("LFPG 261430Z 24015KT Q1013").unwrap();
    assert!(report.is_valid());
}

#[test]
fn detects_sigmet_with_fir_prefix() {
    let mut tokens = IndexMap::new();
    tokens.insert("fir".to_string(), pattern_token("[A-Z]{4}", "FIR code"));

    let document = GrammarDocument {
        name: "sigmet-ws".into(),
        version: None,
        description: None,
        identifier: Some(vec!["SIGMET".into()]),
        extends: None,
        category: None,
        multiline: Some(true),
        template_mode: None,
        tokens,
        structure: Some(vec![StructureNode::Token {
            id: "fir".into(),
            cardinality: Cardinality::new(1, Some(1)),
        }]),
        template: None,
        suggestions: Default::default(),
    };

    let mut engine = Engine::new();
    engine.register_grammar(document);
    engine.resolve_grammars();

    assert_eq!(
        engine.detect("LFFF SIGMET 1 VALID 010000/010400 LFFF-"),
        Some("sigmet-ws".to_string())
    );
}

#[test]
fn suggestion_builder_suppresses_glued_suffix_already_present() {
    use indexmap::IndexMap as Map;
    use tac_engine::grammar::document::{AfterEntry, SuggestionDeclaration, SuggestionsDoc};

    let mut document = metar_document("metar", None);
    let mut after: Map<String, Vec<AfterEntry>> = Map::new();
    after.insert(
        "cloud".to_string(),
        vec![AfterEntry::Inline(SuggestionDeclaration {
            id: Some("cb".to_string()),
            text: Some("CB".to_string()),
            ..Default::default()
        })],
    );
    document.suggestions = SuggestionsDoc { declarations: Vec::new(), after };

    let mut engine = Engine::new();
    engine.register_grammar(document);
    engine.resolve_grammars();
    engine.select_grammar("metar");

    assert!(!engine
        .get_suggestions_for_token_type(Some("cloud"), None, None)
        .is_empty());
    assert!(engine
        .get_suggestions_for_token_type(Some("cloud"), Some("FEW030CB"), None)
        .is_empty());
}

#[test]
fn get_suggestions_replays_text_up_to_cursor_without_mutating_engine_tracker() {
    let mut engine = Engine::new();
    engine.register_grammar(metar_document("metar", None));
    engine.resolve_grammars();
    engine.select_grammar("metar");

    let text = "LFPG 261430Z 24015KT Q1013";
    let _ = engine.get_suggestions(text, text.len(), None);
    // The scratch tracker used by `get_suggestions` must not leak into the
    // engine's own tracker: nothing has been matched through `try_match`.
    assert!(engine.expected_token_ids().contains("icao"));
    assert_eq!(engine.get_grammar_names(), vec!["metar".to_string()]);
}

#[test]
fn vaa_template_round_trips_through_render_and_parse() {
    let document = GrammarDocument {
        name: "vaa".into(),
        version: None,
        description: None,
        identifier: Some(vec!["VA ADVISORY".into()]),
        extends: None,
        category: None,
        multiline: None,
        template_mode: Some(true),
        tokens: IndexMap::new(),
        structure: Some(Vec::new()),
        template: Some(TemplateDoc {
            fields: vec![
                TemplateFieldDoc {
                    label: "VAAC".into(),
                    label_kind: "label".into(),
                    value_kind: "text".into(),
                    required: true,
                    multiline: false,
                    placeholder: None,
                    suggestion_refs: Vec::new(),
                },
                TemplateFieldDoc {
                    label: "REMARKS".into(),
                    label_kind: "label".into(),
                    value_kind: "text".into(),
                    required: false,
                    multiline: true,
                    placeholder: None,
                    suggestion_refs: Vec::new(),
                },
            ],
            label_column_width: Some(12),
        }),
        suggestions: Default::default(),
    };

    let mut engine = Engine::new();
    engine.register_grammar(document);
    engine.resolve_grammars();
    engine.select_grammar("vaa");

    let mut state = engine.template_state().expect("template grammar");
    state.set_value(0, "TOKYO");
    state.set_value(1, "ASH CLOUD OBSERVED MOVING NORTHEAST");
    let rendered = state.generate_text();
    assert_eq!(rendered.lines().next(), Some("VA ADVISORY"));

    let mut reparsed = engine.template_state().expect("template grammar");
    reparsed.parse_text(&rendered);
    assert_eq!(reparsed.value(0), "TOKYO");
    assert_eq!(reparsed.value(1), "ASH CLOUD OBSERVED MOVING NORTHEAST");
}
