//! Template mode (spec §4.2): the record formats (VAA, TCA) open with an
//! identifier line, then lay out fields as `LABEL: value` lines, with
//! unindented-but-colonless lines treated as a continuation of the previous
//! field's value. The emitted token sequence is: the identifier line (kind
//! `"identifier"`), then per field: leading whitespace, the label including
//! its colon (kind = the field's `label_kind`), inter-column whitespace, and
//! the value — a single token (kind = the field's `value_kind`) if the whole
//! value matches that token definition, otherwise word-tokenized the same
//! way line mode does. [`split_label`] is reused by [`crate::template`] for
//! the structured label/value parsing used for editing.

use crate::grammar::{Grammar, TemplateField};

use super::{classify_span, RawToken};

pub fn tokenize(text: &str, grammar: &Grammar) -> Vec<RawToken> {
    let fields: &[TemplateField] = grammar.template.as_ref().map(|t| t.fields.as_slice()).unwrap_or(&[]);

    let mut out = Vec::new();
    let mut offset = 0;
    let mut current_field: Option<usize> = None;

    for (line_no, line) in text.split_inclusive('\n').enumerate() {
        let (content, has_newline) = match line.strip_suffix('\n') {
            Some(stripped) => (stripped, true),
            None => (line, false),
        };
        let line_start = offset;

        if line_no == 0 {
            if !content.trim().is_empty() {
                out.push(RawToken {
                    text: content.to_string(),
                    kind: "identifier".to_string(),
                    style: None,
                    description: None,
                    start: line_start,
                    end: line_start + content.len(),
                    error: None,
                });
            } else if !content.is_empty() {
                out.push(RawToken::whitespace(content, line_start, line_start + content.len()));
            }
        } else if let Some((label, _)) = split_label(content) {
            let leading_ws = content.len() - content.trim_start().len();
            if leading_ws > 0 {
                out.push(RawToken::whitespace(&content[..leading_ws], line_start, line_start + leading_ws));
            }

            let colon = content.find(':').expect("split_label guarantees a colon");
            let label_start = line_start + leading_ws;
            let label_end = line_start + colon + 1;
            let field_index = fields.iter().position(|f| f.label.eq_ignore_ascii_case(label));
            let field = field_index.and_then(|i| fields.get(i));
            let label_kind = field.map(|f| f.label_kind.clone()).unwrap_or_else(|| "label".to_string());
            let label_def = field.and_then(|f| grammar.token(&f.label_kind));
            out.push(RawToken {
                text: content[leading_ws..colon + 1].to_string(),
                kind: label_kind,
                style: label_def.and_then(|d| d.style.clone()),
                description: label_def.map(|d| d.description.clone()),
                start: label_start,
                end: label_end,
                error: None,
            });

            let after_colon = &content[colon + 1..];
            let value_leading_ws = after_colon.len() - after_colon.trim_start().len();
            if value_leading_ws > 0 {
                out.push(RawToken::whitespace(
                    &after_colon[..value_leading_ws],
                    label_end,
                    label_end + value_leading_ws,
                ));
            }
            let value = after_colon[value_leading_ws..].trim_end();
            push_value_tokens(&mut out, value, label_end + value_leading_ws, field, grammar);
            current_field = field_index;
        } else if !content.trim().is_empty() {
            let leading_ws = content.len() - content.trim_start().len();
            if leading_ws > 0 {
                out.push(RawToken::whitespace(&content[..leading_ws], line_start, line_start + leading_ws));
            }
            let value = content[leading_ws..].trim_end();
            let field = current_field.and_then(|i| fields.get(i));
            push_value_tokens(&mut out, value, line_start + leading_ws, field, grammar);
        } else if !content.is_empty() {
            out.push(RawToken::whitespace(content, line_start, line_start + content.len()));
        }

        if has_newline {
            let nl_start = line_start + content.len();
            out.push(RawToken::whitespace("\n", nl_start, nl_start + 1));
        }

        offset += line.len();
    }

    out
}

/// Emits `value` as a single token of the field's `value_kind` when it
/// matches that token definition whole, otherwise word-tokenizes it the way
/// line mode does, preserving inter-word whitespace.
fn push_value_tokens(out: &mut Vec<RawToken>, value: &str, start: usize, field: Option<&TemplateField>, grammar: &Grammar) {
    if value.is_empty() {
        return;
    }

    if let Some(field) = field {
        if let Some(def) = grammar.token(&field.value_kind) {
            if def.matches(value) {
                out.push(RawToken {
                    text: value.to_string(),
                    kind: field.value_kind.clone(),
                    style: def.style.clone(),
                    description: Some(def.description.clone()),
                    start,
                    end: start + value.len(),
                    error: None,
                });
                return;
            }
        }
    }

    let mut idx = 0;
    while idx < value.len() {
        let rest = &value[idx..];
        let ws_len = rest.len() - rest.trim_start().len();
        if ws_len > 0 {
            out.push(RawToken::whitespace(&rest[..ws_len], start + idx, start + idx + ws_len));
            idx += ws_len;
            continue;
        }
        let word_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        out.push(classify_span(&rest[..word_len], start + idx, start + idx + word_len, grammar));
        idx += word_len;
    }
}

pub(crate) fn split_label(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let label = line[..colon].trim();
    if label.is_empty() || !label.chars().all(|c| c.is_alphanumeric() || c.is_whitespace()) {
        return None;
    }
    Some((label, line[colon + 1..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::document::{GrammarDocument, TemplateDoc, TemplateFieldDoc};
    use indexmap::IndexMap;

    fn grammar() -> Grammar {
        Grammar::from_document(GrammarDocument {
            name: "vaa".into(),
            version: None,
            description: None,
            identifier: Some(vec!["VA ADVISORY".into()]),
            extends: None,
            category: None,
            multiline: None,
            template_mode: Some(true),
            tokens: IndexMap::new(),
            structure: None,
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
                label_column_width: Some(10),
            }),
            suggestions: Default::default(),
        })
        .unwrap()
    }

    #[test]
    fn emits_identifier_line_then_label_and_value_tokens() {
        let text = "VA ADVISORY\nVAAC: TOKYO";
        let tokens = tokenize(text, &grammar());

        assert_eq!(tokens[0].kind, "identifier");
        assert_eq!(tokens[0].text, "VA ADVISORY");

        let label = tokens.iter().find(|t| t.text == "VAAC:").unwrap();
        assert_eq!(label.kind, "label");

        let value = tokens.iter().find(|t| t.text == "TOKYO").unwrap();
        assert_ne!(value.kind, "whitespace");
    }

    #[test]
    fn continuation_lines_append_to_previous_field() {
        let text = "VA ADVISORY\nREMARKS: ASH CLOUD MOVING\nNORTHEAST AT 20KT";
        let tokens = tokenize(text, &grammar());
        let words: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind != "whitespace" && t.kind != "identifier" && t.kind != "label")
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(words, vec!["ASH", "CLOUD", "MOVING", "NORTHEAST", "AT", "20KT"]);
    }

    #[test]
    fn reconstructs_source_text_byte_for_byte() {
        let text = "VA ADVISORY\nVAAC:     TOKYO\nREMARKS:  ASH CLOUD MOVING\nNORTHEAST AT 20KT\n";
        let tokens = tokenize(text, &grammar());
        let reconstructed: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(reconstructed, text);
    }
}
