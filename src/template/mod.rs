//! spec §4.6 Template Renderer & Parser: the label-column record editor used
//! by VAA and TCA grammars.

use crate::grammar::{Grammar, Template, TemplateField};
use crate::tokenizer::template::split_label;

/// Holds one value per [`TemplateField`] plus which field is focused, and
/// renders/parses between that and the record's flat text form.
#[derive(Debug, Clone)]
pub struct TemplateState {
    identifier: String,
    fields: Vec<TemplateField>,
    values: Vec<String>,
    label_column_width: usize,
    focus: usize,
}

impl TemplateState {
    /// `None` if `grammar` has no template (spec §4.6 `initialize(template,
    /// identifier)`); the identifier is `grammar.identifier`'s first entry,
    /// rendered and expected back as line 0.
    pub fn initialize(grammar: &Grammar) -> Option<Self> {
        let Template { fields, label_column_width } = grammar.template.clone()?;
        let values = vec![String::new(); fields.len()];
        Some(TemplateState {
            identifier: grammar.identifier.first().cloned().unwrap_or_default(),
            fields,
            values,
            label_column_width,
            focus: 0,
        })
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, index: usize) -> Option<&TemplateField> {
        self.fields.get(index)
    }

    pub fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or_default()
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value.into();
        }
    }

    pub fn focused(&self) -> usize {
        self.focus
    }

    pub fn focus_next(&mut self) {
        if self.focus + 1 < self.fields.len() {
            self.focus += 1;
        }
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.saturating_sub(1);
    }

    /// Renders the current values back into the label-column record form:
    /// the identifier on line 0, then every field's label padded to
    /// `label_column_width` (spec §4.6 `generateText`).
    pub fn generate_text(&self) -> String {
        let mut lines = vec![self.identifier.clone()];
        lines.extend(self.fields.iter().zip(&self.values).map(|(field, value)| {
            let label = format!("{}:", field.label);
            format!("{label:<width$}{value}", width = self.label_column_width)
        }));
        lines.join("\n")
    }

    /// Parses `text` back into field values by label, appending continuation
    /// lines to whichever field a multiline field last matched (spec §4.6
    /// `parseText`). Line 0 is the identifier and is skipped. Unrecognized
    /// labels and text before the first label are ignored.
    pub fn parse_text(&mut self, text: &str) {
        let mut current: Option<usize> = None;

        for line in text.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            if let Some((label, value)) = split_label(line) {
                if let Some(index) = self
                    .fields
                    .iter()
                    .position(|field| field.label.eq_ignore_ascii_case(label))
                {
                    self.values[index] = value.to_string();
                    current = Some(index);
                    continue;
                }
            }
            if let Some(index) = current {
                if self.fields[index].multiline {
                    self.values[index].push(' ');
                    self.values[index].push_str(line.trim());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::document::{GrammarDocument, TemplateDoc, TemplateFieldDoc};
    use indexmap::IndexMap;

    fn grammar_with_template() -> Grammar {
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
    fn round_trips_render_and_parse() {
        let grammar = grammar_with_template();
        let mut state = TemplateState::initialize(&grammar).unwrap();
        state.set_value(0, "TOKYO");
        state.set_value(1, "ASH CLOUD MOVING NORTHEAST");

        let text = state.generate_text();
        assert_eq!(text.lines().next(), Some("VA ADVISORY"));

        let mut reparsed = TemplateState::initialize(&grammar).unwrap();
        reparsed.parse_text(&text);

        assert_eq!(reparsed.value(0), "TOKYO");
        assert_eq!(reparsed.value(1), "ASH CLOUD MOVING NORTHEAST");
    }

    #[test]
    fn continuation_lines_extend_multiline_field() {
        let grammar = grammar_with_template();
        let mut state = TemplateState::initialize(&grammar).unwrap();
        state.parse_text("VA ADVISORY\nVAAC:     TOKYO\nREMARKS:  ASH CLOUD MOVING\nNORTHEAST AT 20KT");

        assert_eq!(state.value(0), "TOKYO");
        assert_eq!(state.value(1), "ASH CLOUD MOVING NORTHEAST AT 20KT");
    }

    #[test]
    fn identifier_line_is_skipped_even_if_it_looks_like_a_label() {
        let grammar = grammar_with_template();
        let mut state = TemplateState::initialize(&grammar).unwrap();
        state.parse_text("VAAC: NOT A FIELD\nVAAC:     TOKYO");

        assert_eq!(state.value(0), "TOKYO");
    }

    #[test]
    fn focus_moves_within_bounds() {
        let grammar = grammar_with_template();
        let mut state = TemplateState::initialize(&grammar).unwrap();
        assert_eq!(state.focused(), 0);
        state.focus_previous();
        assert_eq!(state.focused(), 0);
        state.focus_next();
        assert_eq!(state.focused(), 1);
        state.focus_next();
        assert_eq!(state.focused(), 1);
    }
}
