//! Acronym-expanded view of a sentence.

use crate::error::MatcherResult;
use crate::model::{Sentence, Span};

/// A sentence's text with every acronym replaced by its expansion.
///
/// Built once per sentence. Token `i` of the sentence occupies
/// `spans()[i]` in [`text`](Self::text), so a window of tokens maps to the
/// edited text without recomputing offsets. Text between tokens is carried
/// over verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedSentence {
    text: String,
    spans: Vec<Span>,
    edited: Vec<bool>,
}

impl EditedSentence {
    /// Builds the edited view over `doc_text`, the text the sentence's
    /// spans address. Fails like [`Sentence::validate`] when they do not fit it.
    pub fn new(doc_text: &str, sentence: &Sentence) -> MatcherResult<Self> {
        sentence.validate(doc_text)?;
        let mut text = String::with_capacity(sentence.span.len());
        let mut spans = Vec::with_capacity(sentence.tokens.len());
        let mut edited = Vec::with_capacity(sentence.tokens.len());
        let mut cursor = sentence.span.begin;

        for token in &sentence.tokens {
            text.push_str(&doc_text[cursor..token.span.begin]);
            let begin = text.len();
            match &token.acronym_expansion {
                Some(expansion) => {
                    text.push_str(expansion);
                    edited.push(true);
                }
                None => {
                    text.push_str(&doc_text[token.span.begin..token.span.end]);
                    edited.push(false);
                }
            }
            spans.push(Span::new(begin, text.len()));
            cursor = token.span.end;
        }
        text.push_str(&doc_text[cursor..sentence.span.end]);

        Ok(Self { text, spans, edited })
    }

    /// The edited text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Per-token spans over the edited text.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// True if token `index` was replaced by an expansion.
    pub fn is_edited(&self, index: usize) -> bool {
        self.edited.get(index).copied().unwrap_or(false)
    }

    /// True if any token in `from..to` was replaced.
    pub fn any_edited(&self, from: usize, to: usize) -> bool {
        self.edited[from..to].iter().any(|&e| e)
    }

    /// Edited text covering tokens `from..to`.
    pub fn window_text(&self, from: usize, to: usize) -> &str {
        &self.text[self.spans[from].begin..self.spans[to - 1].end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Token;

    fn sentence(text: &str, tagged: &[(&str, &str)]) -> Sentence {
        Sentence::from_tagged(text, tagged).unwrap()
    }

    #[test]
    fn test_unedited_sentence_is_identical() {
        let text = "Acute  chest pain.";
        let s = sentence(text, &[("Acute", "JJ"), ("chest", "NN"), ("pain", "NN"), (".", ".")]);
        let view = EditedSentence::new(text, &s).unwrap();

        assert_eq!(view.text(), text);
        assert_eq!(view.spans()[1], s.tokens[1].span);
        assert!(!view.any_edited(0, 4));
        assert_eq!(view.window_text(1, 3), "chest pain");
    }

    #[test]
    fn test_expansion_shifts_later_tokens() {
        let text = "Pt has CHF and DM today";
        let mut s = sentence(
            text,
            &[("Pt", "NN"), ("has", "VBZ"), ("CHF", "NN"), ("and", "CC"), ("DM", "NN"), ("today", "NN")],
        );
        s.tokens[2] = s.tokens[2].clone().with_acronym_expansion("congestive heart failure");
        s.tokens[4] = s.tokens[4].clone().with_acronym_expansion("diabetes mellitus");
        let view = EditedSentence::new(text, &s).unwrap();

        assert_eq!(
            view.text(),
            "Pt has congestive heart failure and diabetes mellitus today"
        );
        assert_eq!(view.window_text(2, 3), "congestive heart failure");
        assert_eq!(view.window_text(4, 6), "diabetes mellitus today");
        assert_eq!(view.window_text(0, 2), "Pt has");
        assert!(view.is_edited(2));
        assert!(!view.is_edited(3));
        assert!(!view.is_edited(99));
        assert!(view.any_edited(3, 5));
        assert!(!view.any_edited(5, 6));
    }

    #[test]
    fn test_spans_outside_text_rejected() {
        let s = Sentence::new(Span::new(0, 12), vec![Token::new(Span::new(0, 12), "NN")]);
        assert!(EditedSentence::new("short", &s).is_err());

        let s = Sentence::new(Span::new(0, 2), vec![Token::new(Span::new(0, 1), "NN")]);
        assert!(EditedSentence::new("é", &s).is_err());
    }

    #[test]
    fn test_sentence_inside_larger_document() {
        let text = "Intro. COVID confirmed. Done.";
        let s = Sentence::new(
            Span::new(7, 23),
            vec![
                Token::new(Span::new(7, 12), "NN").with_acronym_expansion("coronavirus disease 2019"),
                Token::new(Span::new(13, 22), "VBN"),
                Token::new(Span::new(22, 23), "."),
            ],
        );
        let view = EditedSentence::new(text, &s).unwrap();

        assert_eq!(view.text(), "coronavirus disease 2019 confirmed.");
        assert_eq!(view.spans()[0], Span::new(0, 24));
        assert_eq!(view.window_text(0, 2), "coronavirus disease 2019 confirmed");
    }
}
