//! Sliding-window concept matcher.

use tracing::{debug, trace, warn};

use crate::config::MatcherConfig;
use crate::edit::EditedSentence;
use crate::error::MatcherResult;
use crate::model::{ConceptAnnotation, Document, Sentence, Span, TermAnnotation, Token};
use crate::result::{MatchOutput, MatchStats};
use crate::strategy::{StrategyOutcome, Window};
use crate::traits::{ConceptLookup, Normalizer};

/// Source name used for rows whose source id is not in the source table.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Resolves token windows to dictionary concepts.
///
/// For every token that can start a concept, windows of 1 to
/// `window_size` tokens are tried against the configured strategy
/// cascade. A window that matches emits one [`ConceptAnnotation`] per
/// dictionary row and one [`TermAnnotation`]; later and longer windows are
/// still tried, so annotations may overlap.
///
/// The matcher holds no state between calls and can be shared across
/// threads.
///
/// # Example
///
/// ```ignore
/// use umls_concept_matcher::{ConceptMatcher, Document, Sentence};
/// use umls_dictionary::{ConceptDictionary, DictionaryConfig};
///
/// let dictionary = ConceptDictionary::open("/data/dictionary", DictionaryConfig::in_memory())?;
/// let matcher = ConceptMatcher::new(&dictionary);
///
/// let doc = Document::new("Chest pain since Monday.");
/// let sentence = Sentence::from_tagged(&doc.text, &[
///     ("Chest", "NN"), ("pain", "NN"), ("since", "IN"), ("Monday", "NNP"), (".", "."),
/// ])?;
/// let output = matcher.match_document(&doc, &[sentence])?;
/// for concept in &output.concepts {
///     println!("{} {} {:.1}", concept.span, concept.cui, concept.score);
/// }
/// ```
pub struct ConceptMatcher<'a> {
    lookup: &'a dyn ConceptLookup,
    normalizer: Option<&'a dyn Normalizer>,
    config: MatcherConfig,
}

impl<'a> ConceptMatcher<'a> {
    /// Creates a matcher with default configuration.
    pub fn new(lookup: &'a dyn ConceptLookup) -> Self {
        Self::with_config(lookup, MatcherConfig::default())
    }

    /// Creates a matcher with custom configuration.
    pub fn with_config(lookup: &'a dyn ConceptLookup, config: MatcherConfig) -> Self {
        Self {
            lookup,
            normalizer: None,
            config,
        }
    }

    /// Uses `normalizer` for per-token normalized forms.
    pub fn with_normalizer(mut self, normalizer: &'a dyn Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Returns a reference to the matcher configuration.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Matches every window of one sentence. Spans in the output address
    /// `text`, the document text the sentence's spans refer to.
    pub fn match_sentence(&self, text: &str, sentence: &Sentence) -> MatcherResult<MatchOutput> {
        let edited = EditedSentence::new(text, sentence)?;
        let mut output = MatchOutput::new();
        output.stats.sentences = 1;

        let tokens = &sentence.tokens;
        if tokens.is_empty() {
            return Ok(output);
        }
        let words: Vec<&str> = tokens
            .iter()
            .map(|t| &text[t.span.begin..t.span.end])
            .collect();
        let norms: Vec<String> = tokens
            .iter()
            .zip(&words)
            .map(|(token, word)| self.normalize(word, token))
            .collect();
        let excluded: Vec<bool> = norms
            .iter()
            .zip(&words)
            .map(|(norm, word)| self.config.is_stopword(norm) || is_punctuation(word))
            .collect();
        let can_bound: Vec<bool> = tokens
            .iter()
            .zip(&excluded)
            .map(|(token, &excluded)| !excluded && !self.config.is_trivial_pos(&token.pos))
            .collect();

        for from in 0..tokens.len() {
            if !can_bound[from] {
                continue;
            }
            let last = (from + self.config.window_size).min(tokens.len());
            for to in from + 1..=last {
                if !can_bound[to - 1] {
                    continue;
                }
                if tokens[from..to]
                    .iter()
                    .all(|t| self.config.is_trivial_pos(&t.pos))
                {
                    continue;
                }
                let span = Span::new(tokens[from].span.begin, tokens[to - 1].span.end);
                let window = Window {
                    text: &text[span.begin..span.end],
                    edited_text: edited.window_text(from, to),
                    token_count: to - from,
                    edited: edited.any_edited(from, to),
                    last_pos: &tokens[to - 1].pos,
                    norms: &norms[from..to],
                    excluded: &excluded[from..to],
                };
                output.stats.windows += 1;
                self.match_window(span, &window, &mut output)?;
            }
        }

        debug!(
            sentence = %sentence.span,
            tokens = tokens.len(),
            windows = output.stats.windows,
            concepts = output.concepts.len(),
            "matched sentence"
        );
        Ok(output)
    }

    /// Matches every sentence of a document and concatenates the outputs.
    pub fn match_document(
        &self,
        document: &Document,
        sentences: &[Sentence],
    ) -> MatcherResult<MatchOutput> {
        let mut output = MatchOutput::new();
        for sentence in sentences {
            output.extend(self.match_sentence(&document.text, sentence)?);
        }
        debug!(
            sentences = sentences.len(),
            concepts = output.concepts.len(),
            terms = output.terms.len(),
            "matched document"
        );
        Ok(output)
    }

    /// Matches independent documents. With the `parallel` feature and
    /// [`MatcherConfig::parallel`] set, documents are spread over the rayon
    /// pool; results keep the input order either way.
    pub fn match_documents(
        &self,
        documents: &[(Document, Vec<Sentence>)],
    ) -> Vec<MatcherResult<MatchOutput>> {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            use rayon::prelude::*;
            return documents
                .par_iter()
                .map(|(document, sentences)| self.match_document(document, sentences))
                .collect();
        }
        documents
            .iter()
            .map(|(document, sentences)| self.match_document(document, sentences))
            .collect()
    }

    /// Normalized form of a token: the normalizer's answer, else the
    /// token's own label, else the lowercase word.
    fn normalize(&self, word: &str, token: &Token) -> String {
        self.normalizer
            .and_then(|n| n.normalize(word, &token.pos))
            .or_else(|| token.norm.clone())
            .unwrap_or_else(|| word.to_lowercase())
    }

    fn match_window(
        &self,
        span: Span,
        window: &Window<'_>,
        output: &mut MatchOutput,
    ) -> MatcherResult<()> {
        for &strategy in &self.config.strategies {
            let outcome = strategy.apply(window, self.lookup, &self.config)?;
            if outcome.looked_up() {
                output.stats.lookups += 1;
            }
            let StrategyOutcome::Hit(rows) = outcome else {
                continue;
            };

            trace!(%span, %strategy, rows = rows.len(), "window matched");
            output.stats.record_hit(strategy);
            let score = self.config.score(strategy);
            for row in rows {
                let source = self.source_name(row.source(), &mut output.stats)?;
                output.concepts.push(ConceptAnnotation {
                    span,
                    sui: row.sui(),
                    cui: row.cui(),
                    tui: row.tui(),
                    source,
                    code: row.code().to_string(),
                    score,
                    strategy,
                });
            }
            output.terms.push(TermAnnotation { span });
            return Ok(());
        }
        Ok(())
    }

    fn source_name(&self, id: i32, stats: &mut MatchStats) -> MatcherResult<String> {
        match self.lookup.source(id)? {
            Some(name) => Ok(name),
            None => {
                warn!(source_id = id, "unknown source id");
                stats.unknown_sources += 1;
                Ok(UNKNOWN_SOURCE.to_string())
            }
        }
    }
}

/// True if `word` has no letters or digits.
fn is_punctuation(word: &str) -> bool {
    word.chars().all(|c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::MatchStrategy;
    use crate::testing::MapLookup;
    use umls_concepts::{ConceptRow, Cui, Sui, Tui};

    fn row(cui: u32, source: i32) -> ConceptRow {
        ConceptRow::new(Sui::new(cui + 100), Cui::new(cui), Tui::new(47), source, "X1")
    }

    fn lookup() -> MapLookup {
        let mut lookup = MapLookup::default();
        lookup.add_source("MSH");
        lookup
    }

    fn run(matcher: &ConceptMatcher<'_>, text: &str, tagged: &[(&str, &str)]) -> MatchOutput {
        let sentence = Sentence::from_tagged(text, tagged).unwrap();
        matcher.match_sentence(text, &sentence).unwrap()
    }

    #[test]
    fn test_exact_match_scores_one() {
        let mut lookup = lookup();
        lookup.phrase("COVID-19", vec![row(5, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let output = run(&matcher, "COVID-19", &[("COVID-19", "NN")]);
        assert_eq!(output.concepts.len(), 1);
        let concept = &output.concepts[0];
        assert_eq!(concept.score, 1.0);
        assert_eq!(concept.cui, Cui::new(5));
        assert_eq!(concept.source, "MSH");
        assert_eq!(concept.code, "X1");
        assert_eq!(concept.strategy, MatchStrategy::Exact);
        assert_eq!(output.terms, vec![TermAnnotation { span: Span::new(0, 8) }]);
    }

    #[test]
    fn test_lowercase_only_for_multi_token_windows() {
        let mut lookup = lookup();
        lookup.lowercase("fever", vec![row(1, 0)]);
        lookup.lowercase("high fever", vec![row(2, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let output = run(&matcher, "Fever", &[("Fever", "NN")]);
        assert!(output.is_empty());

        let output = run(&matcher, "High Fever", &[("High", "JJ"), ("Fever", "NN")]);
        assert_eq!(output.concepts.len(), 1);
        assert_eq!(output.concepts[0].cui, Cui::new(2));
        assert_eq!(output.concepts[0].score, 0.6);
        assert_eq!(output.concepts[0].span, Span::new(0, 10));
    }

    #[test]
    fn test_acronym_expansion_is_penalized() {
        let mut lookup = lookup();
        lookup.phrase("coronavirus disease 2019", vec![row(9, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let text = "COVID confirmed";
        let mut sentence = Sentence::from_tagged(text, &[("COVID", "NN"), ("confirmed", "VBN")]).unwrap();
        sentence.tokens[0] = sentence.tokens[0]
            .clone()
            .with_acronym_expansion("coronavirus disease 2019");
        let output = matcher.match_sentence(text, &sentence).unwrap();

        assert_eq!(output.concepts.len(), 1);
        let concept = &output.concepts[0];
        assert!((concept.score - 0.9).abs() < 1e-9);
        assert_eq!(concept.strategy, MatchStrategy::EditedExact);
        assert_eq!(concept.span, Span::new(0, 5));
    }

    #[test]
    fn test_edited_lowercase_scores() {
        let mut lookup = lookup();
        lookup.lowercase("congestive heart failure exacerbation", vec![row(3, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let text = "CHF exacerbation";
        let mut sentence = Sentence::from_tagged(text, &[("CHF", "NN"), ("exacerbation", "NN")]).unwrap();
        sentence.tokens[0] = sentence.tokens[0]
            .clone()
            .with_acronym_expansion("Congestive heart failure");
        let output = matcher.match_sentence(text, &sentence).unwrap();

        assert_eq!(output.concepts.len(), 1);
        assert!((output.concepts[0].score - 0.5).abs() < 1e-9);
        assert_eq!(output.concepts[0].span, Span::new(0, 16));
    }

    #[test]
    fn test_norms_match_is_order_independent() {
        let mut lookup = lookup();
        lookup.norm("brown fox", vec![row(4, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let a = run(&matcher, "brown fox", &[("brown", "JJ"), ("fox", "NN")]);
        let b = run(&matcher, "fox brown", &[("fox", "NN"), ("brown", "JJ")]);
        assert_eq!(a.concepts.len(), 1);
        assert_eq!(a.concepts[0].score, 0.3);
        assert_eq!(a.concepts[0].strategy, MatchStrategy::Norms);
        assert_eq!(a.concepts[0].cui, b.concepts[0].cui);
        assert_eq!(a.concepts[0].score, b.concepts[0].score);
    }

    #[test]
    fn test_norms_bag_skips_inner_stopwords() {
        let mut lookup = lookup();
        lookup.norm("chest pain", vec![row(6, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let output = run(
            &matcher,
            "pain in the chest",
            &[("pain", "NN"), ("in", "IN"), ("the", "DT"), ("chest", "NN")],
        );
        assert_eq!(output.concepts.len(), 1);
        assert_eq!(output.concepts[0].span, Span::new(0, 17));
    }

    #[test]
    fn test_stopword_and_punctuation_windows_never_looked_up() {
        let mut lookup = lookup();
        lookup.norm("", vec![row(7, 0)]);
        lookup.phrase("of the", vec![row(7, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let output = run(&matcher, "of the , .", &[("of", "IN"), ("the", "DT"), (",", ","), (".", ".")]);
        assert!(output.is_empty());
        assert_eq!(output.stats.windows, 0);
        assert_eq!(output.stats.lookups, 0);
    }

    #[test]
    fn test_stopword_by_normalized_form() {
        let mut lookup = lookup();
        lookup.phrase("The", vec![row(8, 0)]);
        // tagged as a noun, but "the" is still a stopword
        let matcher = ConceptMatcher::new(&lookup);
        let output = run(&matcher, "The", &[("The", "NN")]);
        assert!(output.is_empty());
    }

    #[test]
    fn test_trivial_start_is_skipped() {
        let mut lookup = lookup();
        lookup.phrase("with fever", vec![row(1, 0)]);
        lookup.phrase("fever", vec![row(2, 0)]);
        let matcher = ConceptMatcher::with_config(
            &lookup,
            MatcherConfig::builder().with_stopwords(Vec::<String>::new()).build(),
        );

        let output = run(&matcher, "with fever", &[("with", "IN"), ("fever", "NN")]);
        assert_eq!(output.concepts.len(), 1);
        assert_eq!(output.concepts[0].cui, Cui::new(2));
    }

    #[test]
    fn test_first_strategy_short_circuits() {
        let mut lookup = lookup();
        lookup.phrase("chest pain", vec![row(1, 0)]);
        lookup.lowercase("chest pain", vec![row(2, 0)]);
        lookup.norm("chest pain", vec![row(3, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let output = run(&matcher, "chest pain", &[("chest", "NN"), ("pain", "NN")]);
        assert_eq!(output.concepts.len(), 1);
        assert_eq!(output.concepts[0].cui, Cui::new(1));
        assert_eq!(output.stats.exact_hits, 1);
        assert_eq!(output.stats.norms_hits, 0);
    }

    #[test]
    fn test_empty_row_list_falls_through_to_next_strategy() {
        let mut lookup = lookup();
        lookup.phrase("chest pain", vec![]);
        lookup.lowercase("chest pain", vec![row(2, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let output = run(&matcher, "chest pain", &[("chest", "NN"), ("pain", "NN")]);
        assert_eq!(output.concepts.len(), 1);
        assert_eq!(output.concepts[0].strategy, MatchStrategy::Lowercase);
        // "chest" and "pain" try exact only; "chest pain" tries exact then lowercase
        assert_eq!(output.stats.lookups, 4);
        assert_eq!(output.stats.windows, 3);
    }

    #[test]
    fn test_overlapping_windows_all_reported() {
        let mut lookup = lookup();
        lookup.phrase("chest pain", vec![row(1, 0)]);
        lookup.phrase("pain", vec![row(2, 0), row(3, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let output = run(&matcher, "chest pain", &[("chest", "NN"), ("pain", "NN")]);
        assert_eq!(output.concepts.len(), 3);
        assert_eq!(output.term_spans(), vec![Span::new(0, 10), Span::new(6, 10)]);
        assert_eq!(output.concepts_at(Span::new(6, 10)).count(), 2);
        assert_eq!(output.stats.hits(), 2);
    }

    #[test]
    fn test_cardinal_last_token_skips_norms() {
        let mut lookup = lookup();
        lookup.norm("2 type", vec![row(1, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let output = run(&matcher, "type 2", &[("type", "NN"), ("2", "CD")]);
        assert!(output.is_empty());
    }

    #[test]
    fn test_window_size_limits_span() {
        let mut lookup = lookup();
        lookup.phrase("acute chest pain", vec![row(1, 0)]);
        let tagged = [("acute", "JJ"), ("chest", "NN"), ("pain", "NN")];

        let matcher = ConceptMatcher::new(&lookup);
        assert_eq!(run(&matcher, "acute chest pain", &tagged).concepts.len(), 1);

        let matcher = ConceptMatcher::with_config(
            &lookup,
            MatcherConfig::builder().with_window_size(2).build(),
        );
        assert!(run(&matcher, "acute chest pain", &tagged).is_empty());
    }

    #[test]
    fn test_normalized_form_precedence() {
        let mut lookup = lookup();
        lookup.norm("lesion skin", vec![row(1, 0)]);
        let text = "Skin lesions";
        let tagged = [("Skin", "NN"), ("lesions", "NNS")];

        let plain = ConceptMatcher::new(&lookup);
        assert!(run(&plain, text, &tagged).is_empty());

        let mut labelled = Sentence::from_tagged(text, &tagged).unwrap();
        labelled.tokens[1] = labelled.tokens[1].clone().with_norm("lesion");
        assert_eq!(plain.match_sentence(text, &labelled).unwrap().concepts.len(), 1);

        let singular = |word: &str, pos: &str| (pos == "NNS").then(|| word.trim_end_matches('s').to_string());
        let normalized = ConceptMatcher::new(&lookup).with_normalizer(&singular);
        assert_eq!(run(&normalized, text, &tagged).concepts.len(), 1);

        // the normalizer wins over the token label
        labelled.tokens[1] = labelled.tokens[1].clone().with_norm("wound");
        assert_eq!(normalized.match_sentence(text, &labelled).unwrap().concepts.len(), 1);
    }

    #[test]
    fn test_unknown_source_recovered() {
        let mut lookup = lookup();
        lookup.phrase("fever", vec![row(1, 42)]);
        let matcher = ConceptMatcher::new(&lookup);

        let output = run(&matcher, "fever", &[("fever", "NN")]);
        assert_eq!(output.concepts[0].source, UNKNOWN_SOURCE);
        assert_eq!(output.stats.unknown_sources, 1);
    }

    #[test]
    fn test_empty_dictionary_matches_nothing() {
        let lookup = MapLookup::default();
        let matcher = ConceptMatcher::new(&lookup);
        let output = run(&matcher, "Chest pain today", &[("Chest", "NN"), ("pain", "NN"), ("today", "NN")]);
        assert!(output.is_empty());
        assert!(output.stats.lookups > 0);
    }

    #[test]
    fn test_empty_sentence() {
        let lookup = lookup();
        let matcher = ConceptMatcher::new(&lookup);
        let output = matcher
            .match_sentence("", &Sentence::new(Span::new(0, 0), Vec::new()))
            .unwrap();
        assert!(output.is_empty());
        assert_eq!(output.stats.sentences, 1);
    }

    #[test]
    fn test_invalid_token_span_rejected() {
        let lookup = lookup();
        let matcher = ConceptMatcher::new(&lookup);
        let sentence = Sentence::new(Span::new(0, 5), vec![Token::new(Span::new(0, 9), "NN")]);
        assert!(matcher.match_sentence("fever", &sentence).is_err());
    }

    #[test]
    fn test_match_document_concatenates_sentences() {
        let mut lookup = lookup();
        lookup.phrase("Fever", vec![row(1, 0)]);
        lookup.phrase("Chills", vec![row(2, 0)]);
        let matcher = ConceptMatcher::new(&lookup);

        let document = Document::new("Fever. Chills.");
        let sentences = vec![
            Sentence::new(
                Span::new(0, 6),
                vec![Token::new(Span::new(0, 5), "NN"), Token::new(Span::new(5, 6), ".")],
            ),
            Sentence::new(
                Span::new(7, 14),
                vec![Token::new(Span::new(7, 13), "NNS"), Token::new(Span::new(13, 14), ".")],
            ),
        ];
        let output = matcher.match_document(&document, &sentences).unwrap();

        assert_eq!(output.stats.sentences, 2);
        assert_eq!(output.term_spans(), vec![Span::new(0, 5), Span::new(7, 13)]);

        let results = matcher.match_documents(&[(document.clone(), sentences.clone()), (document, sentences)]);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.as_ref().map(|o| o.concepts.len()).ok() == Some(2)));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_documents_keep_input_order() {
        let mut lookup = lookup();
        let words = ["Fever", "Chills", "Cough", "Nausea", "Rash", "Headache"];
        for (idx, word) in words.iter().enumerate() {
            lookup.phrase(word, vec![row(idx as u32 + 1, 0)]);
        }
        let config = MatcherConfig::builder().with_parallel(true).build();
        let matcher = ConceptMatcher::with_config(&lookup, config);

        let documents: Vec<(Document, Vec<Sentence>)> = words
            .iter()
            .cycle()
            .take(48)
            .map(|&word| {
                let sentence = Sentence::from_tagged(word, &[(word, "NN")]).unwrap();
                (Document::new(word), vec![sentence])
            })
            .collect();
        let results = matcher.match_documents(&documents);

        assert_eq!(results.len(), documents.len());
        for (idx, result) in results.iter().enumerate() {
            let output = result.as_ref().unwrap();
            assert_eq!(output.concepts.len(), 1);
            assert_eq!(output.concepts[0].cui, Cui::new((idx % words.len()) as u32 + 1));
        }
    }

    #[test]
    fn test_is_punctuation() {
        assert!(is_punctuation(","));
        assert!(is_punctuation("--"));
        assert!(is_punctuation("''"));
        assert!(!is_punctuation("-LRB-"));
        assert!(!is_punctuation("COVID-19"));
        assert!(!is_punctuation("2"));
    }
}
