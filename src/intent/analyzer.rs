//! Lightweight document analysis: sentences, tokens, coarse POS tags, entities.
//!
//! This is the optional assist layer for intent classification and the engine
//! behind the `/analyze` service. It is lexicon and pattern driven, so it is
//! cheap enough to run on every utterance before any model is touched.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::AnalysisError;

pub trait DocumentAnalyzer: Send + Sync {
    fn name(&self) -> &str;
    fn analyze(&self, text: &str) -> Result<Document, AnalysisError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Number,
    Punctuation,
    Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartOfSpeech {
    Noun,
    Propn,
    Verb,
    Aux,
    Pron,
    Det,
    Adp,
    Conj,
    Adj,
    Adv,
    Num,
    Punct,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub pos: PartOfSpeech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Email,
    Url,
    Hashtag,
    Mention,
    Time,
    Date,
    Percent,
    Ordinal,
    Cardinal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Byte offset in the analyzed text.
    pub start: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    pub text: String,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub text: String,
    pub sentences: Vec<Sentence>,
    pub entities: Vec<Entity>,
}

impl Document {
    pub fn sentences(&self) -> impl Iterator<Item = &str> {
        self.sentences.iter().map(|s| s.text.as_str())
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }

    /// Common nouns in document order (proper nouns excluded).
    pub fn nouns(&self) -> Vec<String> {
        self.tokens()
            .filter(|t| t.pos == PartOfSpeech::Noun)
            .map(|t| t.text.clone())
            .collect()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Frequency table of token kinds, sorted by kind.
    pub fn kind_frequencies(&self) -> Vec<(TokenKind, usize)> {
        let mut table: BTreeMap<TokenKind, usize> = BTreeMap::new();
        for token in self.tokens() {
            *table.entry(token.kind).or_default() += 1;
        }
        table.into_iter().collect()
    }

    /// True when some sentence opens with an action verb ("crack me up",
    /// "share one about cats").
    pub fn has_action_tokens(&self) -> bool {
        self.sentences.iter().any(|sentence| {
            sentence
                .tokens
                .iter()
                .find(|t| t.kind == TokenKind::Word)
                .map(|first| {
                    first.pos == PartOfSpeech::Verb
                        && ACTION_VERBS.contains(&first.text.to_lowercase().as_str())
                })
                .unwrap_or(false)
        })
    }
}

/// Verbs that read as a request when they open a sentence.
const ACTION_VERBS: &[&str] = &[
    "tell", "give", "make", "show", "share", "crack", "amuse", "entertain", "cheer", "hit",
    "surprise", "say", "send", "lighten",
];

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "my", "your", "his", "her", "its", "our",
    "their", "some", "any", "every", "each", "no", "another", "which", "what",
];

const PRONOUNS: &[&str] = &[
    "i", "me", "you", "he", "him", "she", "it", "we", "us", "they", "them", "myself", "yourself",
    "something", "anything", "nothing", "everything", "someone", "anyone", "who", "whom", "one",
    "mine", "yours",
];

const AUXILIARIES: &[&str] = &[
    "is", "am", "are", "was", "were", "be", "been", "being", "do", "does", "did", "have", "has",
    "had", "can", "could", "will", "would", "shall", "should", "may", "might", "must", "'s",
    "'re", "'m", "'ll", "'ve", "'d",
];

const ADPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "at", "before", "behind", "below", "by",
    "for", "from", "in", "into", "of", "off", "on", "onto", "over", "through", "to", "under",
    "with", "without", "up", "down", "out", "like", "near",
];

const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "so", "yet", "because", "if", "while", "than"];

const ADVERBS: &[&str] = &[
    "not", "n't", "very", "too", "also", "just", "still", "now", "then", "here", "there", "when",
    "where", "why", "how", "again", "always", "never", "often", "please", "really", "soon",
];

const ADJECTIVES: &[&str] = &[
    "good", "bad", "funny", "sad", "happy", "bored", "new", "old", "big", "small", "great",
    "short", "long", "hot", "cold", "silly", "hilarious", "amusing", "little", "best", "down",
];

const VERBS: &[&str] = &[
    "tell", "tells", "told", "telling", "give", "gives", "gave", "giving", "make", "makes", "made",
    "making", "show", "shows", "showed", "share", "shares", "crack", "amuse", "entertain",
    "cheer", "hit", "surprise", "say", "says", "said", "send", "lighten", "want", "wants",
    "wanted", "need", "needs", "needed", "know", "knows", "knew", "think", "thinks", "thought",
    "go", "goes", "went", "going", "get", "gets", "got", "see", "saw", "seen", "sat", "sit",
    "sits", "run", "ran", "runs", "laugh", "laughs", "laughed", "love", "loves", "like", "likes",
    "feel", "feels", "felt", "ate", "eat", "eats", "walked", "walk", "walks", "went", "come",
    "came", "comes", "meet", "met", "meets", "write", "wrote", "read", "jumped", "jump", "jumps", "bring", "brought",
];

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

const ABBREVIATIONS: &[&str] = &["mr", "mrs", "ms", "dr", "st", "vs", "etc", "e.g", "i.e", "jr", "sr", "prof"];

const CONTRACTION_SUFFIXES: &[&str] = &["n't", "'s", "'re", "'m", "'ll", "'ve", "'d"];

static ENTITY_PATTERNS: LazyLock<Vec<(EntityKind, Regex)>> = LazyLock::new(|| {
    let build = |pattern: &str| Regex::new(pattern).ok();
    let patterns = [
        (EntityKind::Url, r"(?i)\b(?:https?://|www\.)[^\s<>]+[^\s<>.,!?;:)]".to_string()),
        (EntityKind::Email, r"(?i)\b[\w.+-]+@[\w-]+(?:\.[\w-]+)+\b".to_string()),
        (EntityKind::Hashtag, r"#\w+".to_string()),
        (EntityKind::Mention, r"(?:^|\s)(@\w+)".to_string()),
        (
            EntityKind::Time,
            r"(?i)\b\d{1,2}:\d{2}(?:\s?[ap]\.?m\.?)?|\b\d{1,2}\s?[ap]\.?m\b\.?".to_string(),
        ),
        (
            EntityKind::Date,
            format!(
                r"(?i)\b(?:{MONTHS})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?\b|\b\d{{1,2}}/\d{{1,2}}/\d{{2,4}}\b"
            ),
        ),
        (EntityKind::Percent, r"\b\d+(?:\.\d+)?\s?%".to_string()),
        (EntityKind::Ordinal, r"(?i)\b\d+(?:st|nd|rd|th)\b".to_string()),
        (EntityKind::Cardinal, r"\b\d+(?:[.,]\d+)*\b".to_string()),
    ];
    patterns
        .into_iter()
        .filter_map(|(kind, pattern)| build(pattern.as_str()).map(|re| (kind, re)))
        .collect()
});

/// Built-in analyzer backed by closed-class word lists and entity patterns.
#[derive(Debug, Default, Clone)]
pub struct LexiconAnalyzer;

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentAnalyzer for LexiconAnalyzer {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn analyze(&self, text: &str) -> Result<Document, AnalysisError> {
        if ENTITY_PATTERNS.is_empty() {
            return Err(AnalysisError::Unavailable("entity patterns failed to compile".into()));
        }

        let sentences = split_sentences(text)
            .into_iter()
            .map(|raw| Sentence {
                tokens: tag(tokenize(raw)),
                text: raw.to_string(),
            })
            .collect();

        Ok(Document {
            text: text.to_string(),
            sentences,
            entities: extract_entities(text),
        })
    }
}

/// Splits on `.`, `!` and `?` runs followed by whitespace or end of text.
/// Abbreviations such as "Dr." and decimals do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (_, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            let mut j = i;
            while j + 1 < chars.len() && matches!(chars[j + 1].1, '.' | '!' | '?') {
                j += 1;
            }
            let end = chars[j].0 + chars[j].1.len_utf8();
            let at_boundary = j + 1 >= chars.len() || chars[j + 1].1.is_whitespace();

            if at_boundary && !(c == '.' && j == i && ends_with_abbreviation(&text[start..chars[i].0])) {
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

fn ends_with_abbreviation(prefix: &str) -> bool {
    prefix
        .rsplit(char::is_whitespace)
        .next()
        .map(|word| ABBREVIATIONS.contains(&word.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn tokenize(sentence: &str) -> Vec<(String, TokenKind)> {
    let mut tokens = Vec::new();

    for chunk in sentence.split_whitespace() {
        let mut core = chunk;
        let mut leading = Vec::new();
        let mut trailing = Vec::new();

        while let Some(c) = core.chars().next().filter(|c| !c.is_alphanumeric() && *c != '#' && *c != '@') {
            leading.push(c);
            core = &core[c.len_utf8()..];
        }
        while let Some(c) = core.chars().last().filter(|c| !c.is_alphanumeric() && *c != '%') {
            trailing.push(c);
            core = &core[..core.len() - c.len_utf8()];
        }

        for c in leading {
            tokens.push((c.to_string(), punctuation_kind(c)));
        }

        if !core.is_empty() {
            let lower = core.to_lowercase();
            let split = CONTRACTION_SUFFIXES
                .iter()
                .find(|suffix| lower.ends_with(*suffix) && lower.len() > suffix.len())
                .map(|suffix| core.len() - suffix.len());
            match split {
                Some(at) if core.is_char_boundary(at) => {
                    tokens.push((core[..at].to_string(), word_kind(&core[..at])));
                    tokens.push((core[at..].to_string(), TokenKind::Word));
                }
                _ => tokens.push((core.to_string(), word_kind(core))),
            }
        }

        for c in trailing.into_iter().rev() {
            tokens.push((c.to_string(), punctuation_kind(c)));
        }
    }

    tokens
}

fn word_kind(word: &str) -> TokenKind {
    let numeric = word
        .trim_end_matches('%')
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == ',');
    if numeric && word.chars().any(|c| c.is_ascii_digit()) {
        TokenKind::Number
    } else if word.chars().any(char::is_alphanumeric) {
        TokenKind::Word
    } else {
        TokenKind::Symbol
    }
}

fn punctuation_kind(c: char) -> TokenKind {
    if c.is_ascii_punctuation() && !matches!(c, '$' | '+' | '<' | '=' | '>' | '^' | '`' | '|' | '~') {
        TokenKind::Punctuation
    } else {
        TokenKind::Symbol
    }
}

fn tag(raw: Vec<(String, TokenKind)>) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::with_capacity(raw.len());
    let mut seen_word = false;

    for (text, kind) in raw {
        let pos = match kind {
            TokenKind::Number => PartOfSpeech::Num,
            TokenKind::Punctuation => PartOfSpeech::Punct,
            TokenKind::Symbol => PartOfSpeech::Other,
            TokenKind::Word => {
                let previous = tokens.last().map(|t| t.pos);
                let pos = tag_word(&text, previous, !seen_word);
                seen_word = true;
                pos
            }
        };
        tokens.push(Token { text, kind, pos });
    }
    tokens
}

fn tag_word(word: &str, previous: Option<PartOfSpeech>, sentence_initial: bool) -> PartOfSpeech {
    let lower = word.to_lowercase();
    let lower = lower.as_str();
    let after_modifier = matches!(previous, Some(PartOfSpeech::Det) | Some(PartOfSpeech::Adj));

    if DETERMINERS.contains(&lower) {
        PartOfSpeech::Det
    } else if PRONOUNS.contains(&lower) {
        PartOfSpeech::Pron
    } else if AUXILIARIES.contains(&lower) {
        PartOfSpeech::Aux
    } else if CONJUNCTIONS.contains(&lower) {
        PartOfSpeech::Conj
    } else if ADVERBS.contains(&lower) {
        PartOfSpeech::Adv
    } else if ADPOSITIONS.contains(&lower) && !(after_modifier && lower == "down") {
        PartOfSpeech::Adp
    } else if VERBS.contains(&lower) && !after_modifier {
        PartOfSpeech::Verb
    } else if ADJECTIVES.contains(&lower) {
        PartOfSpeech::Adj
    } else if !sentence_initial && word.chars().next().is_some_and(char::is_uppercase) {
        PartOfSpeech::Propn
    } else if lower.len() > 4 && lower.ends_with("ly") {
        PartOfSpeech::Adv
    } else if lower.len() > 5
        && ["ous", "ful", "ive", "able", "ible", "less", "ish"]
            .iter()
            .any(|suffix| lower.ends_with(suffix))
    {
        PartOfSpeech::Adj
    } else {
        PartOfSpeech::Noun
    }
}

/// Pattern entities in text order; earlier patterns claim overlapping spans.
fn extract_entities(text: &str) -> Vec<Entity> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut entities = Vec::new();

    for (kind, pattern) in ENTITY_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            let Some(found) = captures.get(1).or_else(|| captures.get(0)) else {
                continue;
            };
            let span = (found.start(), found.end());
            if claimed.iter().any(|&(s, e)| span.0 < e && s < span.1) {
                continue;
            }
            claimed.push(span);
            entities.push(Entity {
                value: found.as_str().to_string(),
                kind: *kind,
                start: found.start(),
            });
        }
    }

    entities.sort_by_key(|e| e.start);
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> Document {
        LexiconAnalyzer::new().analyze(text).unwrap()
    }

    #[test]
    fn splits_sentences_on_terminators() {
        assert_eq!(
            split_sentences("Tell me a joke. Make it funny! Can you?"),
            vec!["Tell me a joke.", "Make it funny!", "Can you?"]
        );
        assert_eq!(split_sentences("what time is it"), vec!["what time is it"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn abbreviations_and_decimals_do_not_split() {
        assert_eq!(
            split_sentences("Dr. Smith paid 3.50 dollars. Then he left."),
            vec!["Dr. Smith paid 3.50 dollars.", "Then he left."]
        );
    }

    #[test]
    fn splits_contractions() {
        let doc = analyze("What's the weather?");
        let words: Vec<&str> = doc.tokens().map(|t| t.text.as_str()).collect();
        assert_eq!(words, vec!["What", "'s", "the", "weather", "?"]);
    }

    #[test]
    fn extracts_common_nouns() {
        let doc = analyze("The cat sat on the mat.");
        assert_eq!(doc.nouns(), vec!["cat", "mat"]);
        assert_eq!(doc.sentence_count(), 1);
    }

    #[test]
    fn proper_nouns_are_not_nouns() {
        let doc = analyze("I met Alice in the park.");
        assert_eq!(doc.nouns(), vec!["park"]);
        assert!(doc.tokens().any(|t| t.text == "Alice" && t.pos == PartOfSpeech::Propn));
    }

    #[test]
    fn extracts_entities_without_overlap() {
        let doc = analyze("Mail bob@example.com by March 3rd at 5pm, 20% off #deal");
        let kinds: Vec<(EntityKind, &str)> =
            doc.entities().iter().map(|e| (e.kind, e.value.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (EntityKind::Email, "bob@example.com"),
                (EntityKind::Date, "March 3rd"),
                (EntityKind::Time, "5pm"),
                (EntityKind::Percent, "20%"),
                (EntityKind::Hashtag, "#deal"),
            ]
        );
    }

    #[test]
    fn kind_frequencies_count_every_token() {
        let doc = analyze("Tell me 2 jokes!");
        assert_eq!(
            doc.kind_frequencies(),
            vec![
                (TokenKind::Word, 3),
                (TokenKind::Number, 1),
                (TokenKind::Punctuation, 1),
            ]
        );
    }

    #[test]
    fn action_tokens_need_sentence_initial_action_verb() {
        assert!(analyze("Crack me up, please.").has_action_tokens());
        assert!(analyze("Okay. Share one about cats").has_action_tokens());
        assert!(!analyze("what time is it").has_action_tokens());
        assert!(!analyze("The show was long.").has_action_tokens());
    }
}
