//! Text normalization collaborators.
//!
//! Sanitizers and lemmatizers are strategy objects: pure `text -> text`
//! transformations applied before and after matching. The engine ships
//! no-op implementations and a [`DefaultSanitizer`] that performs the
//! normalization the matcher expects (lowercasing, punctuation stripping,
//! Latin diacritic folding, whitespace collapsing). Real lemmatizers wrap
//! external morphology tools and are injected by the host application.

/// Normalizes punctuation, case and diacritics in free text.
///
/// Implementations must be pure and total: same input, same output, no
/// side effects.
pub trait Sanitizer: Send + Sync {
    /// Returns the sanitized form of `text`.
    fn sanitize(&self, text: &str) -> String;
}

/// Reduces words to their base forms.
pub trait Lemmatizer: Send + Sync {
    /// Returns the lemmatized form of `text`.
    fn lemmatize(&self, text: &str) -> String;
}

/// Sanitizer that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSanitizer;

impl Sanitizer for NullSanitizer {
    fn sanitize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Lemmatizer that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLemmatizer;

impl Lemmatizer for NullLemmatizer {
    fn lemmatize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Punctuation characters stripped by [`DefaultSanitizer`].
const PUNCTUATION: &str = ".,;:!?\u{a1}\u{bf}\"'()[]{}<>\u{ab}\u{bb}";

/// Default text sanitizer.
///
/// Lowercases, folds common Latin diacritics to their base letters, replaces
/// punctuation with spaces and collapses whitespace runs. Sufficient for the
/// languages the rule format was designed around; hosts with heavier
/// normalization needs supply their own [`Sanitizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSanitizer;

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

impl Sanitizer for DefaultSanitizer {
    fn sanitize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars().flat_map(char::to_lowercase) {
            let c = fold_diacritic(c);
            if PUNCTUATION.contains(c) {
                out.push(' ');
            } else {
                out.push(c);
            }
        }
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// The pre-sanitize, lemmatize, post-sanitize normalization chain.
///
/// Both user input and registered rule patterns pass through the same
/// pipeline, so swapping a collaborator forces an index rebuild.
pub(crate) struct TextPipeline {
    pub pre: Box<dyn Sanitizer>,
    pub lemmatizer: Box<dyn Lemmatizer>,
    pub post: Box<dyn Sanitizer>,
}

impl TextPipeline {
    pub fn null() -> Self {
        Self {
            pre: Box::new(NullSanitizer),
            lemmatizer: Box::new(NullLemmatizer),
            post: Box::new(NullSanitizer),
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        let text = self.pre.sanitize(text);
        let text = self.lemmatizer.lemmatize(&text);
        self.post.sanitize(&text)
    }
}
