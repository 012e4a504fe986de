//! Sentence segmentation for sentence-chunked streaming.
//!
//! A rule-based splitter in the spirit of punkt: a run of terminal
//! punctuation followed by whitespace ends a sentence. `!` and `?` always
//! do, as does a period after an ordinary word. A period after a known
//! abbreviation or an initial never does, and an ellipsis only does when
//! the next word is not lowercase.

use std::collections::HashSet;

use tts_core::{Lang, StreamConfig};

const ENGLISH_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "etc", "e.g", "i.e", "cf",
    "inc", "ltd", "co", "corp", "dept", "est", "approx", "no", "vol", "fig", "ft", "a.m", "p.m",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

const RUSSIAN_ABBREVIATIONS: &[&str] = &[
    "г", "гг", "им", "ул", "д", "кв", "стр", "см", "тыс", "млн", "млрд", "руб", "коп", "др",
    "проф", "акад", "т.е", "т.д", "т.п", "т.к", "т.н", "и.о", "напр", "рис", "табл",
];

/// Language-aware sentence splitter.
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    lang: Lang,
    abbreviations: HashSet<String>,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new(Lang::En)
    }
}

impl SentenceSplitter {
    /// Create a splitter with the built-in abbreviations for `lang`.
    pub fn new(lang: Lang) -> Self {
        let builtin = match lang {
            Lang::En => ENGLISH_ABBREVIATIONS,
            Lang::Ru => RUSSIAN_ABBREVIATIONS,
        };
        Self {
            lang,
            abbreviations: builtin.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Build the splitter described by the `stream` config section.
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.lang).with_abbreviations(&config.abbreviations)
    }

    /// Add extra abbreviations (case-insensitive, without the final dot).
    pub fn with_abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.abbreviations.extend(
            abbreviations
                .into_iter()
                .map(|a| a.as_ref().trim_end_matches('.').to_lowercase()),
        );
        self
    }

    /// Language this splitter was built for.
    pub fn lang(&self) -> Lang {
        self.lang
    }

    /// Split `text` into trimmed sentences, in order.
    ///
    /// Blank input yields no sentences; any other input yields at least one.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0usize;
        let mut i = 0usize;

        while i < chars.len() {
            if !is_terminal(chars[i].1) {
                i += 1;
                continue;
            }

            let run_start = i;
            let mut j = i;
            while j < chars.len() && is_terminal(chars[j].1) {
                j += 1;
            }
            let run: String = chars[run_start..j].iter().map(|&(_, c)| c).collect();
            while j < chars.len() && is_closing(chars[j].1) {
                j += 1;
            }

            // Punctuation glued to the next character (3.14, e.g.x) never ends a sentence.
            if j < chars.len() && !chars[j].1.is_whitespace() {
                i = j;
                continue;
            }

            let end = chars.get(j).map_or(text.len(), |&(b, _)| b);
            let before = &text[start..chars[run_start].0];
            let next = chars[j..].iter().map(|&(_, c)| c).find(|c| !c.is_whitespace());

            if self.is_boundary(before, &run, next) {
                push_trimmed(&mut sentences, &text[start..end]);
                start = end;
            }
            i = j;
        }

        push_trimmed(&mut sentences, &text[start..]);
        sentences
    }

    fn is_boundary(&self, before: &str, run: &str, next: Option<char>) -> bool {
        let Some(next) = next else {
            return true;
        };
        if run.contains(['!', '?']) {
            return true;
        }
        // Ellipsis: a pause inside the sentence unless a new one visibly starts.
        if run != "." {
            return !next.is_lowercase();
        }

        let word = before
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or("")
            .trim_start_matches(is_opening);
        if word.is_empty() {
            return true;
        }

        if self.abbreviations.contains(&word.to_lowercase()) {
            return false;
        }
        // Initials such as "J." and dotted acronyms such as "U.S."
        let mut letters = word.chars();
        if let (Some(first), None) = (letters.next(), letters.next()) {
            if first.is_uppercase() {
                return false;
            }
        }
        !word.contains('.')
    }
}

/// Split `text` with the default (English) splitter.
pub fn split_sentences(text: &str) -> Vec<String> {
    SentenceSplitter::default().split(text)
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '}' | '»' | '”' | '’')
}

fn is_opening(c: char) -> bool {
    matches!(c, '"' | '\'' | '(' | '[' | '{' | '«' | '“' | '‘')
}
