//! Subject heuristic and pronoun substitution.
//!
//! This is a surface heuristic, not a parser: the subject of a sentence is
//! taken to be its first capitalized token that is not a stop word.

use std::collections::HashSet;

/// Capitalized words that never name a subject
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "if", "then", "when", "whenever", "without", "since", "because",
    "given", "provided", "unless", "although", "however", "whereas", "while", "but",
    "and", "or", "either", "neither", "not", "in", "on", "as", "so", "assuming", "this",
    "that", "these", "those", "there", "i", "we", "you", "he", "she", "they", "it",
    "his", "her", "their", "its", "my", "our", "your", "only", "all", "each", "every",
    "no", "any", "some", "most", "many", "few", "both", "also", "just", "even",
];

// Words after which "her" is an object, not a possessive
const OBJECT_FOLLOWERS: &[&str] = &[
    "the", "a", "an", "to", "that", "this", "some", "and", "or", "if", "when", "about",
    "with", "for", "in", "on", "at", "up", "out", "back", "again",
];

#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS.iter().copied())
    }
}

impl StopWords {
    pub fn new<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            words: words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    pub fn extend<'a>(mut self, words: impl IntoIterator<Item = &'a str>) -> Self {
        self.words.extend(words.into_iter().map(|w| w.to_lowercase()));
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }
}

/// Split into word tokens with surrounding punctuation removed
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-'))
        .map(|t| t.trim_end_matches("'s"))
        .filter(|t| !t.is_empty())
        .collect()
}

/// First capitalized token that is not a stop word
pub fn extract_subject(tokens: &[&str], stop_words: &StopWords) -> Option<String> {
    tokens
        .iter()
        .find(|t| t.chars().next().is_some_and(char::is_uppercase) && !stop_words.contains(t))
        .map(|t| t.to_string())
}

/// Replace third-person personal pronouns with `subject`.
///
/// Possessives become `subject's`. "her" is possessive when a word other
/// than an article or preposition follows it ("won her award"), and an
/// object otherwise ("told her that", "thanked her.").
pub fn resolve_pronouns(text: &str, subject: &str) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let core = word.trim_end_matches(|c: char| c.is_ascii_punctuation());
            let tail = &word[core.len()..];
            let replaced = match core.to_lowercase().as_str() {
                "he" | "she" | "they" | "him" | "them" => subject.to_string(),
                "her" if tail.is_empty() && possessive_follows(words.get(i + 1)) => {
                    format!("{}'s", subject)
                }
                "her" => subject.to_string(),
                "his" | "hers" | "their" | "theirs" => format!("{}'s", subject),
                _ => return word.to_string(),
            };
            format!("{}{}", replaced, tail)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn possessive_follows(next: Option<&&str>) -> bool {
    let Some(next) = next else {
        return false;
    };
    let next = next
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
    !next.is_empty() && !OBJECT_FOLLOWERS.contains(&next.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("If Amy's plan, \"works\" then"),
            vec!["If", "Amy", "plan", "works", "then"]
        );
    }

    #[test]
    fn test_extract_subject_skips_stop_words() {
        let stop = StopWords::default();
        let tokens = tokenize("If Amy were a tall and fair actress");
        assert_eq!(extract_subject(&tokens, &stop), Some("Amy".to_string()));

        let tokens = tokenize("She is not a tall and fair actress");
        assert_eq!(extract_subject(&tokens, &stop), None);

        let tokens = tokenize("Without an appreciation for history, an architect can never design");
        assert_eq!(extract_subject(&tokens, &stop), None);
    }

    #[test]
    fn test_quantifiers_are_not_subjects() {
        let stop = StopWords::default();
        let tokens = tokenize("Only tenants that pay on time are able to renew the lease");
        assert_eq!(extract_subject(&tokens, &stop), None);
        let tokens = tokenize("Each Tenant must pay");
        assert_eq!(extract_subject(&tokens, &stop), Some("Tenant".to_string()));
    }

    #[test]
    fn test_extra_stop_words() {
        let stop = StopWords::default().extend(["Tenants"]);
        let tokens = tokenize("Tenants that pay on time are able to renew");
        assert_eq!(extract_subject(&tokens, &stop), None);
    }

    #[test]
    fn test_resolve_pronouns() {
        assert_eq!(
            resolve_pronouns("she would have won her award, and they know it", "Amy"),
            "Amy would have won Amy's award, and Amy know it"
        );
        assert_eq!(resolve_pronouns("He lost his keys.", "Bob"), "Bob lost Bob's keys.");
        assert_eq!(resolve_pronouns("the shepherd left", "Bob"), "the shepherd left");
        assert_eq!(resolve_pronouns("he told her that it rained", "Amy"), "Amy told Amy that it rained");
        assert_eq!(resolve_pronouns("they thanked her.", "Amy"), "Amy thanked Amy.");
    }
}
