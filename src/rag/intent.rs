//! Decide whether a question is about one person or about the candidate
//! pool as a whole, and shape the retrieved chunks accordingly.

use std::collections::HashSet;

pub use crate::chunking::fold;
use crate::chunking::name_matches;
use crate::models::VectorDocument;

const STRIP_CHARS: &[char] = &['¿', '?', '¡', '!', '.', ',', ';', ':', '"', '\'', '(', ')'];
const CONNECTORS: &[&str] = &["de", "del", "la", "y"];
const GENERAL_KEYWORDS: &[&str] = &[
    "candidatos",
    "candidatas",
    "perfiles",
    "personas",
    "quien",
    "quienes",
    "lista",
    "todos",
    "todas",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// The question names a person; `person` is the lower-cased name.
    Specific { person: String },
    General,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Specific { .. } => "specific",
            SearchMode::General => "general",
        }
    }

    pub fn person(&self) -> Option<&str> {
        match self {
            SearchMode::Specific { person } => Some(person),
            SearchMode::General => None,
        }
    }
}

/// A capitalised word that could be part of a name. Acronyms such as
/// "CV" or "AWS" are not.
fn is_name_word(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_uppercase() || !word.chars().all(|c| c.is_alphabetic() || c == '-') {
        return false;
    }
    let is_acronym = word.chars().count() <= 3 && !word.chars().any(char::is_lowercase);
    !is_acronym
}

fn is_connector(word: &str) -> bool {
    CONNECTORS.contains(&word)
}

/// Longest run of two or more capitalised words, lower-cased.
pub fn extract_person_name(query: &str) -> Option<String> {
    let cleaned: String = query
        .chars()
        .map(|c| if STRIP_CHARS.contains(&c) { ' ' } else { c })
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    // (start, end exclusive, capitalised words)
    let mut best: Option<(usize, usize, usize)> = None;
    let mut i = 0;
    while i < words.len() {
        let starts_run = is_name_word(words[i])
            && (i > 0 || words.get(1).is_some_and(|w| is_name_word(w)));
        if !starts_run {
            i += 1;
            continue;
        }

        let mut end = i + 1;
        let mut caps = 1;
        let mut j = i + 1;
        while j < words.len() {
            if is_name_word(words[j]) {
                caps += 1;
                end = j + 1;
            } else if !is_connector(words[j]) {
                break;
            }
            j += 1;
        }

        if caps >= 2 && best.map_or(true, |(_, _, c)| caps > c) {
            best = Some((i, end, caps));
        }
        i = end;
    }

    best.map(|(start, end, _)| words[start..end].join(" ").to_lowercase())
}

/// Whether the question asks about several candidates at once.
pub fn asks_for_many(query: &str) -> bool {
    fold(query)
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| GENERAL_KEYWORDS.contains(&w))
}

/// A detected name always wins. Listing keywords never force `General`;
/// they are reported separately through [`asks_for_many`].
pub fn classify(query: &str) -> SearchMode {
    match extract_person_name(query) {
        Some(person) => SearchMode::Specific { person },
        None => SearchMode::General,
    }
}

fn by_score_desc(docs: &mut [VectorDocument]) {
    docs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

/// Chunks owned by `person`, best first.
pub fn filter_by_person(docs: &[VectorDocument], person: &str) -> Vec<VectorDocument> {
    let mut kept: Vec<VectorDocument> = docs
        .iter()
        .filter(|d| name_matches(&d.metadata.person_name, person))
        .cloned()
        .collect();
    by_score_desc(&mut kept);
    kept
}

/// Chunks of whoever owns the best-scoring chunk, up to `limit`.
pub fn keep_best_person(mut docs: Vec<VectorDocument>, limit: usize) -> Vec<VectorDocument> {
    by_score_desc(&mut docs);
    let Some(owner) = docs.first().map(|d| fold(&d.metadata.person_name)) else {
        return docs;
    };
    docs.retain(|d| fold(&d.metadata.person_name) == owner);
    docs.truncate(limit);
    docs
}

/// Best chunk per distinct person, best first, at most `max_profiles`.
pub fn group_profiles(mut docs: Vec<VectorDocument>, max_profiles: usize) -> Vec<VectorDocument> {
    by_score_desc(&mut docs);
    let mut seen = HashSet::new();
    docs.into_iter()
        .filter(|d| seen.insert(fold(&d.metadata.person_name)))
        .take(max_profiles)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;

    fn doc(person: &str, score: f32) -> VectorDocument {
        VectorDocument {
            id: format!("{person}-{score}"),
            content: format!("{person} chunk"),
            metadata: ChunkMetadata {
                person_name: person.to_string(),
                ..Default::default()
            },
            score,
        }
    }

    #[test]
    fn test_extract_person_name_cases() {
        let cases = [
            ("dime que certificaciones tiene Gorky Palacios", Some("gorky palacios")),
            ("¿Cuál es la experiencia de Juan Carlos Pérez?", Some("juan carlos pérez")),
            ("sobre María González", Some("maría gonzález")),
            ("certificados de Ana Silva López", Some("ana silva lópez")),
            ("experiencia laboral", None),
        ];
        for (query, expected) in cases {
            assert_eq!(extract_person_name(query).as_deref(), expected, "{query}");
        }
    }

    #[test]
    fn test_connectors_only_inside_names() {
        assert_eq!(
            extract_person_name("Experiencia de María de la Cruz").as_deref(),
            Some("maría de la cruz")
        );
        assert_eq!(
            extract_person_name("habla de Ana Silva y de su CV").as_deref(),
            Some("ana silva")
        );
    }

    #[test]
    fn test_first_word_needs_capitalised_neighbour() {
        assert_eq!(extract_person_name("Quién sabe Python").as_deref(), None);
        assert_eq!(
            extract_person_name("Juan Pérez tiene AWS?").as_deref(),
            Some("juan pérez")
        );
    }

    #[test]
    fn test_acronyms_are_not_names() {
        assert_eq!(extract_person_name("candidatos con AWS y GCP").as_deref(), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("experiencia de Ana Silva"),
            SearchMode::Specific {
                person: "ana silva".into()
            }
        );
        assert_eq!(classify("¿Quiénes saben Python?"), SearchMode::General);
        assert!(asks_for_many("¿Quiénes saben Python?"));
        assert_eq!(classify("lista de candidatos"), SearchMode::General);
    }

    #[test]
    fn test_filter_by_person() {
        let docs = vec![
            doc("Juan Pérez", 0.85),
            doc("María González", 0.90),
            doc("Juan Pérez", 0.95),
            doc("Pedro Sánchez", 0.80),
        ];
        let kept = filter_by_person(&docs, "juan perez");
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| d.metadata.person_name == "Juan Pérez"));
        assert!(kept[0].score > kept[1].score);
    }

    #[test]
    fn test_group_profiles_one_chunk_per_person() {
        let docs = vec![
            doc("Ana Silva", 0.7),
            doc("Luis Gómez", 0.9),
            doc("ana silva", 0.8),
            doc("Pedro Sánchez", 0.5),
        ];
        let grouped = group_profiles(docs, 2);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].metadata.person_name, "Luis Gómez");
        assert!((grouped[1].score - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_keep_best_person() {
        let docs = vec![doc("Ana Silva", 0.6), doc("Luis Gómez", 0.9), doc("Luis Gomez", 0.7)];
        let kept = keep_best_person(docs, 5);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| fold(&d.metadata.person_name) == "luis gomez"));
        assert!(keep_best_person(Vec::new(), 5).is_empty());
    }
}
