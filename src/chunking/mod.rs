//! CV chunking: split the extracted text into its sections (experience,
//! education, skills...), then into overlapping windows within each section.
//! Every chunk is prefixed with the owner's name so that a chunk retrieved
//! on its own still says whose CV it came from.

pub mod names;
pub mod overlap;
pub mod sections;

use unicode_normalization::{char::canonical_combining_class, UnicodeNormalization};

pub use names::{extract_full_name, title_case};
pub use overlap::split_with_overlap;
pub use sections::{detect_sections, Section, SectionKind};

/// Output of the chunking process.
#[derive(Debug, Clone)]
pub struct CvChunk {
    /// Position across the whole document, starting at 0.
    pub index: usize,
    pub text: String,
    pub section: SectionKind,
}

/// Chunk a CV section by section.
pub fn chunk_cv(text: &str, person_name: &str, size: usize, overlap: usize) -> Vec<CvChunk> {
    let mut chunks = Vec::new();
    for section in detect_sections(text) {
        for window in split_with_overlap(&section.text, size, overlap) {
            chunks.push(CvChunk {
                index: chunks.len(),
                text: format!("{person_name} - {}:\n{window}", section.kind.name()),
                section: section.kind,
            });
        }
    }
    chunks
}

/// Accent- and case-insensitive form used for every name comparison.
pub fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| canonical_combining_class(*c) == 0)
        .collect::<String>()
        .to_lowercase()
}

/// Whether every word of `name` is one of the words of `owner`, ignoring
/// accents and case. "ana silva" matches "Ana María Silva López".
pub fn name_matches(owner: &str, name: &str) -> bool {
    let owner = fold(owner);
    let owner_words: Vec<&str> = owner.split_whitespace().collect();
    let name = fold(name);
    let mut words = name.split_whitespace().peekable();
    words.peek().is_some() && words.all(|w| owner_words.contains(&w))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CV: &str = "
JUAN PÉREZ GÓMEZ
Ingeniero de Software

EXPERIENCIA LABORAL
- Software Developer en TechCorp (2020-2023)
- Junior Developer en StartupXYZ (2018-2020)

EDUCACIÓN
- Ingeniería en Sistemas - Universidad Nacional (2014-2018)

CERTIFICACIONES
- AWS Certified Solutions Architect
- Certified Scrum Master

HABILIDADES
- Python, Java, JavaScript
";

    #[test]
    fn test_fold_strips_accents_and_case() {
        assert_eq!(fold("José PÉREZ Núñez"), "jose perez nunez");
        assert_eq!(fold("plain"), "plain");
    }

    #[test]
    fn test_name_matches_whole_words() {
        assert!(name_matches("Ana María Silva López", "ana silva"));
        assert!(name_matches("Luis Pérez", "LUIS PEREZ"));
        assert!(!name_matches("Mariana Silva", "ana silva"));
        assert!(!name_matches("Ana Silva", ""));
    }

    #[test]
    fn test_chunk_cv_detects_sections() {
        let chunks = chunk_cv(CV, "Juan Pérez Gómez", 500, 50);
        let sections: Vec<&str> = chunks.iter().map(|c| c.section.name()).collect();
        assert_eq!(
            sections,
            vec!["general", "experiencia", "educacion", "certificaciones", "habilidades"]
        );
    }

    #[test]
    fn test_chunk_cv_prefixes_owner_and_numbers_sequentially() {
        let chunks = chunk_cv(CV, "Juan Pérez Gómez", 60, 10);
        assert!(chunks.len() > 5);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert!(c
                .text
                .starts_with(&format!("Juan Pérez Gómez - {}:\n", c.section.name())));
        }
    }

    #[test]
    fn test_chunk_cv_without_headers_is_general() {
        let chunks = chunk_cv("Solo un párrafo sin secciones.", "Ana Silva", 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section, SectionKind::General);
        assert_eq!(chunks[0].section.info_type(), "general");
    }

    #[test]
    fn test_chunk_cv_empty_text() {
        assert!(chunk_cv("  \n ", "Ana Silva", 1000, 200).is_empty());
    }
}
