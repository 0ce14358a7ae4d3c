use super::fold;
use super::sections::header_kind;

const UNKNOWN: &str = "Desconocido";

/// Lines of the CV inspected for the owner's name.
const NAME_SCAN_LINES: usize = 10;

/// Words that label a CV rather than name its owner.
const NOT_NAME_WORDS: &[&str] = &["cv", "curriculum", "vitae", "resume", "hv", "hoja", "vida"];

/// Capitalise the first letter of each word and lower-case the rest.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn is_label_word(word: &str) -> bool {
    NOT_NAME_WORDS.contains(&fold(word).as_str())
}

fn looks_like_name(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=5).contains(&words.len()) {
        return false;
    }
    if !words.iter().all(|w| w.chars().all(char::is_alphabetic)) {
        return false;
    }
    if words.iter().any(|w| is_label_word(w)) || header_kind(line).is_some() {
        return false;
    }
    let all_upper = words.iter().all(|w| !w.chars().any(char::is_lowercase));
    let all_title = words
        .iter()
        .all(|w| w.chars().next().is_some_and(char::is_uppercase));
    all_upper || all_title
}

fn name_from_filename(filename: &str) -> Option<String> {
    let stem = filename
        .rsplit_once('.')
        .map_or(filename, |(stem, _)| stem);
    let words: Vec<&str> = stem
        .split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .filter(|w| !is_label_word(w))
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .take(5)
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(title_case(&words.join(" ")))
    }
}

/// Best guess at the CV owner's full name: a name-like line near the top
/// of the text, else the filename, else "Desconocido".
pub fn extract_full_name(text: &str, filename: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(NAME_SCAN_LINES)
        .find(|l| looks_like_name(l))
        .map(title_case)
        .or_else(|| name_from_filename(filename))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("GORKY PALACIOS mutis"), "Gorky Palacios Mutis");
        assert_eq!(title_case("maría  gonzález"), "María González");
    }

    #[test]
    fn test_name_from_upper_case_first_line() {
        let name = extract_full_name("GORKY PALACIOS MUTIS\nIngeniero...", "CV_Gorky_Palacios.pdf");
        assert_eq!(name, "Gorky Palacios Mutis");
    }

    #[test]
    fn test_name_skips_headers_and_labels() {
        let text = "CURRICULUM VITAE\nPERFIL PROFESIONAL\nJuan Perez\nDesarrollador";
        assert_eq!(extract_full_name(text, "x.pdf"), "Juan Perez");
    }

    #[test]
    fn test_job_title_is_not_a_name() {
        let text = "Ingeniero de Software\nBogotá, Colombia 2024";
        assert_eq!(extract_full_name(text, "Juan_Perez_CV.pdf"), "Juan Perez");
    }

    #[test]
    fn test_name_from_filename_drops_labels_and_digits() {
        assert_eq!(
            extract_full_name("", "curriculum_maria_silva_2024.pdf"),
            "Maria Silva"
        );
        assert_eq!(extract_full_name("", "hv-LUIS-GOMEZ.PDF"), "Luis Gomez");
    }

    #[test]
    fn test_unknown_when_nothing_fits() {
        assert_eq!(extract_full_name("", "cv_2024.pdf"), "Desconocido");
    }
}
