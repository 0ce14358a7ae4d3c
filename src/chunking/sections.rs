use super::fold;

/// Longest line that can still be a section header.
const MAX_HEADER_CHARS: usize = 40;

/// CV section a chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    General,
    Experiencia,
    Educacion,
    Certificaciones,
    Habilidades,
    Idiomas,
    Perfil,
    Proyectos,
    Contacto,
}

/// Folded header prefixes, longest first where one is a prefix of another.
const HEADERS: &[(&str, SectionKind)] = &[
    ("experiencia", SectionKind::Experiencia),
    ("experience", SectionKind::Experiencia),
    ("educacion", SectionKind::Educacion),
    ("education", SectionKind::Educacion),
    ("formacion", SectionKind::Educacion),
    ("certificaciones", SectionKind::Certificaciones),
    ("certificados", SectionKind::Certificaciones),
    ("certifications", SectionKind::Certificaciones),
    ("habilidades", SectionKind::Habilidades),
    ("competencias", SectionKind::Habilidades),
    ("skills", SectionKind::Habilidades),
    ("idiomas", SectionKind::Idiomas),
    ("languages", SectionKind::Idiomas),
    ("resumen", SectionKind::Perfil),
    ("perfil", SectionKind::Perfil),
    ("summary", SectionKind::Perfil),
    ("profile", SectionKind::Perfil),
    ("proyectos", SectionKind::Proyectos),
    ("projects", SectionKind::Proyectos),
    ("contacto", SectionKind::Contacto),
    ("contact", SectionKind::Contacto),
];

impl SectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::General => "general",
            SectionKind::Experiencia => "experiencia",
            SectionKind::Educacion => "educacion",
            SectionKind::Certificaciones => "certificaciones",
            SectionKind::Habilidades => "habilidades",
            SectionKind::Idiomas => "idiomas",
            SectionKind::Perfil => "perfil",
            SectionKind::Proyectos => "proyectos",
            SectionKind::Contacto => "contacto",
        }
    }

    pub fn info_type(&self) -> &'static str {
        match self {
            SectionKind::General => "general",
            SectionKind::Experiencia => "laboral",
            SectionKind::Educacion => "academica",
            SectionKind::Certificaciones => "certificacion",
            SectionKind::Habilidades => "tecnica",
            SectionKind::Idiomas => "idioma",
            SectionKind::Perfil => "resumen",
            SectionKind::Proyectos => "proyecto",
            SectionKind::Contacto => "contacto",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub text: String,
}

/// Section introduced by `line`, if it is a header: at most 40 chars whose
/// folded form starts with a known header word. Leading bullets and `#`
/// marks are ignored.
pub fn header_kind(line: &str) -> Option<SectionKind> {
    let trimmed = line
        .trim()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_HEADER_CHARS {
        return None;
    }

    let folded = fold(trimmed);
    HEADERS
        .iter()
        .find(|(prefix, _)| folded.starts_with(prefix))
        .map(|(_, kind)| *kind)
}

/// Split CV text at its section headers. Text before the first header is
/// `General`; the header line stays at the top of its section.
pub fn detect_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut kind = SectionKind::General;
    let mut current = String::new();

    for line in text.lines() {
        if let Some(next) = header_kind(line) {
            flush(&mut sections, kind, &mut current);
            kind = next;
        }
        current.push_str(line);
        current.push('\n');
    }
    flush(&mut sections, kind, &mut current);
    sections
}

fn flush(sections: &mut Vec<Section>, kind: SectionKind, current: &mut String) {
    let text = std::mem::take(current);
    if !text.trim().is_empty() {
        sections.push(Section {
            kind,
            text: text.trim().to_string(),
        });
    }
}
