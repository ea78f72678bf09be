use crate::posting::Posting;

/// Decides whether a posting should be kept.
pub trait PostingFilter {
    fn accepts(&self, posting: &Posting) -> bool;
}

impl<F: PostingFilter + ?Sized> PostingFilter for &F {
    fn accepts(&self, posting: &Posting) -> bool {
        (**self).accepts(posting)
    }
}

impl<F: PostingFilter + ?Sized> PostingFilter for Box<F> {
    fn accepts(&self, posting: &Posting) -> bool {
        (**self).accepts(posting)
    }
}

/// Conjunction of filters, an empty list accepts everything.
pub struct AllOf<'a>(pub Vec<&'a dyn PostingFilter>);

impl PostingFilter for AllOf<'_> {
    fn accepts(&self, posting: &Posting) -> bool {
        self.0.iter().all(|filter| filter.accepts(posting))
    }
}

pub fn all_of<'a>(filters: Vec<&'a dyn PostingFilter>) -> AllOf<'a> {
    AllOf(filters)
}

/// Case-insensitive substring terms.
///
/// Only lowercasing is applied, "estágio" does not match "estagio".
#[derive(Debug, Clone, Default)]
pub struct Keywords {
    terms: Vec<String>,
}

impl Keywords {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|term| term.as_ref().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { terms }
    }

    /// true if any term occurs in `text`
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.terms.iter().any(|term| text.contains(term.as_str()))
    }

    pub fn first_match(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| text.contains(term.as_str()))
            .map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn searchable_text(posting: &Posting) -> String {
    format!("{}\n{}", posting.title, posting.description())
}

/// Job-level filter: an inclusion term must match and no exclusion term may.
#[derive(Debug, Clone)]
pub struct LevelFilter {
    include: Keywords,
    exclude: Keywords,
}

impl LevelFilter {
    pub fn new(include: Keywords, exclude: Keywords) -> Self {
        Self { include, exclude }
    }
}

impl PostingFilter for LevelFilter {
    fn accepts(&self, posting: &Posting) -> bool {
        let text = searchable_text(posting);
        if let Some(term) = self.exclude.first_match(&text) {
            log::trace!("rejecting '{}', excluded by '{}'", posting.title, term);
            return false;
        }
        self.include.matches(&text)
    }
}

/// Technology-domain filter, matched against the title only.
///
/// Collectors also build one from the job levels when a board's search
/// ignores them; descriptions and exclusions are never consulted.
#[derive(Debug, Clone)]
pub struct TechFilter {
    terms: Keywords,
}

impl TechFilter {
    pub fn new(terms: Keywords) -> Self {
        Self { terms }
    }
}

impl PostingFilter for TechFilter {
    fn accepts(&self, posting: &Posting) -> bool {
        self.terms.matches(&posting.title)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::posting::Platform;

    fn posting(title: &str, description: Option<&str>) -> Posting {
        Posting::new(
            title,
            "Acme",
            "Salvador, BA",
            "Recent",
            Platform::Gupy,
            "#",
            description.map(String::from),
        )
    }

    fn level_filter() -> LevelFilter {
        LevelFilter::new(
            Keywords::new(["estágio", "junior", "assistente", "auxiliar", "trainer"]),
            Keywords::new(["senior", "pleno", "especialista", "coordinator", "manager"]),
        )
    }

    #[test]
    fn test_inclusion_term_is_case_insensitive() {
        assert!(level_filter().accepts(&posting("Desenvolvedor JUNIOR", None)));
        assert!(level_filter().accepts(&posting("Estágio em TI", None)));
    }

    #[test]
    fn test_inclusion_in_description_counts() {
        assert!(level_filter().accepts(&posting("Desenvolvedor", Some("vaga para nível junior"))));
    }

    #[test]
    fn test_no_inclusion_term_rejects() {
        assert!(!level_filter().accepts(&posting("Desenvolvedor Backend", Some("Rust e Go"))));
    }

    #[test]
    fn test_exclusion_always_wins() {
        assert!(!level_filter().accepts(&posting("Desenvolvedor Junior/Pleno", None)));
        assert!(!level_filter().accepts(&posting("Assistente", Some("reporta ao Manager"))));
    }

    #[test]
    fn test_missing_title_and_description_are_empty() {
        let posting = posting("", None);
        assert!(!level_filter().accepts(&posting));
    }

    #[test]
    fn test_accents_are_not_normalized() {
        let only_accented = LevelFilter::new(Keywords::new(["estágio"]), Keywords::default());
        assert!(only_accented.accepts(&posting("Estágio TI", None)));
        assert!(!only_accented.accepts(&posting("Estagio TI", None)));
    }

    #[test]
    fn test_whitespace_outside_terms_does_not_change_result() {
        let filter = level_filter();
        let compact = posting("Auxiliar de TI", None);
        let spaced = posting("  Auxiliar   de    TI  ", Some("   "));
        assert_eq!(filter.accepts(&compact), filter.accepts(&spaced));
    }

    #[test]
    fn test_terms_do_not_match_across_title_and_description() {
        let filter = LevelFilter::new(Keywords::new(["jr"]), Keywords::default());
        assert!(!filter.accepts(&posting("Analista J", Some("r de dados"))));
    }

    #[test]
    fn test_tech_filter_ignores_description() {
        let tech = TechFilter::new(Keywords::new(["software", "dados"]));
        assert!(tech.accepts(&posting("Estágio em Software", None)));
        assert!(!tech.accepts(&posting("Estágio administrativo", Some("time de dados"))));
    }

    #[test]
    fn test_all_of_composes_filters() {
        let level = level_filter();
        let tech = TechFilter::new(Keywords::new(["ti"]));
        let filters: Vec<&dyn PostingFilter> = vec![&level, &tech];
        let both = all_of(filters);
        assert!(both.accepts(&posting("Auxiliar de TI", None)));
        assert!(!both.accepts(&posting("Auxiliar de cozinha", None)));
        assert!(all_of(vec![]).accepts(&posting("anything", None)));
    }

    #[test]
    fn test_empty_terms_are_ignored() {
        let keywords = Keywords::new(["", "rust"]);
        assert_eq!(keywords.terms(), ["rust"]);
        assert!(!keywords.matches("python"));
    }
}
