//! UI state owner: the loaded snippets, the filter state, and what is open.

use tracing::error;

use crate::client::{Draft, Snippet, SnippetGateway, Source};
use crate::errors::Result;

pub struct Shell {
    pub snippets: Vec<Snippet>,
    pub filtered: Vec<Snippet>,
    pub search_term: String,
    pub selected_tag: Option<String>,
    pub tags: Vec<String>,
    pub detail: Option<Snippet>,
    pub adding: bool,
    pub source: Source,
    /// Blocking message the user has to acknowledge.
    pub alert: Option<String>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Union of tags across `snippets`, in order of first appearance.
pub fn known_tags(snippets: &[Snippet]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in snippets.iter().flat_map(|s| &s.tags) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

/// The search-box filter. `#` searches tags, `@` searches authors, anything
/// else searches title, content and description, narrowed by the selected tag.
/// A blank term shows everything and ignores the selected tag.
pub fn filter_by_term(snippets: &[Snippet], term: &str, selected_tag: Option<&str>) -> Vec<Snippet> {
    if term.trim().is_empty() {
        return snippets.to_vec();
    }

    let keep = |s: &Snippet| -> bool {
        if let Some(tag) = term.strip_prefix('#') {
            s.tags.iter().any(|t| contains_ci(t, tag))
        } else if let Some(author) = term.strip_prefix('@') {
            s.author.as_deref().is_some_and(|a| contains_ci(a, author))
        } else {
            let matches_text = contains_ci(&s.title, term)
                || contains_ci(&s.content, term)
                || s.description.as_deref().is_some_and(|d| contains_ci(d, term));
            let matches_tag = selected_tag.is_none_or(|tag| s.tags.iter().any(|t| t == tag));
            matches_text && matches_tag
        }
    };
    snippets.iter().filter(|s| keep(s)).cloned().collect()
}

/// The tag-button filter: exact tag membership plus a plain title/content
/// match on the current term. Prefixes have no meaning here.
pub fn filter_by_tag(snippets: &[Snippet], term: &str, tag: Option<&str>) -> Vec<Snippet> {
    snippets
        .iter()
        .filter(|s| {
            let matches_search =
                term.is_empty() || contains_ci(&s.title, term) || contains_ci(&s.content, term);
            let matches_tag = tag.is_none_or(|tag| s.tags.iter().any(|t| t == tag));
            matches_search && matches_tag
        })
        .cloned()
        .collect()
}

impl Shell {
    pub fn new() -> Self {
        Self {
            snippets: Vec::new(),
            filtered: Vec::new(),
            search_term: String::new(),
            selected_tag: None,
            tags: Vec::new(),
            detail: None,
            adding: false,
            source: Source::Service,
            alert: None,
        }
    }

    pub fn load(&mut self, gateway: &impl SnippetGateway) -> Result<()> {
        let fetched = gateway.load_all()?;
        self.source = fetched.source;
        self.set_snippets(fetched.value);
        Ok(())
    }

    fn set_snippets(&mut self, snippets: Vec<Snippet>) {
        self.filtered = snippets.clone();
        self.tags = known_tags(&snippets);
        self.snippets = snippets;
    }

    pub fn search(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.filtered = filter_by_term(&self.snippets, term, self.selected_tag.as_deref());
    }

    /// `None` clears the selection.
    pub fn select_tag(&mut self, tag: Option<String>) {
        self.filtered = filter_by_tag(&self.snippets, &self.search_term, tag.as_deref());
        self.selected_tag = tag;
    }

    /// Saves through the gateway and appends the result. The filtered list is
    /// reset to everything. A failure becomes the blocking alert.
    pub fn save(&mut self, gateway: &impl SnippetGateway, draft: Draft) {
        match gateway.create(draft) {
            Ok(fetched) => {
                let mut snippets = std::mem::take(&mut self.snippets);
                snippets.push(fetched.value);
                self.set_snippets(snippets);
            }
            Err(e) => {
                error!(%e, "saving snippet failed");
                self.alert = Some("Could not save the snippet. Please try again.".to_string());
            }
        }
    }

    pub fn open_detail(&mut self, index: usize) {
        self.detail = self.filtered.get(index).cloned();
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Fetched;
    use crate::errors::QvError;
    use chrono::Utc;
    use std::cell::RefCell;

    fn snippet(id: i64, title: &str, content: &str, tags: &[&str], author: Option<&str>) -> Snippet {
        Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            author: author.map(String::from),
            created_at: Utc::now(),
            favorite: false,
        }
    }

    struct FakeGateway {
        snippets: Vec<Snippet>,
        source: Source,
        fail_create: bool,
        created: RefCell<Vec<Draft>>,
    }

    impl FakeGateway {
        fn with(snippets: Vec<Snippet>) -> Self {
            Self {
                snippets,
                source: Source::Service,
                fail_create: false,
                created: RefCell::new(Vec::new()),
            }
        }
    }

    impl SnippetGateway for FakeGateway {
        fn load_all(&self) -> Result<Fetched<Vec<Snippet>>> {
            Ok(Fetched {
                value: self.snippets.clone(),
                source: self.source,
            })
        }

        fn create(&self, draft: Draft) -> Result<Fetched<Snippet>> {
            if self.fail_create {
                return Err(QvError::Cache("disk full".to_string()));
            }
            self.created.borrow_mut().push(draft.clone());
            Ok(Fetched::service(draft.into_snippet(100, Utc::now())))
        }
    }

    fn sample() -> Vec<Snippet> {
        let mut described = snippet(4, "Monthly totals", "SELECT sum(x) FROM t", &["report"], None);
        described.description = Some("uses the usuarios view".to_string());
        vec![
            snippet(1, "Listar usuarios", "SELECT * FROM usuarios", &["select", "users"], Some("Ana")),
            snippet(2, "Listar productos", "SELECT * FROM productos", &["select"], Some("Luis")),
            snippet(3, "Sales report", "SELECT * FROM sales", &["report"], Some("Mariana")),
            described,
        ]
    }

    fn loaded_shell() -> Shell {
        let mut shell = Shell::new();
        shell.load(&FakeGateway::with(sample())).unwrap();
        shell
    }

    fn ids(snippets: &[Snippet]) -> Vec<i64> {
        snippets.iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_load_sets_lists_and_tags() {
        let shell = loaded_shell();
        assert_eq!(shell.snippets.len(), 4);
        assert_eq!(shell.filtered.len(), 4);
        assert_eq!(shell.tags, vec!["select", "users", "report"]);
        assert_eq!(shell.source, Source::Service);
    }

    #[test]
    fn test_load_keeps_staleness_marker() {
        let mut gateway = FakeGateway::with(sample());
        gateway.source = Source::LocalCache;
        let mut shell = Shell::new();
        shell.load(&gateway).unwrap();
        assert_eq!(shell.source, Source::LocalCache);
    }

    #[test]
    fn test_plain_search_matches_title_content_description() {
        let mut shell = loaded_shell();
        shell.search("USUARIOS");
        assert_eq!(ids(&shell.filtered), vec![1, 4]);
    }

    #[test]
    fn test_tag_prefix_search() {
        let mut shell = loaded_shell();
        shell.search("#rep");
        assert_eq!(ids(&shell.filtered), vec![3, 4]);
    }

    #[test]
    fn test_tag_prefix_ignores_titles() {
        let mut shell = loaded_shell();
        shell.search("#listar");
        assert!(shell.filtered.is_empty());
    }

    #[test]
    fn test_author_prefix_search_is_case_insensitive() {
        let mut shell = loaded_shell();
        shell.search("@ana");
        // "Mariana" contains "ana" as well.
        assert_eq!(ids(&shell.filtered), vec![1, 3]);
    }

    #[test]
    fn test_author_prefix_skips_anonymous() {
        let mut shell = loaded_shell();
        shell.search("@");
        assert_eq!(ids(&shell.filtered), vec![1, 2, 3]);
    }

    #[test]
    fn test_plain_search_respects_selected_tag() {
        let mut shell = loaded_shell();
        shell.select_tag(Some("select".to_string()));
        shell.search("listar");
        assert_eq!(ids(&shell.filtered), vec![1, 2]);
        shell.search("sales");
        assert!(shell.filtered.is_empty());
    }

    #[test]
    fn test_prefix_search_ignores_selected_tag() {
        let mut shell = loaded_shell();
        shell.select_tag(Some("users".to_string()));
        shell.search("#report");
        assert_eq!(ids(&shell.filtered), vec![3, 4]);
    }

    #[test]
    fn test_select_tag_filters_exactly() {
        let mut shell = loaded_shell();
        shell.select_tag(Some("report".to_string()));
        assert_eq!(ids(&shell.filtered), vec![3, 4]);
        shell.select_tag(Some("rep".to_string()));
        assert!(shell.filtered.is_empty());
    }

    #[test]
    fn test_select_tag_combines_with_term_on_title_and_content_only() {
        let mut shell = loaded_shell();
        shell.search("usuarios");
        shell.select_tag(Some("report".to_string()));
        // Snippet 4 only mentions the term in its description.
        assert!(shell.filtered.is_empty());
    }

    #[test]
    fn test_select_tag_treats_prefix_literally() {
        let mut shell = loaded_shell();
        shell.search("#report");
        shell.select_tag(Some("report".to_string()));
        assert!(shell.filtered.is_empty());
    }

    #[test]
    fn test_clear_selection_shows_all_matching_term() {
        let mut shell = loaded_shell();
        shell.select_tag(Some("report".to_string()));
        shell.select_tag(None);
        assert_eq!(shell.filtered.len(), 4);
        assert!(shell.selected_tag.is_none());
    }

    #[test]
    fn test_clearing_term_after_tag_selection_restores_full_list() {
        let mut shell = loaded_shell();
        shell.select_tag(Some("report".to_string()));
        shell.search("sales");
        assert_eq!(ids(&shell.filtered), vec![3]);
        shell.search("");
        assert_eq!(shell.filtered.len(), 4);
        assert_eq!(shell.selected_tag.as_deref(), Some("report"));
    }

    #[test]
    fn test_whitespace_term_restores_full_list() {
        let mut shell = loaded_shell();
        shell.search("   ");
        assert_eq!(shell.filtered.len(), 4);
    }

    #[test]
    fn test_save_appends_and_resets_filter() {
        let gateway = FakeGateway::with(sample());
        let mut shell = Shell::new();
        shell.load(&gateway).unwrap();
        shell.search("sales");

        let draft = Draft::parse("New", "", "SELECT 2", "fresh, report", "").unwrap();
        shell.save(&gateway, draft);

        assert_eq!(shell.snippets.len(), 5);
        assert_eq!(shell.filtered.len(), 5);
        assert_eq!(shell.snippets.last().unwrap().id, 100);
        assert_eq!(shell.tags, vec!["select", "users", "report", "fresh"]);
        assert_eq!(gateway.created.borrow().len(), 1);
        assert!(shell.alert.is_none());
    }

    #[test]
    fn test_save_failure_raises_alert() {
        let mut gateway = FakeGateway::with(sample());
        gateway.fail_create = true;
        let mut shell = Shell::new();
        shell.load(&gateway).unwrap();

        shell.save(&gateway, Draft::parse("New", "", "SELECT 2", "", "").unwrap());
        assert_eq!(shell.snippets.len(), 4);
        assert!(shell.alert.is_some());
    }

    #[test]
    fn test_open_detail_uses_filtered_index() {
        let mut shell = loaded_shell();
        shell.search("#report");
        shell.open_detail(0);
        assert_eq!(shell.detail.as_ref().map(|s| s.id), Some(3));
        shell.close_detail();
        assert!(shell.detail.is_none());
    }

    #[test]
    fn test_known_tags_dedup_in_first_appearance_order() {
        let snippets = vec![
            snippet(1, "a", "x", &["b", "a"], None),
            snippet(2, "b", "y", &["a", "c"], None),
        ];
        assert_eq!(known_tags(&snippets), vec!["b", "a", "c"]);
    }
}
