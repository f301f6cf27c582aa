//! Hyperlink extraction and URL detection.

use crate::ast::Ast;
use crate::node::{CharData, NodeId, NodeKind};
use crate::traverse::{Visitor, walk};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// A maximal run of adjacent characters sharing one link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Link target.
    pub target: String,
    /// Displayed text.
    pub text: String,
    /// Character nodes of the run, in document order.
    pub nodes: Vec<NodeId>,
}

#[derive(Default)]
struct LinkCollector {
    links: Vec<Link>,
    open: bool,
}

impl Visitor for LinkCollector {
    fn visit_line(&mut self, _ast: &Ast, _line: NodeId, _indentation: u8) {
        self.open = false;
    }

    fn visit_char(&mut self, _ast: &Ast, id: NodeId, data: &CharData) {
        let Some(target) = &data.link else {
            self.open = false;
            return;
        };
        if self.open
            && let Some(link) = self.links.last_mut()
            && &link.target == target
        {
            link.text.push_str(data.content());
            link.nodes.push(id);
            return;
        }
        self.links.push(Link {
            target: target.clone(),
            text: data.content().to_string(),
            nodes: vec![id],
        });
        self.open = true;
    }

    fn visit_eol(&mut self, _ast: &Ast, _id: NodeId) {
        self.open = false;
    }

    fn visit_node(&mut self, _ast: &Ast, _id: NodeId, _kind: &NodeKind) {
        self.open = false;
    }
}

/// All links of the document in document order.
pub fn links(ast: &Ast) -> Vec<Link> {
    let mut collector = LinkCollector::default();
    walk(ast, &mut collector);
    collector.links
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        Regex::new(r#"(?:https?://|www\.)[^\s<>"']*[^\s<>"'.,;:!?)\]]"#).expect("valid url regex")
    })
}

/// Byte ranges of URLs in `text`.
///
/// Trailing sentence punctuation is not part of a match.
pub fn find_urls(text: &str) -> Vec<Range<usize>> {
    url_regex().find_iter(text).map(|m| m.range()).collect()
}

/// Link target for a detected URL (`www.` URLs get an `http://` scheme).
pub fn link_target(url: &str) -> String {
    if url.starts_with("www.") {
        format!("http://{url}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_urls() {
        let text = "see https://example.com/a?b=1. and www.rust-lang.org";
        let urls: Vec<&str> = find_urls(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(urls, vec!["https://example.com/a?b=1", "www.rust-lang.org"]);
        assert!(find_urls("no links here").is_empty());
    }

    #[test]
    fn test_link_target() {
        assert_eq!(link_target("www.a.org"), "http://www.a.org");
        assert_eq!(link_target("https://a.org"), "https://a.org");
    }

    #[test]
    fn test_links_group_adjacent_characters() {
        let mut ast = Ast::from_text("abcd\nef");
        let first = ast.lines()[0];
        let second = ast.lines()[1];
        let targets = [
            (first, 0, "x"),
            (first, 1, "x"),
            (first, 3, "x"),
            (second, 0, "x"),
            (second, 1, "y"),
        ];
        for (line, index, target) in targets {
            let id = ast.get_child(line, index).unwrap();
            ast.char_data_mut(id).unwrap().link = Some(target.to_string());
        }

        let found: Vec<(String, String)> = links(&ast)
            .into_iter()
            .map(|link| (link.target, link.text))
            .collect();
        assert_eq!(
            found,
            vec![
                ("x".to_string(), "ab".to_string()),
                ("x".to_string(), "d".to_string()),
                ("x".to_string(), "e".to_string()),
                ("y".to_string(), "f".to_string()),
            ]
        );
    }
}
