//! Integration tests for document construction and the registries.

use std::sync::Arc;

use quire::model::normalize_whitespace;
use quire::registry::ReferenceMap;
use quire::{
    Block, Container, Document, DocumentBuilder, DocumentConfig, Error, Inline,
    MissingReferencePolicy, Node, Section, Style, TextStyle,
};

fn first_paragraph(doc: &Document) -> &quire::Paragraph {
    fn find(nodes: &[Node]) -> Option<&quire::Paragraph> {
        nodes.iter().find_map(|node| match node {
            Node::Block(Block::Paragraph(p)) => Some(p),
            Node::Section(s) => find(&s.children),
            _ => None,
        })
    }
    find(doc.body()).expect("document has a paragraph")
}

#[test]
fn test_section_depth_is_parent_plus_one() {
    let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
    b.with_section("A", |a| {
        a.with_section("A.1", |a1| a1.with_section("A.1.1", |_| Ok(())))?;
        a.with_section("A.2", |_| Ok(()))
    })
    .unwrap();
    b.with_section("B", |_| Ok(())).unwrap();
    let doc = b.finish();

    fn check(section: &Section) {
        for child in section.subsections() {
            assert_eq!(child.depth, section.depth + 1);
            check(child);
        }
    }
    for top in doc.sections() {
        assert_eq!(top.depth, 1);
        check(top);
    }
    assert_eq!(doc.section_count(), 5);
}

#[test]
fn test_whitespace_normalization() {
    assert_eq!(normalize_whitespace("Hello\n   world."), "Hello world.");

    let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
    b.p("Hello\n   world.").unwrap();
    let doc = b.finish();
    assert_eq!(first_paragraph(&doc).plain_text(), "Hello world.");

    for input in ["a \t\r\n b", "  x  ", "tab\tsep"] {
        let once = normalize_whitespace(input);
        assert_eq!(normalize_whitespace(&once), once);
    }
}

#[test]
fn test_empty_style_scope_is_noop() {
    let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
    b.with_paragraph(|p| {
        p.text("plain")?;
        p.styled(Style::Bold, |_| Ok(()))?;
        Ok(())
    })
    .unwrap();
    let doc = b.finish();
    assert_eq!(
        first_paragraph(&doc).content,
        vec![Inline::Text("plain".to_string())]
    );
}

#[test]
fn test_nested_styles_form_union() {
    let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
    b.with_paragraph(|p| {
        p.styled(Style::Italic, |p| {
            p.styled(Style::Bold, |p| p.text("both").map(|_| ()))
        })
    })
    .unwrap();
    let doc = b.finish();

    let artifact = quire::render::word::render(&doc, &Default::default()).unwrap();
    let run = artifact
        .paragraphs()
        .flat_map(|p| p.runs.iter())
        .find(|r| r.text.trim() == "both")
        .unwrap();
    assert!(run.bold && run.italic);
    assert_eq!(
        TextStyle::default()
            .with(Style::Italic)
            .union(TextStyle::default().with(Style::Bold)),
        TextStyle::default().with(Style::Bold).with(Style::Italic)
    );
}

#[test]
fn test_out_of_order_close_is_scope_mismatch() {
    let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
    let mut p = b.paragraph().unwrap();
    p.open_style(Style::Italic).unwrap();
    p.open_style(Style::Bold).unwrap();
    let err = p.close_style(Style::Italic).unwrap_err();
    assert!(matches!(err, Error::ScopeMismatch { .. }));
    assert!(err.is_programming_error());
}

#[test]
fn test_citation_numbering_follows_first_use() {
    let refs = ReferenceMap::new()
        .with("Darwin 1859", "Darwin. Origin.")
        .with("Wallace 1858", "Wallace. Varieties.");
    let mut b = DocumentBuilder::new(DocumentConfig::new())
        .unwrap()
        .with_references(Arc::new(refs));
    b.with_paragraph(|p| {
        p.citation("Wallace 1858")?;
        p.citation("Darwin 1859")?;
        p.citation("wallace 1858")?;
        Ok(())
    })
    .unwrap();
    let doc = b.finish();

    let bibliography = doc.references().emit_bibliography();
    assert_eq!(bibliography.len(), 2);
    assert_eq!(bibliography[0].number, 1);
    assert_eq!(bibliography[0].text, "Wallace. Varieties.");
    assert_eq!(bibliography[1].number, 2);
    assert_eq!(doc.references().citation_label("WALLACE 1858"), "[1]");
}

#[test]
fn test_unresolved_citation_policies() {
    let refs = Arc::new(ReferenceMap::new().with("Known", "Known text."));

    let mut b = DocumentBuilder::new(DocumentConfig::new())
        .unwrap()
        .with_references(refs.clone());
    b.with_paragraph(|p| p.citation("Missing").map(|_| ()))
        .unwrap();
    let doc = b.finish();
    assert_eq!(doc.references().missing(), &["Missing".to_string()]);
    assert!(doc.references().emit_bibliography().is_empty());
    assert_eq!(doc.references().citation_label("Missing"), "[ref? Missing]");

    let config = DocumentConfig::new().with_missing_references(MissingReferencePolicy::Error);
    let mut b = DocumentBuilder::new(config).unwrap().with_references(refs);
    let err = b
        .with_paragraph(|p| p.citation("Missing").map(|_| ()))
        .unwrap_err();
    assert!(matches!(err, Error::ReferenceNotFound(ref key) if key == "Missing"));
}

#[test]
fn test_index_groups_forms_under_canonical_key() {
    let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
    b.with_section("One", |s| {
        s.with_paragraph(|p| p.indexed("Sage").map(|_| ()))
    })
    .unwrap();
    b.with_section("Two", |s| {
        s.with_paragraph(|p| p.indexed_as("Mr Sage", "Sage").map(|_| ()))
    })
    .unwrap();
    let doc = b.finish();

    let index = doc.index().emit_index();
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].key, "Sage");
    assert_eq!(index[0].forms, vec!["Sage".to_string(), "Mr Sage".to_string()]);
    let sections: Vec<String> = index[0]
        .locations
        .iter()
        .map(|l| l.section.to_string())
        .collect();
    assert_eq!(sections, vec!["1", "2"]);
}

#[test]
fn test_closed_list_rejects_items() {
    let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
    let mut list = b.list(false).unwrap();
    list.item_text("only").unwrap();
    list.close().unwrap();
    let err = list.item().err().unwrap();
    assert!(matches!(err, Error::ClosedNodeMutation { node: "list" }));
}

#[test]
fn test_toc_emit_respects_depth() {
    let config = DocumentConfig::new().with_toc(3, "Contents");
    let mut b = DocumentBuilder::new(config).unwrap();
    b.with_section("One", |s| {
        s.with_section("One.One", |s| s.with_section("Deep", |_| Ok(())))
    })
    .unwrap();
    b.with_section("Two", |_| Ok(())).unwrap();
    let doc = b.finish();

    let paths: Vec<String> = doc
        .toc()
        .emit(2)
        .iter()
        .map(|e| e.path.to_string())
        .collect();
    assert_eq!(paths, vec!["1", "1.1", "2"]);
    assert_eq!(doc.toc().emit(3).len(), 4);
}

#[test]
fn test_config_rejects_unknown_keys() {
    let err = DocumentConfig::from_json(r#"{"title": "Opus", "colour": "red"}"#).unwrap_err();
    assert!(matches!(err, Error::Json(_)));

    let err = DocumentConfig::from_json(r#"{"toc_level": 9}"#).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_footnotes_owned_by_innermost_section() {
    let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
    b.with_section("Outer", |s| {
        s.with_paragraph(|p| p.footnote_text("outer note").map(|_| ()))?;
        s.with_section("Inner", |s| {
            s.with_paragraph(|p| p.footnote_text("inner note").map(|_| ()))
        })
    })
    .unwrap();
    let doc = b.finish();

    let outer = quire::SectionPath::from_ordinals(vec![1]);
    let inner = outer.child(1);
    let numbers = |path: &quire::SectionPath| -> Vec<u32> {
        doc.footnotes()
            .emit_footnotes(path)
            .iter()
            .map(|n| n.number)
            .collect()
    };
    assert_eq!(numbers(&outer), vec![1]);
    assert_eq!(numbers(&inner), vec![2]);
}

#[test]
fn test_document_is_shareable_across_threads() {
    fn assert_sync<T: Send + Sync>() {}
    assert_sync::<Document>();
}
