//! Canonicalizer behaviour over realistic workflow documents.

use rstest::rstest;
use serde_json::json;
use tandem_core::{
    canonical::{equal, equal_raw, normalize},
    ChunkKind, Edge, Node, Port, WorkspaceDocument,
};

fn workflow() -> WorkspaceDocument {
    let mut edge = Edge::new("e-fetch-summarize").connect("fetch", "summarize");
    edge.inputs = Some(vec![Port::new("in-b"), Port::new("in-a")]);
    edge.outputs = Some(vec![Port::new("out-z"), Port::new("out-y")]);
    WorkspaceDocument {
        blocks: vec![
            Node::new("trigger").with_label("Webhook"),
            Node::new("fetch").with_label("HTTP").with_content("GET /items"),
            Node::new("summarize").with_label("LLM").with_content("Summarize"),
            Node::new("notify").with_label("Slack"),
        ],
        edges: vec![
            Edge::new("e-trigger-fetch").connect("trigger", "fetch"),
            edge,
            Edge::new("e-summarize-notify").connect("summarize", "notify"),
        ],
        viewport: None,
        version: Some("2.1.0".into()),
    }
}

fn rotate(doc: &WorkspaceDocument, by: usize) -> WorkspaceDocument {
    let mut out = doc.clone();
    let blocks_len = out.blocks.len();
    out.blocks.rotate_left(by % blocks_len);
    let edges_len = out.edges.len();
    out.edges.rotate_right(by % edges_len);
    for edge in &mut out.edges {
        if let Some(inputs) = edge.inputs.as_mut() {
            inputs.reverse();
        }
    }
    out
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(3)]
fn any_ordering_is_equal(#[case] by: usize) {
    let doc = workflow();
    let permuted = rotate(&doc, by);
    assert!(equal(Some(&doc), Some(&permuted)));
    assert_eq!(normalize(&doc), normalize(&permuted));
}

#[test]
fn reversed_lists_are_equal() {
    let doc = workflow();
    let mut reversed = doc.clone();
    reversed.blocks.reverse();
    reversed.edges.reverse();
    assert!(equal(Some(&doc), Some(&reversed)));
}

#[test]
fn differing_only_in_block_count() {
    let doc = workflow();
    let mut fewer = doc.clone();
    fewer.blocks.pop();
    assert!(!equal(Some(&doc), Some(&fewer)));
}

#[test]
fn label_edit_is_a_real_difference() {
    let doc = workflow();
    let mut edited = doc.clone();
    edited.blocks[1].label = Some("HTTP GET".into());
    assert!(!equal(Some(&doc), Some(&edited)));
}

#[test]
fn raw_and_typed_agree() {
    let doc = workflow();
    let raw = serde_json::to_value(&doc).expect("to_value");
    let permuted = serde_json::to_value(rotate(&doc, 2)).expect("to_value");
    assert!(equal_raw(Some(&raw), Some(&permuted)));
}

#[test]
fn concrete_two_block_scenario() {
    let a = json!({"blocks": [{"id": "b2"}, {"id": "b1"}], "edges": []});
    let b = json!({"blocks": [{"id": "b1"}, {"id": "b2"}], "edges": []});
    assert!(equal_raw(Some(&a), Some(&b)));

    let a: WorkspaceDocument = serde_json::from_value(a).expect("doc");
    let b: WorkspaceDocument = serde_json::from_value(b).expect("doc");
    assert!(equal(Some(&a), Some(&b)));
}

#[rstest]
#[case("report.pdf", ChunkKind::Pdf)]
#[case("notes.txt", ChunkKind::Text)]
#[case("README.md", ChunkKind::Markdown)]
#[case("photo.JPG", ChunkKind::Jpeg)]
#[case("data.csv", ChunkKind::Csv)]
#[case("archive.tar.gz", ChunkKind::Application)]
#[case("binary.exe", ChunkKind::Application)]
fn chunk_kind_from_file_name(#[case] name: &str, #[case] expected: ChunkKind) {
    assert_eq!(ChunkKind::from_file_name(name), expected);
}

#[test]
fn chunk_kind_display_uses_manifest_vocabulary() {
    assert_eq!(ChunkKind::Text.to_string(), "text");
    assert_eq!(ChunkKind::Markdown.to_string(), "markdown");
    assert_eq!(ChunkKind::Application.default_mime_type(), "application/octet-stream");
}
