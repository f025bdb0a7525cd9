use serde_json::json;
use tower_lsp::lsp_types::Position;

use super::*;

fn uri() -> Url {
    Url::parse("file:///work/packet.h").unwrap()
}

fn store_with(text: &str) -> DocumentStore {
    let store = DocumentStore::new();
    store.open(uri(), text.to_string(), 1);
    store
}

#[test]
fn arguments_accept_object_or_bare_symbol() {
    let object = ExpandArguments::from_command_arguments(&[json!({ "symbol": "Packet" })]).unwrap();
    assert_eq!(object.symbol.as_deref(), Some("Packet"));

    let bare = ExpandArguments::from_command_arguments(&[json!("Packet_t")]).unwrap();
    assert_eq!(bare.symbol.as_deref(), Some("Packet_t"));

    assert!(ExpandArguments::from_command_arguments(&[]).is_none());
}

#[test]
fn explicit_symbol_wins_over_selection() {
    let store = store_with("Header h;\n");
    let arguments = ExpandArguments {
        symbol: Some("  Packet ".into()),
        uri: Some(uri()),
        range: Some(Range::new(Position::new(0, 0), Position::new(0, 6))),
    };
    assert_eq!(arguments.resolve_symbol(&store).as_deref(), Some("Packet"));
}

#[test]
fn selection_text_is_used() {
    let store = store_with("struct Packet {\n    Header header;\n};\n");
    let arguments: ExpandArguments = serde_json::from_value(json!({
        "uri": "file:///work/packet.h",
        "range": { "start": { "line": 1, "character": 4 }, "end": { "line": 1, "character": 10 } }
    }))
    .unwrap();
    assert_eq!(arguments.resolve_symbol(&store).as_deref(), Some("Header"));
}

#[test]
fn empty_selection_uses_word_under_cursor() {
    let store = store_with("struct Packet {\n    Header header;\n};\n");
    let position = Position::new(1, 6);
    let arguments = ExpandArguments {
        symbol: None,
        uri: Some(uri()),
        range: Some(Range::new(position, position)),
    };
    assert_eq!(arguments.resolve_symbol(&store).as_deref(), Some("Header"));
}

#[test]
fn nothing_to_expand() {
    let store = store_with("   \n");
    let position = Position::new(0, 1);
    let arguments = ExpandArguments {
        symbol: Some("   ".into()),
        uri: Some(uri()),
        range: Some(Range::new(position, position)),
    };
    assert_eq!(arguments.resolve_symbol(&store), None);
    assert_eq!(ExpandArguments::default().resolve_symbol(&store), None);
}

#[test]
fn advertised_commands() {
    assert_eq!(supported_commands(), vec!["destructify.expand".to_string(), "destructify.rescan".to_string()]);
}
