use super::prefixed_client_message;

#[test]
fn client_messages_are_prefixed_once() {
    assert_eq!(prefixed_client_message("Scanned workspace"), "destructify: Scanned workspace");
    assert_eq!(prefixed_client_message("destructify: already"), "destructify: already");
}
