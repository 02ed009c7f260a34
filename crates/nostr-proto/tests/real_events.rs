//! Validates against two real signed events captured from production relay
//! traffic, rather than hand-rolled fixtures with a fabricated signature.

use nostr_proto::{validate, Event};

fn short_text_note() -> Event {
    serde_json::from_str(
        r#"{"id":"70b10f70c1318967eddf12527799411b1a9780ad9c43858f5e5fcd45486a13a5","pubkey":"379e863e8357163b5bce5d2688dc4f1dcc2d505222fb8d74db600f30535dfdfe","created_at":1612809991,"kind":1,"tags":[],"content":"test","sig":"273a9cd5d11455590f4359500bccb7a89428262b96b3ea87a756b770964472f8c3e87f5d5e64d8d2e859a71462a3f477b554565c4f2f326cb01dd7620db71502"}"#,
    )
    .unwrap()
}

fn note_with_tags_and_newlines() -> Event {
    serde_json::from_str(
        r#"{"content":"Think about this.\n\nThe most powerful centralized institutions in the world have been replaced by a protocol that protects the individual. #bitcoin\n\nDo you doubt that we can replace everything else?\n\nBullish on the future of humanity\nnostr:nevent1qqs9ljegkuk2m2ewfjlhxy054n6ld5dfngwzuep0ddhs64gc49q0nmqpzdmhxue69uhhyetvv9ukzcnvv5hx7un8qgsw3mfhnrr0l6ll5zzsrtpeufckv2lazc8k3ru5c3wkjtv8vlwngksrqsqqqqqpttgr27","created_at":1703184271,"id":"38acf9b08d06859e49237688a9fd6558c448766f47457236c2331f93538992c6","kind":1,"pubkey":"e8ed3798c6ffebffa08501ac39e271662bfd160f688f94c45d692d8767dd345a","sig":"f76d5ecc8e7de688ac12b9d19edaacdcffb8f0c8fa2a44c00767363af3f04dbc069542ddc5d2f63c94cb5e6ce701589d538cf2db3b1f1211a96596fabb6ecafe","tags":[["e","5fcb28b72cadab2e4cbf7311f4acf5f6d1a99a1c2e642f6b6f0d5518a940f9ec","","mention"],["p","e8ed3798c6ffebffa08501ac39e271662bfd160f688f94c45d692d8767dd345a","","mention"],["t","bitcoin"],["t","bitcoin"]]}"#,
    )
    .unwrap()
}

#[test]
fn short_plain_note_validates() {
    assert!(validate(&short_text_note()).is_ok());
}

#[test]
fn note_with_duplicate_tags_and_escaped_newlines_validates() {
    assert!(validate(&note_with_tags_and_newlines()).is_ok());
}

#[test]
fn duplicate_t_tags_are_both_retained() {
    let e = note_with_tags_and_newlines();
    let t_tags: Vec<&str> = e.tag_values("t").collect();
    assert_eq!(t_tags, vec!["bitcoin", "bitcoin"]);
}

#[test]
fn flipping_one_content_byte_breaks_the_id() {
    let mut e = short_text_note();
    e.content = "Test".to_owned();
    assert!(validate(&e).is_err());
}
