use crate::name::{CLIENT_NAME_SIZE, ClientName, truncate_to_boundary};

/// **VALUE**: Verifies that over-long names are cut to the maximum length instead of rejected.
///
/// **WHY THIS MATTERS**: A caller passing a 300-character name must still get a client;
/// length alone is never a reason for open to fail.
///
/// **BUG THIS CATCHES**: Would catch truncation being dropped or applied at the wrong size.
#[test]
fn given_300_char_name_when_sanitized_then_truncated_to_capacity() {
    // GIVEN: A 300 character ASCII name
    let raw = "n".repeat(300);

    // WHEN: Sanitizing
    let name = ClientName::sanitize(&raw);

    // THEN: Exactly CLIENT_NAME_SIZE bytes remain, all from the original prefix
    assert_eq!(name.len(), CLIENT_NAME_SIZE);
    assert_eq!(name.as_str(), &raw[..CLIENT_NAME_SIZE]);
}

/// **VALUE**: Verifies that truncation never splits a multi-byte character.
///
/// **BUG THIS CATCHES**: Would catch byte slicing in the middle of a UTF-8 sequence,
/// which panics.
#[test]
fn given_multibyte_name_when_sanitized_then_cut_on_char_boundary() {
    // GIVEN: 31 two-byte characters (62 bytes) then a three-byte one crossing the limit
    let raw = format!("{}€", "é".repeat(31));

    // WHEN: Sanitizing
    let name = ClientName::sanitize(&raw);

    // THEN: The euro sign (bytes 62..65) does not fit and is dropped whole
    assert_eq!(name.as_str(), "é".repeat(31));
    assert!(name.len() <= CLIENT_NAME_SIZE);
}

/// **VALUE**: Verifies path separators are rewritten.
///
/// **WHY THIS MATTERS**: Engines derive resource names from client names; a `/` would
/// turn into a path component.
#[test]
fn given_name_with_separators_when_sanitized_then_separators_become_underscores() {
    // GIVEN / WHEN
    let name = ClientName::sanitize("mixer/left\\bus");

    // THEN
    assert_eq!(name.as_str(), "mixer_left_bus");
}

#[test]
fn given_short_name_when_sanitized_then_unchanged() {
    let name = ClientName::sanitize("player");

    assert_eq!(name.as_str(), "player");
    assert_eq!(name.to_string(), "player");
    assert!(!name.is_empty());
}

/// **VALUE**: Verifies the empty name passes through; legality is the engine's call.
#[test]
fn given_empty_name_when_sanitized_then_stays_empty() {
    let name = ClientName::sanitize("");

    assert!(name.is_empty());
}

#[test]
fn given_value_shorter_than_limit_when_truncated_then_returned_whole() {
    assert_eq!(truncate_to_boundary("abc", 10), "abc");
    assert_eq!(truncate_to_boundary("abcdef", 3), "abc");
    assert_eq!(truncate_to_boundary("aé", 2), "a");
}
