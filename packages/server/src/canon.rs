use common::ContentHash;

/// Canonical form of content bytes for compatibility comparisons. JSON text
/// canonicalizes to its minified form with object keys sorted (the parser's
/// map ordering); anything else canonicalizes to itself.
pub fn canonical_content(content: &[u8]) -> Vec<u8> {
    match serde_json::from_slice::<serde_json::Value>(content) {
        Ok(value) => serde_json::to_vec(&value).unwrap_or_else(|_| content.to_vec()),
        Err(_) => content.to_vec(),
    }
}

/// Hash of the canonical form.
pub fn canonical_hash(content: &[u8]) -> ContentHash {
    ContentHash::compute(&canonical_content(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_whitespace_does_not_change_the_canonical_hash() {
        let a = br#"{"type":"record","name":"X"}"#;
        let b = br#"{ "type" : "record",
                      "name" : "X" }"#;
        assert_eq!(canonical_hash(a), canonical_hash(b));
    }

    #[test]
    fn json_key_order_does_not_change_the_canonical_hash() {
        let a = br#"{"name":"X","type":"record"}"#;
        let b = br#"{"type":"record","name":"X"}"#;
        assert_eq!(canonical_hash(a), canonical_hash(b));
    }

    #[test]
    fn non_json_content_canonicalizes_to_itself() {
        let proto = b"syntax = \"proto3\";";
        assert_eq!(canonical_content(proto), proto.to_vec());
        assert_eq!(canonical_hash(proto), ContentHash::compute(proto));
    }
}
