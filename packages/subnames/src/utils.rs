use hex;
use tiny_keccak::Keccak;

pub const ROOT_NODE: [u8; 32] = [0u8; 32];

pub fn keccak256(i: &[u8]) -> Vec<u8> {
    let mut o = vec![0u8; 32];
    Keccak::keccak256(i, &mut o);
    o
}

pub fn labelhash(label: &str) -> Vec<u8> {
    keccak256(label.as_bytes())
}

/// Node of `label` directly under `parent`. The same pair always yields the same node,
/// so a name keeps its identifier across create, expire and re-create.
pub fn subnode(parent: &[u8], label: &str) -> Vec<u8> {
    keccak256(&[parent, labelhash(label).as_slice()].concat())
}

pub fn namehash(name: &str) -> Vec<u8> {
    let mut node = ROOT_NODE.to_vec();
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        node = subnode(&node, label);
    }
    node
}

/// A label is a single non-empty segment: no dots, no surrounding whitespace.
pub fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && !label.contains('.') && label.trim() == label
}

pub fn full_name(label: &str, root_name: &str) -> String {
    if root_name.is_empty() {
        return label.to_string();
    }
    format!("{}.{}", label, root_name)
}

pub fn encode_node(node: &[u8]) -> String {
    hex::encode(node)
}

pub fn decode_node(node: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(node.trim_start_matches("0x"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference values from https://swolfeyes.github.io/ethereum-namehash-calculator/
    #[test]
    fn test_namehash() {
        assert_eq!(
            encode_node(&namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            encode_node(&namehash("alice.eth")),
            "787192fc5378cc32aa956ddfdedbf26b24e8d78e40109add0eea2c1a012c3dec"
        );
        assert_eq!(namehash(""), ROOT_NODE.to_vec());
    }

    #[test]
    fn test_subnode_matches_namehash() {
        let parent = namehash("celo.eth");
        assert_eq!(subnode(&parent, "alice"), namehash("alice.celo.eth"));
        assert_eq!(subnode(&parent, "alice"), subnode(&parent, "alice"));
        assert_ne!(subnode(&parent, "alice"), subnode(&parent, "bob"));
    }

    #[test]
    fn test_labels() {
        assert!(is_valid_label("alice"));
        assert!(!is_valid_label(""));
        assert!(!is_valid_label("a.b"));
        assert!(!is_valid_label(" alice"));
        assert_eq!(full_name("alice", "celo.eth"), "alice.celo.eth");
        assert_eq!(decode_node("0xabcd").unwrap(), vec![0xab, 0xcd]);
    }
}
