//! Content hashing used to decide whether an upsert actually changes a
//! record: `updated_at` changes only if the new value actually differs
//! from the stored record.

use blake3::Hasher;

const SEP: u8 = 0x1f;

fn hash_parts(parts: &[&str]) -> String {
    let mut hasher = Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(&[SEP]);
    }
    hasher.finalize().to_hex().to_string()
}

/// Stable fingerprint of the crawler-owned fields of a `CanonicalMcp`.
///
/// Deliberately excludes `updated_at`/`last_scraped_at`/`last_validated_at`
/// (those are write-time metadata, not content) and operator-owned field
/// values (those never change as a side effect of a crawl, so including
/// them would make every crawl look like a no-op change once an operator
/// edits anything).
pub fn content_fingerprint(canonical_json_without_timestamps: &str) -> String {
    hash_parts(&[canonical_json_without_timestamps])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_hashes_identically() {
        let a = content_fingerprint("abc");
        let b = content_fingerprint("abc");
        assert_eq!(a, b);
    }

    #[test]
    fn different_input_hashes_differently() {
        let a = content_fingerprint("abc");
        let b = content_fingerprint("abd");
        assert_ne!(a, b);
    }
}
