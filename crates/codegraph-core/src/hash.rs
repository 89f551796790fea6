use xxhash_rust::xxh64::xxh64;

/// Compute the identity hash for a sink dedup key.
///
/// Parts are NUL-joined before hashing so `("ab", "c")` and `("a", "bc")`
/// produce distinct values.
pub fn identity64(parts: &[&str]) -> u64 {
    let mut input = Vec::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            input.push(0);
        }
        input.extend_from_slice(part.as_bytes());
    }
    xxh64(&input, 0)
}
