/// Leading characters of a token, safe to write to logs.
pub fn token_prefix(token: &str) -> &str {
    const SHOWN: usize = 12;
    match token.char_indices().nth(SHOWN) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}
