use rand::Rng;

/// Token alphabet without look-alike characters (0/O/o, 1/l/I).
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";
pub const TOKEN_LENGTH: usize = 32;

/// Generates an interview access token.
///
/// Tokens are issued once when the interview is created and only change through
/// an explicit reissue, so links already sent to the candidate stay valid.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}
