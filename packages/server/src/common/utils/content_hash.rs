use sha2::{Digest, Sha256};

/// Hash of the text an embedding was built from.
///
/// Normalisation: lowercase, every non-alphanumeric character becomes a
/// space, whitespace collapses. Punctuation turns into a word break rather
/// than vanishing, so `1.5 mm` and `15 mm` still hash differently. A minus
/// sign directly before a digit is kept, so `-5 °C` and `5 °C` differ too.
pub fn generate_content_hash(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut chars = lowered.chars().peekable();
    let mut spaced = String::with_capacity(lowered.len());
    while let Some(c) = chars.next() {
        if c.is_alphanumeric() {
            spaced.push(c);
        } else if is_minus(c) && chars.peek().is_some_and(|next| next.is_ascii_digit()) {
            spaced.push_str(" -");
        } else {
            spaced.push(' ');
        }
    }
    let normalized = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

fn is_minus(c: char) -> bool {
    matches!(c, '-' | '\u{2212}' | '\u{2013}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting_changes_keep_hash() {
        let a = generate_content_hash("Hőszigetelő lemez  Frontrock MAX E\nλ: 0,036 W/mK");
        let b = generate_content_hash("HŐSZIGETELŐ LEMEZ Frontrock MAX E λ 0 036 W mK");
        assert_eq!(a, b);
    }

    #[test]
    fn test_decimal_point_is_not_dropped() {
        assert_ne!(
            generate_content_hash("Vastagság: 1.5 mm"),
            generate_content_hash("Vastagság: 15 mm")
        );
    }

    #[test]
    fn test_minus_sign_is_kept() {
        assert_ne!(
            generate_content_hash("Alkalmazási hőmérséklet: -5 °C"),
            generate_content_hash("Alkalmazási hőmérséklet: 5 °C")
        );
        // Unicode minus and a plain hyphen mean the same thing
        assert_eq!(
            generate_content_hash("min. \u{2212}5 °C"),
            generate_content_hash("min -5 °C")
        );
        // A dash between words is still just a break
        assert_eq!(
            generate_content_hash("Frontrock-MAX E"),
            generate_content_hash("Frontrock MAX E")
        );
    }

    #[test]
    fn test_word_order_matters() {
        assert_ne!(
            generate_content_hash("Baumit KlimaWhite"),
            generate_content_hash("KlimaWhite Baumit")
        );
    }

    #[test]
    fn test_hash_format() {
        let hash = generate_content_hash("");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, generate_content_hash("!!! ---"));
    }
}
