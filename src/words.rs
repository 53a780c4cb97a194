use rand::Rng;

/// Vocabulary the secret words are drawn from.
const WORDS: &[&str] = &[
    "köpek",
    "ev",
    "bilgisayar",
    "güneş",
    "telefon",
    "ayakkabı",
    "gözlük",
    "araba",
    "masa",
    "bardak",
    "sandalye",
    "bulut",
    "kedi",
    "ağaç",
    "deniz",
    "kitap",
];

/// Pick a word uniformly at random from the vocabulary.
pub fn random_word() -> &'static str {
    WORDS[rand::thread_rng().gen_range(0..WORDS.len())]
}

/// Placeholder rendering of a word: one `_` per letter, space separated.
/// Counts characters, not bytes, so multi-byte letters mask correctly.
pub fn masked(word: &str) -> String {
    word.chars().map(|_| "_").collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_word_is_from_vocabulary() {
        for _ in 0..50 {
            let word = random_word();
            assert!(WORDS.contains(&word));
        }
    }

    #[test]
    fn test_masked_counts_letters() {
        assert_eq!(masked("ev"), "_ _");
        assert_eq!(masked("kitap"), "_ _ _ _ _");
    }

    #[test]
    fn test_masked_counts_multibyte_letters() {
        // "ağaç" is 4 letters but 6 bytes
        assert_eq!(masked("ağaç"), "_ _ _ _");
    }
}
