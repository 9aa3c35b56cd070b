//! Lexical language detection and the language → voice table.
//!
//! The heuristics are deliberately cheap: character-set checks plus a
//! few keywords, enough to pick a synthesis voice when none is
//! configured. Inconclusive input falls back to English.

/// Guess the language of a text fragment.
pub fn detect_language(text: &str) -> &'static str {
    let lower = text.to_lowercase();

    // Azerbaijani-specific letters
    if lower.contains('ə') || lower.contains('ğ') {
        return "az";
    }

    // Turkish keywords
    const TURKISH_WORDS: [&str; 5] = ["merhaba", "nasılsın", "teşekkür", "değil", "güzel"];
    if TURKISH_WORDS.iter().any(|w| lower.contains(w)) {
        return "tr";
    }

    if has_char_in(text, '\u{0400}', '\u{04ff}') {
        return "ru";
    }
    if has_char_in(text, '\u{4e00}', '\u{9fff}') {
        return "zh";
    }
    if has_char_in(text, '\u{3040}', '\u{30ff}') {
        return "ja";
    }
    if has_char_in(text, '\u{ac00}', '\u{d7af}') {
        return "ko";
    }
    if has_char_in(text, '\u{0600}', '\u{06ff}') {
        return "ar";
    }

    // Turkish without its keywords: diacritics shared with no Azerbaijani marker
    if lower.chars().any(|c| matches!(c, 'ı' | 'ö' | 'ü' | 'ç' | 'ş')) {
        return "tr";
    }

    "en"
}

fn has_char_in(text: &str, lo: char, hi: char) -> bool {
    text.chars().any(|c| (lo..=hi).contains(&c))
}

/// Fixed mapping of language code → synthesis voice ID.
pub fn voice_for(lang: &str) -> &'static str {
    match lang {
        "az" => "Sarah",
        "tr" => "Bella",
        "en" => "Rachel",
        "ru" => "Domi",
        "de" => "Elli",
        "fr" => "Charlotte",
        "es" => "Matilda",
        "ar" => "Adam",
        "zh" => "Glinda",
        "ja" => "Serena",
        "ko" => "Nicole",
        _ => "Rachel",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_azerbaijani() {
        assert_eq!(detect_language("Salam, necəsən?"), "az");
        assert_eq!(detect_language("sağ ol"), "az");
    }

    #[test]
    fn test_detect_turkish_keyword() {
        assert_eq!(detect_language("Merhaba, nasılsın?"), "tr");
    }

    #[test]
    fn test_detect_turkish_diacritics_without_azerbaijani() {
        assert_eq!(detect_language("çok iyiyim"), "tr");
    }

    #[test]
    fn test_detect_cyrillic() {
        assert_eq!(detect_language("Привет, как дела?"), "ru");
    }

    #[test]
    fn test_detect_cjk_and_arabic() {
        assert_eq!(detect_language("你好"), "zh");
        assert_eq!(detect_language("こんにちは"), "ja");
        assert_eq!(detect_language("안녕하세요"), "ko");
        assert_eq!(detect_language("مرحبا"), "ar");
    }

    #[test]
    fn test_default_english() {
        assert_eq!(detect_language("Hello, how are you?"), "en");
        assert_eq!(detect_language("12345"), "en");
    }

    #[test]
    fn test_voice_mapping_has_default() {
        assert_eq!(voice_for("az"), "Sarah");
        assert_eq!(voice_for("xx"), "Rachel");
    }
}
