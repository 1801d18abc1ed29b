//! Text helpers shared by the mapping modules.

/// Normalizes text for comparison by lowercasing and replacing separators with spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-', '.', '/', '\\', ':', '(', ')'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase the first letter of each word and lowercase the rest.
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators() {
        assert_eq!(normalize_text("  LOC_Amount (GBP) "), "loc amount gbp");
        assert_eq!(normalize_text("E-mail"), "e mail");
    }

    #[test]
    fn title_cases_words() {
        assert_eq!(title_case("technip ENERGIES"), "Technip Energies");
        assert_eq!(title_case(""), "");
    }
}
