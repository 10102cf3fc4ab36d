/// Collapse every whitespace run (line breaks and form feeds included) into a
/// single space and trim both ends.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cadastral section codes are compared upper-cased and without padding.
pub fn normalize_section(section: &str) -> String {
    section.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_line_wraps() {
        let raw = "19 RUE BURGER,\n   94190 VILLENEUVE\r\n\tST GEORGES\x0C";
        assert_eq!(normalize(raw), "19 RUE BURGER, 94190 VILLENEUVE ST GEORGES");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "",
            "   ",
            "Nom:  KADHIRAVAN\nPrénom: MARC",
            "\u{a0}LOT\u{a0}0000237  53/10000 ",
            "already normalized text",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn keeps_non_whitespace_in_order() {
        let raw = "a\n b\t\tc  d";
        let kept: String = normalize(raw).chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(kept, "abcd");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\n\n"), "");
    }

    #[test]
    fn section_code() {
        assert_eq!(normalize_section(" as "), "AS");
        assert_eq!(normalize_section("Ce"), "CE");
    }
}
