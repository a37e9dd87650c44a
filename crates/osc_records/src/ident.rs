//! Identifier policy: deterministic slugs derived from human-readable names.
//!
//! Every node id and every project cross-reference goes through [`slugify`],
//! so a product naming "Project Foo" resolves to the node created for the
//! project whose short name is "Project Foo".

/// Converts a human-readable name into a URL-safe, lowercase, hyphen-separated slug.
pub fn slugify(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(trimmed.len());
    let mut last_dash = true;
    for ch in trimmed.chars() {
        let folded = fold_latin(ch);
        for ch in folded.chars() {
            let ch = ch.to_ascii_lowercase();
            if ch.is_ascii_alphanumeric() {
                out.push(ch);
                last_dash = false;
            } else if !last_dash {
                out.push('-');
                last_dash = true;
            }
        }
    }
    out.trim_end_matches('-').to_string()
}

fn fold_latin(ch: char) -> &'static str {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ß' => "ss",
        _ => ascii_or_separator(ch),
    }
}

fn ascii_or_separator(ch: char) -> &'static str {
    const ASCII: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    match ASCII.find(ch) {
        Some(idx) => &ASCII[idx..idx + 1],
        None => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic_names() {
        assert_eq!(slugify("Sea Level"), "sea-level");
        assert_eq!(slugify("  Ocean  "), "ocean");
        assert_eq!(slugify("CCI+ Sea-Ice (v2.0)"), "cci-sea-ice-v2-0");
        assert_eq!(slugify("proj-a"), "proj-a");
    }

    #[test]
    fn slugify_folds_diacritics() {
        assert_eq!(slugify("Météo Études"), "meteo-etudes");
        assert_eq!(slugify("Straße"), "strasse");
    }

    #[test]
    fn slugify_collapses_and_trims_separators() {
        assert_eq!(slugify("--a   b--"), "a-b");
        assert_eq!(slugify("___"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn slugify_is_idempotent() {
        for name in ["Land Cover", "GHG: CO2 / CH4", "sea-level"] {
            let once = slugify(name);
            assert_eq!(slugify(&once), once);
        }
    }
}
