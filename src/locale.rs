//! Working-language resolution.

/// Pick a locale for a user.
///
/// Precedence: an explicit prior choice, then the primary subtag of the
/// client's language tag (e.g. `en-US` → `en`), then the configured
/// default, then the first supported locale.
pub fn resolve_locale(
    explicit_choice: Option<&str>,
    client_language_tag: Option<&str>,
    default: &str,
    supported: &[String],
) -> String {
    let is_supported = |candidate: &str| supported.iter().any(|l| l == candidate);

    if let Some(choice) = explicit_choice {
        if is_supported(choice) {
            return choice.to_string();
        }
    }

    if let Some(tag) = client_language_tag {
        let primary = tag.split('-').next().unwrap_or(tag);
        if is_supported(primary) {
            return primary.to_string();
        }
        if is_supported(tag) {
            return tag.to_string();
        }
    }

    if is_supported(default) {
        return default.to_string();
    }
    supported.first().cloned().unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> Vec<String> {
        vec!["ru".to_string(), "en".to_string()]
    }

    #[test]
    fn explicit_choice_wins() {
        let locale = resolve_locale(Some("en"), Some("ru"), "ru", &supported());
        assert_eq!(locale, "en");
    }

    #[test]
    fn unsupported_explicit_choice_ignored() {
        let locale = resolve_locale(Some("de"), Some("en-US"), "ru", &supported());
        assert_eq!(locale, "en");
    }

    #[test]
    fn client_tag_primary_subtag() {
        let locale = resolve_locale(None, Some("en-GB"), "ru", &supported());
        assert_eq!(locale, "en");
    }

    #[test]
    fn unsupported_client_tag_falls_to_default() {
        let locale = resolve_locale(None, Some("de-DE"), "ru", &supported());
        assert_eq!(locale, "ru");
    }

    #[test]
    fn no_signals_uses_default() {
        let locale = resolve_locale(None, None, "en", &supported());
        assert_eq!(locale, "en");
    }

    #[test]
    fn unsupported_default_uses_first_supported() {
        let locale = resolve_locale(None, None, "fr", &supported());
        assert_eq!(locale, "ru");
    }

    #[test]
    fn empty_supported_set_echoes_default() {
        let locale = resolve_locale(None, None, "en", &[]);
        assert_eq!(locale, "en");
    }
}
