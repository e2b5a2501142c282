//! Profile text rendering.

use crate::i18n::Translator;
use crate::profiles::model::Profile;

/// Render a profile as the multi-line card shown in chat.
pub fn format_profile(profile: &Profile, tr: &Translator, locale: &str) -> String {
    let languages = if profile.languages.is_empty() {
        "-".to_string()
    } else {
        profile.languages.join(", ")
    };
    let games = if profile.games.is_empty() {
        "-".to_string()
    } else {
        profile
            .games
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut lines = vec![
        format!("<b>{}</b>", tr.t("profile_title", locale)),
        tr.t_with(
            "profile_username",
            locale,
            &[("username", profile.display_name.as_deref().unwrap_or("—"))],
        ),
        tr.t_with("profile_nick", locale, &[("roblox_nick", &profile.nickname)]),
        tr.t_with("profile_age", locale, &[("age", &profile.age.to_string())]),
        tr.t_with("profile_langs", locale, &[("languages", &languages)]),
        tr.t_with("profile_games", locale, &[("games", &games)]),
    ];
    match profile.description.as_deref() {
        Some(bio) => lines.push(tr.t_with("profile_bio", locale, &[("bio", bio)])),
        None => lines.push(tr.t("profile_no_bio", locale)),
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::profiles::model::GameCatalogEntry;

    fn profile() -> Profile {
        Profile {
            id: 1,
            display_name: Some("ann".into()),
            nickname: "Player_1".into(),
            age: 25,
            languages: vec!["en".into()],
            description: Some("hi there".into()),
            photo_reference: None,
            games: vec![GameCatalogEntry {
                id: 3,
                name: "Arsenal".into(),
                alias: "arsenal".into(),
            }],
            is_deleted: false,
            created_at: Utc::now(),
            last_active: Utc::now(),
        }
    }

    #[test]
    fn renders_all_lines() {
        let tr = Translator::new("en");
        let text = format_profile(&profile(), &tr, "en");
        assert!(text.contains("<b>Your profile</b>"));
        assert!(text.contains("Username: @ann"));
        assert!(text.contains("Roblox: Player_1"));
        assert!(text.contains("Age: 25"));
        assert!(text.contains("Language: en"));
        assert!(text.contains("Modes: Arsenal"));
        assert!(text.contains("About: hi there"));
    }

    #[test]
    fn missing_bio_uses_placeholder() {
        let tr = Translator::new("en");
        let mut p = profile();
        p.description = None;
        let text = format_profile(&p, &tr, "en");
        assert!(text.contains("About: not provided"));
    }

    #[test]
    fn missing_username_renders_dash() {
        let tr = Translator::new("en");
        let mut p = profile();
        p.display_name = None;
        let text = format_profile(&p, &tr, "en");
        assert!(text.contains("Username: @—"));
    }

    #[test]
    fn empty_games_render_dash() {
        let tr = Translator::new("en");
        let mut p = profile();
        p.games.clear();
        let text = format_profile(&p, &tr, "en");
        assert!(text.contains("Modes: -"));
    }
}
