//! Inline keyboard layouts.
//!
//! Transport-neutral button grids; the Telegram client serializes them to
//! Bot API reply markup.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::i18n::Translator;
use crate::profiles::model::GameCatalogEntry;

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

/// Rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    fn button(text: impl Into<String>, callback_data: impl Into<String>) -> Button {
        Button {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Language picker, one button per supported locale.
pub fn language_keyboard(tr: &Translator, locale: &str, supported: &[String]) -> Keyboard {
    let buttons: Vec<Button> = supported
        .iter()
        .map(|lang| {
            Keyboard::button(tr.t(&format!("language_{lang}"), locale), format!("lang:{lang}"))
        })
        .collect();
    Keyboard {
        rows: buttons.chunks(2).map(<[Button]>::to_vec).collect(),
    }
}

/// Game multi-select: two game buttons per row, a Done row at the bottom.
///
/// Selected entries are prefixed with a check mark.
pub fn games_keyboard(
    tr: &Translator,
    locale: &str,
    games: &[GameCatalogEntry],
    selected: &BTreeSet<i64>,
) -> Keyboard {
    let buttons: Vec<Button> = games
        .iter()
        .map(|game| {
            let marker = if selected.contains(&game.id) { "✅ " } else { "" };
            Keyboard::button(format!("{marker}{}", game.name), format!("game:{}", game.id))
        })
        .collect();
    let mut rows: Vec<Vec<Button>> = buttons.chunks(2).map(<[Button]>::to_vec).collect();
    rows.push(vec![Keyboard::button(
        format!("✔️ {}", tr.t("done", locale)),
        "games:done",
    )]);
    Keyboard { rows }
}

/// A single Skip button.
pub fn skip_keyboard(tr: &Translator, locale: &str) -> Keyboard {
    Keyboard {
        rows: vec![vec![Keyboard::button(tr.t("skip", locale), "skip")]],
    }
}

/// Edit / Delete actions under a profile card.
pub fn profile_actions_keyboard(tr: &Translator, locale: &str) -> Keyboard {
    Keyboard {
        rows: vec![vec![
            Keyboard::button(tr.t("profile_buttons_edit", locale), "profile:edit"),
            Keyboard::button(tr.t("profile_buttons_delete", locale), "profile:delete"),
        ]],
    }
}
