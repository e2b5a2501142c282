//! Message catalogs and the `Translator`.
//!
//! Keys resolve against the requested locale, then English, then fall back
//! to the raw key so a missing translation never panics mid-conversation.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Locales the bundled catalogs cover.
pub const AVAILABLE_LOCALES: [&str; 2] = ["ru", "en"];

/// String resolution service for user-facing text.
#[derive(Debug, Clone)]
pub struct Translator {
    default_locale: String,
}

impl Translator {
    pub fn new(default_locale: &str) -> Self {
        let default_locale = if AVAILABLE_LOCALES.contains(&default_locale) {
            default_locale.to_string()
        } else {
            "ru".to_string()
        };
        Self { default_locale }
    }

    /// Resolve a message key for a locale.
    pub fn t(&self, key: &str, locale: &str) -> String {
        self.lookup(key, locale)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Resolve a message key and substitute `{name}` placeholders.
    pub fn t_with(&self, key: &str, locale: &str, placeholders: &[(&str, &str)]) -> String {
        let mut text = self.t(key, locale);
        for (name, value) in placeholders {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }

    fn lookup(&self, key: &str, locale: &str) -> Option<&'static str> {
        let active = if AVAILABLE_LOCALES.contains(&locale) {
            locale
        } else {
            self.default_locale.as_str()
        };
        MESSAGES
            .get(&(active, key))
            .or_else(|| MESSAGES.get(&("en", key)))
            .copied()
    }
}

static MESSAGES: LazyLock<HashMap<(&'static str, &'static str), &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();
        for (locale, key, text) in CATALOG {
            m.insert((*locale, *key), *text);
        }
        m
    });

#[rustfmt::skip]
const CATALOG: &[(&str, &str, &str)] = &[
    // ── Russian ─────────────────────────────────────────────────────
    ("ru", "start_greeting", "Привет, {username}! Я помогу найти напарников в Roblox. Давай настроим профиль."),
    ("ru", "ask_nick", "Как тебя зовут в Roblox? Используй буквы, цифры и подчёркивания."),
    ("ru", "invalid_nick", "Имя выглядит некорректно. Используй 3–30 символов: буквы, цифры, подчёркивания или дефис."),
    ("ru", "ask_age", "Сколько тебе лет? Введи число от 8 до 99."),
    ("ru", "invalid_age", "Возраст должен быть числом от 8 до 99."),
    ("ru", "ask_language", "Выбери язык интерфейса и поиска."),
    ("ru", "language_ru", "Русский"),
    ("ru", "language_en", "English"),
    ("ru", "ask_games", "Выбери до пяти любимых режимов. Нажимай, чтобы отметить, и жми «Готово», когда закончишь. Можно написать название, чтобы отфильтровать список."),
    ("ru", "games_limit", "Можно выбрать не больше пяти режимов."),
    ("ru", "games_need_one", "Нужно выбрать хотя бы один режим."),
    ("ru", "games_no_matches", "Ничего похожего не нашлось. Попробуй другое название."),
    ("ru", "ask_bio", "Напиши пару слов о себе (до 300 символов) или нажми «Пропустить»."),
    ("ru", "bio_too_long", "Описание слишком длинное. Используй до 300 символов."),
    ("ru", "ask_photo", "Пришли аватар (фото) или нажми «Пропустить»."),
    ("ru", "registration_complete", "Готово! Профиль сохранён. Доступные команды: /browse, /search, /chat, /profile, /help."),
    ("ru", "profile_missing", "Профиль не найден. Нажми /start, чтобы зарегистрироваться."),
    ("ru", "profile_title", "Твой профиль"),
    ("ru", "profile_username", "Username: @{username}"),
    ("ru", "profile_nick", "Roblox: {roblox_nick}"),
    ("ru", "profile_age", "Возраст: {age}"),
    ("ru", "profile_langs", "Язык: {languages}"),
    ("ru", "profile_games", "Режимы: {games}"),
    ("ru", "profile_bio", "О себе: {bio}"),
    ("ru", "profile_no_bio", "О себе: не заполнено"),
    ("ru", "profile_buttons_edit", "Редактировать"),
    ("ru", "profile_buttons_delete", "Удалить профиль"),
    ("ru", "edit_coming_soon", "Редактирование появится позже. Пока можно перезапустить регистрацию через /start."),
    ("ru", "profile_deleted", "Профиль удалён. Можно пройти регистрацию заново: /start."),
    ("ru", "already_registered", "Похоже, профиль уже есть. Можешь открыть его через /profile."),
    ("ru", "main_menu_hint", "Чем займёмся? /browse — лента игроков, /search — подбор по фильтрам, /chat — быстрый чат."),
    ("ru", "photo_saved", "Фото сохранено."),
    ("ru", "photo_skipped", "Фото пропущено."),
    ("ru", "bio_saved", "Био сохранено."),
    ("ru", "bio_skipped", "Био пропущено."),
    ("ru", "done", "Готово"),
    ("ru", "skip", "Пропустить"),
    ("ru", "cancel", "Сценарий отменён."),
    ("ru", "games_empty", "Список режимов пуст. Добавьте данные в data/games.json."),
    ("ru", "help", "Команды: /start — регистрация, /profile — профиль, /browse — лента, /search — поиск, /chat — быстрый чат, /cancel — отменить текущий шаг."),
    ("ru", "nick_taken", "Этот ник уже используется. Попробуй другой."),
    ("ru", "store_failure", "Что-то пошло не так. Попробуй ещё раз чуть позже."),
    // ── English ─────────────────────────────────────────────────────
    ("en", "start_greeting", "Hi, {username}! I’ll help you find Roblox teammates. Let’s set up your profile."),
    ("en", "ask_nick", "What is your Roblox nickname? Use letters, digits, underscores."),
    ("en", "invalid_nick", "Nickname looks invalid. Use 3–30 characters: letters, digits, underscores or dash."),
    ("en", "ask_age", "How old are you? Enter a number between 8 and 99."),
    ("en", "invalid_age", "Age should be a number between 8 and 99."),
    ("en", "ask_language", "Choose your interface and search language."),
    ("en", "language_ru", "Русский"),
    ("en", "language_en", "English"),
    ("en", "ask_games", "Pick up to five favourite modes. Tap to toggle and press “Done” when ready. Type a name to filter the list."),
    ("en", "games_limit", "You can select at most five modes."),
    ("en", "games_need_one", "Pick at least one mode to continue."),
    ("en", "games_no_matches", "Nothing similar found. Try another name."),
    ("en", "ask_bio", "Tell a bit about yourself (up to 300 chars) or tap “Skip”."),
    ("en", "bio_too_long", "Description is too long. Keep it under 300 characters."),
    ("en", "ask_photo", "Send an avatar photo or tap “Skip”."),
    ("en", "registration_complete", "All set! Profile saved. Commands: /browse, /search, /chat, /profile, /help."),
    ("en", "profile_missing", "Profile not found. Use /start to register."),
    ("en", "profile_title", "Your profile"),
    ("en", "profile_username", "Username: @{username}"),
    ("en", "profile_nick", "Roblox: {roblox_nick}"),
    ("en", "profile_age", "Age: {age}"),
    ("en", "profile_langs", "Language: {languages}"),
    ("en", "profile_games", "Modes: {games}"),
    ("en", "profile_bio", "About: {bio}"),
    ("en", "profile_no_bio", "About: not provided"),
    ("en", "profile_buttons_edit", "Edit"),
    ("en", "profile_buttons_delete", "Delete profile"),
    ("en", "edit_coming_soon", "Editing is coming later. You can restart onboarding with /start."),
    ("en", "profile_deleted", "Profile deleted. You can onboard again via /start."),
    ("en", "already_registered", "Looks like you already have a profile. You can view it via /profile."),
    ("en", "main_menu_hint", "What next? /browse — player feed, /search — filtered match, /chat — quick chat."),
    ("en", "photo_saved", "Photo saved."),
    ("en", "photo_skipped", "Photo skipped."),
    ("en", "bio_saved", "Bio saved."),
    ("en", "bio_skipped", "Bio skipped."),
    ("en", "done", "Done"),
    ("en", "skip", "Skip"),
    ("en", "cancel", "Flow cancelled."),
    ("en", "games_empty", "The game list is empty. Add entries to data/games.json."),
    ("en", "help", "Commands: /start — onboarding, /profile — profile, /browse — feed, /search — search, /chat — quick chat, /cancel — cancel current step."),
    ("en", "nick_taken", "This nickname is already taken. Try another one."),
    ("en", "store_failure", "Something went wrong. Please try again in a bit."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_in_requested_locale() {
        let tr = Translator::new("ru");
        assert_eq!(tr.t("done", "en"), "Done");
        assert_eq!(tr.t("done", "ru"), "Готово");
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let tr = Translator::new("en");
        assert_eq!(tr.t("done", "fr"), "Done");
    }

    #[test]
    fn unknown_key_returns_key() {
        let tr = Translator::new("en");
        assert_eq!(tr.t("no_such_key", "en"), "no_such_key");
    }

    #[test]
    fn placeholders_substituted() {
        let tr = Translator::new("en");
        let text = tr.t_with("start_greeting", "en", &[("username", "Ann")]);
        assert!(text.contains("Hi, Ann!"), "got: {text}");
    }

    #[test]
    fn every_ru_key_has_en_counterpart() {
        for (locale, key, _) in CATALOG {
            if *locale == "ru" {
                assert!(
                    MESSAGES.contains_key(&("en", *key)),
                    "missing en translation for {key}"
                );
            }
        }
    }

    #[test]
    fn invalid_default_locale_coerced() {
        let tr = Translator::new("xx");
        assert_eq!(tr.t("done", "zz"), "Готово");
    }
}
