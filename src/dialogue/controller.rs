//! The onboarding dialogue controller.
//!
//! Routes `(state, event)` pairs through validation, mutates the
//! conversation store, and emits prompts via the notifier. On the final
//! step it assembles a `RegistrationPayload` and hands it to the profile
//! store; a duplicate nickname rewinds the flow to WaitNick.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::config::Settings;
use crate::dialogue::event::{EventContext, InboundEvent};
use crate::dialogue::notify::Notifier;
use crate::dialogue::state::{ConversationState, Scratch};
use crate::dialogue::store::ConversationStore;
use crate::error::{Result, StorageError};
use crate::i18n::Translator;
use crate::keyboards;
use crate::locale::resolve_locale;
use crate::matcher;
use crate::profiles::format::format_profile;
use crate::profiles::model::{GameCatalogEntry, Profile, RegistrationPayload};
use crate::profiles::store::ProfileStore;

static NICKNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,30}$").expect("valid nickname pattern"));

const MIN_AGE: u8 = 8;
const MAX_AGE: u8 = 99;
const MAX_BIO_LENGTH: usize = 300;
const MAX_GAMES: usize = 5;

/// Orchestrates the registration conversation for all users.
pub struct DialogueController {
    profiles: Arc<dyn ProfileStore>,
    conversations: Arc<dyn ConversationStore>,
    notifier: Arc<dyn Notifier>,
    translator: Translator,
    settings: Settings,
}

impl DialogueController {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        conversations: Arc<dyn ConversationStore>,
        notifier: Arc<dyn Notifier>,
        translator: Translator,
        settings: Settings,
    ) -> Self {
        Self {
            profiles,
            conversations,
            notifier,
            translator,
            settings,
        }
    }

    /// Process one inbound event for one user.
    ///
    /// Store failures surface to the user as a generic localized message;
    /// the conversation state is left as-is and nothing is retried.
    pub async fn handle_event(&self, ctx: &EventContext, event: InboundEvent) {
        if let Err(e) = self.dispatch(ctx, &event).await {
            tracing::warn!(user_id = ctx.user_id, error = %e, "event handling failed");
            let locale = self.fallback_locale(ctx);
            let text = self.translator.t("store_failure", &locale);
            if let Err(send_err) = self.notifier.send(ctx.chat_id, &text, None).await {
                tracing::warn!(user_id = ctx.user_id, error = %send_err, "failure notice undeliverable");
            }
        }
    }

    async fn dispatch(&self, ctx: &EventContext, event: &InboundEvent) -> Result<()> {
        let record = self.conversations.get(ctx.user_id).await?;
        let state = record.state;
        let scratch = record.scratch;

        match event {
            InboundEvent::Command { name } => self.on_command(ctx, state, name).await,
            InboundEvent::Text { text } => match state {
                ConversationState::WaitNick => self.on_nick(ctx, scratch, text).await,
                ConversationState::WaitAge => self.on_age(ctx, scratch, text).await,
                ConversationState::WaitGames => self.on_games_search(ctx, scratch, text).await,
                ConversationState::WaitBio => self.on_bio(ctx, scratch, text).await,
                ConversationState::WaitPhoto => self.reprompt_photo(ctx, &scratch).await,
                ConversationState::Idle | ConversationState::WaitLanguage => Ok(()),
            },
            InboundEvent::Photo { file_id } => match state {
                ConversationState::WaitPhoto => self.on_photo(ctx, scratch, file_id).await,
                _ => Ok(()),
            },
            InboundEvent::Callback { id, data } => {
                self.on_callback(ctx, state, scratch, id, data).await
            }
        }
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Command interruption policy: any slash command received inside the
    /// flow clears the conversation first, then `/start` and `/profile`
    /// dispatch to their own handlers; everything else just confirms the
    /// cancellation.
    async fn on_command(
        &self,
        ctx: &EventContext,
        state: ConversationState,
        name: &str,
    ) -> Result<()> {
        if state.is_onboarding() {
            tracing::info!(user_id = ctx.user_id, state = %state, command = name, "flow interrupted");
            self.conversations.clear(ctx.user_id).await?;
            match name {
                "start" => return self.cmd_start(ctx).await,
                "profile" => return self.cmd_profile(ctx).await,
                _ => {
                    let locale = self.fallback_locale(ctx);
                    let text = self.translator.t("cancel", &locale);
                    self.notifier.send(ctx.chat_id, &text, None).await?;
                    return Ok(());
                }
            }
        }

        match name {
            "start" => self.cmd_start(ctx).await,
            "profile" => self.cmd_profile(ctx).await,
            "help" => {
                let locale = self.fallback_locale(ctx);
                let text = self.translator.t("help", &locale);
                self.notifier.send(ctx.chat_id, &text, None).await?;
                Ok(())
            }
            "cancel" => {
                let locale = self.fallback_locale(ctx);
                let text = self.translator.t("cancel", &locale);
                self.notifier.send(ctx.chat_id, &text, None).await?;
                Ok(())
            }
            other => {
                tracing::debug!(user_id = ctx.user_id, command = other, "ignoring unknown command");
                Ok(())
            }
        }
    }

    /// `/start`: begin onboarding, or show the existing profile.
    async fn cmd_start(&self, ctx: &EventContext) -> Result<()> {
        self.conversations.clear(ctx.user_id).await?;
        let locale = self.fallback_locale(ctx);

        if let Some(profile) = self.profiles.get(ctx.user_id).await? {
            let text = self.translator.t("already_registered", &locale);
            self.notifier.send(ctx.chat_id, &text, None).await?;
            self.send_profile(ctx.chat_id, &profile, &locale).await?;
            return Ok(());
        }

        self.conversations
            .put_scratch(ctx.user_id, &Scratch::with_locale(&locale))
            .await?;
        self.conversations
            .set_state(ctx.user_id, ConversationState::WaitNick)
            .await?;

        let username = ctx.first_name.as_deref().unwrap_or("");
        let greeting = self
            .translator
            .t_with("start_greeting", &locale, &[("username", username)]);
        self.notifier.send(ctx.chat_id, &greeting, None).await?;
        let ask = self.translator.t("ask_nick", &locale);
        self.notifier.send(ctx.chat_id, &ask, None).await?;
        tracing::info!(user_id = ctx.user_id, %locale, "onboarding started");
        Ok(())
    }

    /// `/profile`: show the profile card or a missing-profile notice.
    async fn cmd_profile(&self, ctx: &EventContext) -> Result<()> {
        let base_locale = self.fallback_locale(ctx);
        match self.profiles.get(ctx.user_id).await? {
            Some(profile) => {
                self.profiles.touch(ctx.user_id).await?;
                let locale = profile
                    .primary_language()
                    .unwrap_or(&base_locale)
                    .to_string();
                self.send_profile(ctx.chat_id, &profile, &locale).await
            }
            None => {
                let text = self.translator.t("profile_missing", &base_locale);
                self.notifier.send(ctx.chat_id, &text, None).await?;
                Ok(())
            }
        }
    }

    // ── Text steps ──────────────────────────────────────────────────

    async fn on_nick(&self, ctx: &EventContext, mut scratch: Scratch, text: &str) -> Result<()> {
        let locale = self.locale_of(&scratch, ctx);
        let nick = text.trim();
        if !NICKNAME_RE.is_match(nick) {
            let msg = self.translator.t("invalid_nick", &locale);
            self.notifier.send(ctx.chat_id, &msg, None).await?;
            return Ok(());
        }

        scratch.nickname = Some(nick.to_string());
        self.conversations.put_scratch(ctx.user_id, &scratch).await?;
        self.conversations
            .set_state(ctx.user_id, ConversationState::WaitAge)
            .await?;
        let ask = self.translator.t("ask_age", &locale);
        self.notifier.send(ctx.chat_id, &ask, None).await?;
        Ok(())
    }

    async fn on_age(&self, ctx: &EventContext, mut scratch: Scratch, text: &str) -> Result<()> {
        let locale = self.locale_of(&scratch, ctx);
        let text = text.trim();
        let age = match parse_age(text) {
            Some(age) => age,
            None => {
                let msg = self.translator.t("invalid_age", &locale);
                self.notifier.send(ctx.chat_id, &msg, None).await?;
                return Ok(());
            }
        };

        scratch.age = Some(age);
        self.conversations.put_scratch(ctx.user_id, &scratch).await?;
        self.conversations
            .set_state(ctx.user_id, ConversationState::WaitLanguage)
            .await?;
        let ask = self.translator.t("ask_language", &locale);
        let kb = keyboards::language_keyboard(
            &self.translator,
            &locale,
            &self.settings.supported_languages,
        );
        self.notifier.send(ctx.chat_id, &ask, Some(kb)).await?;
        Ok(())
    }

    /// Free-text while picking games runs the fuzzy matcher over the cached
    /// catalog and re-renders the multi-select with the selection preserved.
    async fn on_games_search(
        &self,
        ctx: &EventContext,
        mut scratch: Scratch,
        query: &str,
    ) -> Result<()> {
        let locale = self.locale_of(&scratch, ctx);
        if scratch.games_catalog.is_empty() {
            // "no catalog loaded" is distinct from "no matches"
            let msg = self.translator.t("games_empty", &locale);
            self.notifier.send(ctx.chat_id, &msg, None).await?;
            return Ok(());
        }

        let matches = matcher::rank(query, &scratch.games_catalog);
        if matches.is_empty() {
            let msg = self.translator.t("games_no_matches", &locale);
            self.notifier.send(ctx.chat_id, &msg, None).await?;
            return Ok(());
        }

        scratch.search_filter = Some(query.trim().to_string());
        self.conversations.put_scratch(ctx.user_id, &scratch).await?;

        let ask = self.translator.t("ask_games", &locale);
        let kb =
            keyboards::games_keyboard(&self.translator, &locale, &matches, &scratch.selected_games);
        self.notifier.send(ctx.chat_id, &ask, Some(kb)).await?;
        Ok(())
    }

    async fn on_bio(&self, ctx: &EventContext, mut scratch: Scratch, text: &str) -> Result<()> {
        let locale = self.locale_of(&scratch, ctx);
        let bio = text.trim();
        if bio.chars().count() > MAX_BIO_LENGTH {
            let msg = self.translator.t("bio_too_long", &locale);
            self.notifier.send(ctx.chat_id, &msg, None).await?;
            return Ok(());
        }

        scratch.description = Some(bio.to_string());
        self.conversations.put_scratch(ctx.user_id, &scratch).await?;
        let saved = self.translator.t("bio_saved", &locale);
        self.notifier.send(ctx.chat_id, &saved, None).await?;
        self.prompt_photo(ctx, &locale).await
    }

    async fn on_photo(
        &self,
        ctx: &EventContext,
        mut scratch: Scratch,
        file_id: &str,
    ) -> Result<()> {
        let locale = self.locale_of(&scratch, ctx);
        scratch.photo_reference = Some(file_id.to_string());
        self.conversations.put_scratch(ctx.user_id, &scratch).await?;
        let saved = self.translator.t("photo_saved", &locale);
        self.notifier.send(ctx.chat_id, &saved, None).await?;
        self.finalize(ctx, scratch, &locale).await
    }

    async fn reprompt_photo(&self, ctx: &EventContext, scratch: &Scratch) -> Result<()> {
        let locale = self.locale_of(scratch, ctx);
        self.prompt_photo(ctx, &locale).await
    }

    async fn prompt_photo(&self, ctx: &EventContext, locale: &str) -> Result<()> {
        self.conversations
            .set_state(ctx.user_id, ConversationState::WaitPhoto)
            .await?;
        let ask = self.translator.t("ask_photo", locale);
        let kb = keyboards::skip_keyboard(&self.translator, locale);
        self.notifier.send(ctx.chat_id, &ask, Some(kb)).await?;
        Ok(())
    }

    // ── Callbacks ───────────────────────────────────────────────────

    async fn on_callback(
        &self,
        ctx: &EventContext,
        state: ConversationState,
        scratch: Scratch,
        callback_id: &str,
        data: &str,
    ) -> Result<()> {
        match (state, data) {
            (ConversationState::WaitLanguage, d) if d.starts_with("lang:") => {
                self.on_language(ctx, scratch, callback_id, &d["lang:".len()..])
                    .await
            }
            (ConversationState::WaitGames, d) if d.starts_with("game:") => {
                self.on_toggle_game(ctx, scratch, callback_id, &d["game:".len()..])
                    .await
            }
            (ConversationState::WaitGames, "games:done") => {
                self.on_games_done(ctx, scratch, callback_id).await
            }
            (ConversationState::WaitBio, "skip") => {
                self.on_skip_bio(ctx, scratch, callback_id).await
            }
            (ConversationState::WaitPhoto, "skip") => {
                self.on_skip_photo(ctx, scratch, callback_id).await
            }
            (_, "profile:edit") => {
                self.notifier.answer_callback(callback_id, None, false).await?;
                let locale = self.fallback_locale(ctx);
                let text = self.translator.t("edit_coming_soon", &locale);
                self.notifier.send(ctx.chat_id, &text, None).await?;
                Ok(())
            }
            (_, "profile:delete") => self.on_delete_profile(ctx, callback_id).await,
            _ => {
                // Stale or unparsable button — acknowledge silently.
                self.notifier.answer_callback(callback_id, None, false).await?;
                Ok(())
            }
        }
    }

    async fn on_language(
        &self,
        ctx: &EventContext,
        mut scratch: Scratch,
        callback_id: &str,
        choice: &str,
    ) -> Result<()> {
        self.notifier.answer_callback(callback_id, None, false).await?;

        let supported = &self.settings.supported_languages;
        let locale = if supported.iter().any(|l| l == choice) {
            choice.to_string()
        } else {
            self.settings.default_language.clone()
        };
        scratch.language = Some(locale.clone());
        scratch.locale = Some(locale.clone());

        let games = self.profiles.list_active_games().await?;
        if games.is_empty() {
            tracing::warn!(user_id = ctx.user_id, "game catalog is empty, aborting onboarding");
            let msg = self.translator.t("games_empty", &locale);
            self.notifier.send(ctx.chat_id, &msg, None).await?;
            // Clear instead of parking the user in WaitLanguage forever;
            // /start retries once games are seeded.
            self.conversations.clear(ctx.user_id).await?;
            return Ok(());
        }

        scratch.selected_games.clear();
        scratch.games_catalog = games.clone();
        scratch.search_filter = None;
        self.conversations.put_scratch(ctx.user_id, &scratch).await?;
        self.conversations
            .set_state(ctx.user_id, ConversationState::WaitGames)
            .await?;

        let ask = self.translator.t("ask_games", &locale);
        let kb =
            keyboards::games_keyboard(&self.translator, &locale, &games, &scratch.selected_games);
        self.notifier.send(ctx.chat_id, &ask, Some(kb)).await?;
        Ok(())
    }

    async fn on_toggle_game(
        &self,
        ctx: &EventContext,
        mut scratch: Scratch,
        callback_id: &str,
        raw_id: &str,
    ) -> Result<()> {
        let locale = self.locale_of(&scratch, ctx);
        let game_id: i64 = match raw_id.parse() {
            Ok(id) => id,
            Err(_) => {
                self.notifier.answer_callback(callback_id, None, false).await?;
                return Ok(());
            }
        };
        if scratch.catalog_entry(game_id).is_none() {
            // The button references an id outside the cached snapshot.
            self.notifier.answer_callback(callback_id, None, false).await?;
            return Ok(());
        }

        if scratch.selected_games.contains(&game_id) {
            scratch.selected_games.remove(&game_id);
        } else {
            if scratch.selected_games.len() >= MAX_GAMES {
                let msg = self.translator.t("games_limit", &locale);
                self.notifier
                    .answer_callback(callback_id, Some(&msg), true)
                    .await?;
                return Ok(());
            }
            scratch.selected_games.insert(game_id);
        }

        self.conversations.put_scratch(ctx.user_id, &scratch).await?;

        if let Some(message_id) = ctx.message_id {
            let view = self.visible_catalog(&scratch);
            let kb = keyboards::games_keyboard(
                &self.translator,
                &locale,
                &view,
                &scratch.selected_games,
            );
            self.notifier.edit_keyboard(ctx.chat_id, message_id, kb).await?;
        }
        self.notifier.answer_callback(callback_id, None, false).await?;
        Ok(())
    }

    /// The catalog slice the user is currently looking at: the active fuzzy
    /// filter when one is set and still matches, otherwise the full snapshot.
    fn visible_catalog(&self, scratch: &Scratch) -> Vec<GameCatalogEntry> {
        if let Some(ref query) = scratch.search_filter {
            let matches = matcher::rank(query, &scratch.games_catalog);
            if !matches.is_empty() {
                return matches;
            }
        }
        scratch.games_catalog.clone()
    }

    async fn on_games_done(
        &self,
        ctx: &EventContext,
        scratch: Scratch,
        callback_id: &str,
    ) -> Result<()> {
        let locale = self.locale_of(&scratch, ctx);
        if scratch.selected_games.is_empty() {
            let msg = self.translator.t("games_need_one", &locale);
            self.notifier
                .answer_callback(callback_id, Some(&msg), true)
                .await?;
            return Ok(());
        }

        self.conversations
            .set_state(ctx.user_id, ConversationState::WaitBio)
            .await?;
        let ask = self.translator.t("ask_bio", &locale);
        let kb = keyboards::skip_keyboard(&self.translator, &locale);
        self.notifier.send(ctx.chat_id, &ask, Some(kb)).await?;
        self.notifier.answer_callback(callback_id, None, false).await?;
        Ok(())
    }

    async fn on_skip_bio(
        &self,
        ctx: &EventContext,
        mut scratch: Scratch,
        callback_id: &str,
    ) -> Result<()> {
        let locale = self.locale_of(&scratch, ctx);
        scratch.description = None;
        self.conversations.put_scratch(ctx.user_id, &scratch).await?;
        let skipped = self.translator.t("bio_skipped", &locale);
        self.notifier.send(ctx.chat_id, &skipped, None).await?;
        self.notifier.answer_callback(callback_id, None, false).await?;
        self.prompt_photo(ctx, &locale).await
    }

    async fn on_skip_photo(
        &self,
        ctx: &EventContext,
        mut scratch: Scratch,
        callback_id: &str,
    ) -> Result<()> {
        let locale = self.locale_of(&scratch, ctx);
        scratch.photo_reference = None;
        self.conversations.put_scratch(ctx.user_id, &scratch).await?;
        let skipped = self.translator.t("photo_skipped", &locale);
        self.notifier
            .answer_callback(callback_id, Some(&skipped), false)
            .await?;
        self.finalize(ctx, scratch, &locale).await
    }

    async fn on_delete_profile(&self, ctx: &EventContext, callback_id: &str) -> Result<()> {
        let locale = self.fallback_locale(ctx);
        let deleted = self.profiles.delete(ctx.user_id).await?;
        self.notifier.answer_callback(callback_id, None, false).await?;
        let key = if deleted {
            self.conversations.clear(ctx.user_id).await?;
            tracing::info!(user_id = ctx.user_id, "profile deleted");
            "profile_deleted"
        } else {
            "profile_missing"
        };
        let text = self.translator.t(key, &locale);
        self.notifier.send(ctx.chat_id, &text, None).await?;
        Ok(())
    }

    // ── Finalize ────────────────────────────────────────────────────

    /// Assemble the payload and commit it.
    ///
    /// A duplicate nickname rewinds to WaitNick keeping only the locale;
    /// every other collected answer is discarded.
    async fn finalize(&self, ctx: &EventContext, scratch: Scratch, locale: &str) -> Result<()> {
        let (Some(nickname), Some(age)) = (scratch.nickname.clone(), scratch.age) else {
            tracing::warn!(user_id = ctx.user_id, "finalize reached with incomplete scratch");
            self.conversations.clear(ctx.user_id).await?;
            return Ok(());
        };

        let payload = RegistrationPayload {
            external_id: ctx.user_id,
            display_name: ctx.username.clone(),
            nickname,
            age,
            languages: vec![locale.to_string()],
            game_ids: scratch.selected_games.iter().copied().collect(),
            description: scratch.description.clone(),
            photo_reference: scratch.photo_reference.clone(),
        };

        match self.profiles.upsert(&payload).await {
            Ok(profile) => {
                self.conversations.clear(ctx.user_id).await?;
                let done = self.translator.t("registration_complete", locale);
                self.notifier.send(ctx.chat_id, &done, None).await?;
                let hint = self.translator.t("main_menu_hint", locale);
                self.notifier.send(ctx.chat_id, &hint, None).await?;
                self.send_profile(ctx.chat_id, &profile, locale).await?;
                tracing::info!(user_id = ctx.user_id, nickname = %profile.nickname, "registration complete");
                Ok(())
            }
            Err(StorageError::DuplicateNickname(nick)) => {
                tracing::info!(user_id = ctx.user_id, nickname = %nick, "nickname conflict, rewinding");
                self.conversations
                    .put_scratch(ctx.user_id, &Scratch::with_locale(locale))
                    .await?;
                self.conversations
                    .set_state(ctx.user_id, ConversationState::WaitNick)
                    .await?;
                let taken = self.translator.t("nick_taken", locale);
                self.notifier.send(ctx.chat_id, &taken, None).await?;
                let ask = self.translator.t("ask_nick", locale);
                self.notifier.send(ctx.chat_id, &ask, None).await?;
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    async fn send_profile(&self, chat_id: i64, profile: &Profile, locale: &str) -> Result<()> {
        let text = format_profile(profile, &self.translator, locale);
        let kb = keyboards::profile_actions_keyboard(&self.translator, locale);
        match profile.photo_reference.as_deref() {
            Some(photo) => {
                self.notifier
                    .send_photo(chat_id, photo, &text, Some(kb))
                    .await?
            }
            None => self.notifier.send(chat_id, &text, Some(kb)).await?,
        }
        Ok(())
    }

    /// Locale for a mid-flow step: chosen language, then the locale stored
    /// at flow entry, then client metadata / configured default.
    fn locale_of(&self, scratch: &Scratch, ctx: &EventContext) -> String {
        let explicit = scratch
            .language
            .as_deref()
            .or(scratch.locale.as_deref());
        resolve_locale(
            explicit,
            ctx.language_code.as_deref(),
            &self.settings.default_language,
            &self.settings.supported_languages,
        )
    }

    /// Locale when no scratch is available (commands, profile actions).
    fn fallback_locale(&self, ctx: &EventContext) -> String {
        resolve_locale(
            None,
            ctx.language_code.as_deref(),
            &self.settings.default_language,
            &self.settings.supported_languages,
        )
    }
}

/// Digits-only age in [MIN_AGE, MAX_AGE].
fn parse_age(text: &str) -> Option<u8> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let age: u8 = text.parse().ok()?;
    (MIN_AGE..=MAX_AGE).contains(&age).then_some(age)
}
