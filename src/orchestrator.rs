//! Session Orchestrator
//!
//! Translates inbound client events into engine calls, applies the
//! results to the owning room, and fans out tailored snapshots. Every
//! event passes through the same gate: resolve session, consult the rate
//! limiter, dispatch. Validation failures go back to the offender only;
//! room mutations are followed by a room broadcast, never preceded.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::GameConfig;
use crate::friends::{FriendError, FriendService, InMemoryFriendService};
use crate::game::engine;
use crate::game::phase::Phase;
use crate::game::rng::{RandomSource, ThreadRandom};
use crate::game::state::{GameMode, GameState, Player, Role, SessionId, UserId, Winner};
use crate::game::words;
use crate::network::protocol::{ChatMessage, ClientEvent, ErrorCode, ServerEvent, CHAT_MAX_LEN};
use crate::network::rate_limit::{AllowAll, RateLimiter, SlidingWindowLimiter};
use crate::network::session::{
    AuthBinding, Profile, Session, SessionRegistry, SESSION_CHANNEL_DEPTH,
};
use crate::network::view::{self, PlayerView};
use crate::room::presence::PresenceIndex;
use crate::room::room::{Room, RoomStatus};
use crate::room::store::RoomStore;
use crate::scheduler;
use crate::stats::{LoggingStatsSink, StatsSink};

/// Display names longer than this are truncated.
const NAME_MAX_LEN: usize = 24;

/// The event-processing hub tying the stores, engine, scheduler, and
/// collaborators together.
pub struct Orchestrator {
    game_config: Arc<GameConfig>,
    store: Arc<RoomStore>,
    sessions: Arc<SessionRegistry>,
    presence: Arc<PresenceIndex>,
    limiter: Arc<dyn RateLimiter>,
    stats: Arc<dyn StatsSink>,
    friends: Arc<dyn FriendService>,
}

impl Orchestrator {
    /// Create an orchestrator with explicit collaborators.
    pub fn new(
        game_config: GameConfig,
        limiter: Arc<dyn RateLimiter>,
        stats: Arc<dyn StatsSink>,
        friends: Arc<dyn FriendService>,
    ) -> Self {
        let store = Arc::new(RoomStore::new(game_config.max_players));
        Self {
            game_config: Arc::new(game_config),
            store,
            sessions: Arc::new(SessionRegistry::new()),
            presence: Arc::new(PresenceIndex::new()),
            limiter,
            stats,
            friends,
        }
    }

    /// Production wiring: sliding-window limiter, logging stats sink,
    /// in-memory friend service.
    pub fn with_defaults(game_config: GameConfig) -> Self {
        Self::new(
            game_config,
            Arc::new(SlidingWindowLimiter::with_defaults()),
            Arc::new(LoggingStatsSink::new()),
            Arc::new(InMemoryFriendService::new()),
        )
    }

    /// Library/test wiring without rate limiting.
    pub fn unlimited(game_config: GameConfig) -> Self {
        Self::new(
            game_config,
            Arc::new(AllowAll),
            Arc::new(LoggingStatsSink::new()),
            Arc::new(InMemoryFriendService::new()),
        )
    }

    /// The session registry (fanout surface).
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// The room store.
    pub fn store(&self) -> &Arc<RoomStore> {
        &self.store
    }

    /// The game configuration.
    pub fn game_config(&self) -> &GameConfig {
        &self.game_config
    }

    /// Register a new connection with its one-time auth binding.
    ///
    /// Returns the session id and the receiver half of the session's
    /// outbound channel; the transport forwards received events to the
    /// wire.
    pub async fn connect(&self, auth: AuthBinding) -> (SessionId, mpsc::Receiver<ServerEvent>) {
        let id = SessionId::generate();
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_DEPTH);
        self.sessions
            .register(Session::new(id.clone(), auth, tx))
            .await;
        (id, rx)
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Handle one inbound event from a session.
    pub async fn handle_event(&self, session_id: &SessionId, event: ClientEvent) {
        let user_id = self.sessions.user_of(session_id).await;
        if !self
            .limiter
            .allow(event.kind(), session_id, user_id.as_ref())
        {
            self.send_error(session_id, ErrorCode::RateLimited).await;
            return;
        }

        match event {
            ClientEvent::JoinGame { name, avatar } => {
                self.on_join_game(session_id, name, avatar).await;
            }
            ClientEvent::CreateRoom {
                name,
                password,
                category,
                game_mode,
            } => {
                self.on_create_room(session_id, name, password, category, game_mode)
                    .await;
            }
            ClientEvent::JoinRoom { room_id, password } => {
                self.on_join_room(session_id, &room_id, password.as_deref())
                    .await;
            }
            ClientEvent::LeaveRoom => {
                self.on_leave_room(session_id).await;
            }
            ClientEvent::SetReady { ready } => {
                self.on_set_ready(session_id, ready).await;
            }
            ClientEvent::StartGame { language } => {
                self.on_start_game(session_id, language.as_deref()).await;
            }
            ClientEvent::SubmitHint { text } => {
                self.on_submit_hint(session_id, &text).await;
            }
            ClientEvent::SubmitVote { target } => {
                self.on_submit_vote(session_id, &target).await;
            }
            ClientEvent::PlayAgain => {
                self.on_play_again(session_id).await;
            }
            ClientEvent::SendMessage { text } => {
                self.on_send_message(session_id, &text).await;
            }
            ClientEvent::GetRooms => {
                self.send_room_list_to(session_id).await;
            }
            friend_event => {
                self.on_friend_event(session_id, user_id, friend_event).await;
            }
        }
    }

    /// Handle a dropped connection: room cleanup plus presence fanout.
    pub async fn handle_disconnect(&self, session_id: &SessionId) {
        self.leave_current_room(session_id, false).await;

        if let Some(user_id) = self.sessions.user_of(session_id).await {
            let went_offline = self.presence.disconnect(&user_id, session_id).await;
            if went_offline {
                self.notify_friends(
                    &user_id,
                    ServerEvent::FriendOffline {
                        user_id: user_id.clone(),
                    },
                )
                .await;
            }
        }
    }

    // =========================================================================
    // LOBBY HANDLERS
    // =========================================================================

    async fn on_join_game(&self, session_id: &SessionId, name: String, avatar: String) {
        let name = clean_name(&name);
        let profile = Profile {
            name: name.clone(),
            avatar: avatar.clone(),
        };
        self.sessions.set_profile(session_id, profile).await;

        self.sessions
            .send(
                session_id,
                ServerEvent::PlayerStatus(PlayerView {
                    session_id: session_id.clone(),
                    name,
                    avatar,
                    ready: false,
                    eliminated: false,
                    has_voted: false,
                }),
            )
            .await;

        if let Some(user_id) = self.sessions.user_of(session_id).await {
            let came_online = self.presence.connect(&user_id, session_id.clone()).await;
            let friends = self.friends.friends_of(&user_id).await;
            if came_online {
                self.notify_friends(
                    &user_id,
                    ServerEvent::FriendOnline {
                        user_id: user_id.clone(),
                    },
                )
                .await;
            }
            let online = self.presence.online_among(&friends).await;
            self.sessions
                .send(session_id, ServerEvent::FriendsOnlineList { user_ids: online })
                .await;
        }

        self.send_room_list_to(session_id).await;
    }

    async fn on_create_room(
        &self,
        session_id: &SessionId,
        name: String,
        password: Option<String>,
        category: Option<String>,
        game_mode: Option<GameMode>,
    ) {
        let Some(profile) = self.sessions.profile(session_id).await else {
            self.send_error(session_id, ErrorCode::NotAuthorized).await;
            return;
        };

        // One room per session: joining a new one leaves the old.
        self.leave_current_room(session_id, false).await;

        let room_name = {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                format!("{}'s Room", profile.name)
            } else {
                trimmed.chars().take(40).collect()
            }
        };
        let password = password.filter(|p| !p.is_empty());
        let owner = Player::new(session_id.clone(), profile.name, profile.avatar);

        let room_arc = self
            .store
            .create_room(
                room_name,
                password,
                category,
                game_mode.unwrap_or_default(),
                owner,
            )
            .await;

        let payloads = {
            let room = room_arc.read().await;
            info!(room = %room.id, owner = %session_id, "room created");
            view::room_payloads(&room)
        };
        self.sessions.dispatch(payloads).await;
        self.broadcast_room_list().await;
    }

    async fn on_join_room(&self, session_id: &SessionId, room_id: &str, password: Option<&str>) {
        let Some(profile) = self.sessions.profile(session_id).await else {
            self.send_error(session_id, ErrorCode::NotAuthorized).await;
            return;
        };

        // Re-joining the current room is an idempotent snapshot resend.
        if let Some(current) = self.store.room_of(session_id).await {
            if current.read().await.id == room_id {
                let payloads = {
                    let room = current.read().await;
                    view::room_payloads(&room)
                };
                self.sessions.dispatch(payloads).await;
                return;
            }
        }

        self.leave_current_room(session_id, false).await;

        let player = Player::new(session_id.clone(), profile.name, profile.avatar);
        match self.store.join_room(room_id, password, player).await {
            Ok(room_arc) => {
                let payloads = {
                    let room = room_arc.read().await;
                    view::room_payloads(&room)
                };
                self.sessions.dispatch(payloads).await;
                self.broadcast_room_list().await;
            }
            Err(err) => {
                self.send_error(session_id, err.into()).await;
            }
        }
    }

    async fn on_leave_room(&self, session_id: &SessionId) {
        self.leave_current_room(session_id, true).await;
    }

    async fn on_set_ready(&self, session_id: &SessionId, ready: bool) {
        let Some(room_arc) = self.room_of_member(session_id).await else {
            self.send_error(session_id, ErrorCode::RoomNotFound).await;
            return;
        };
        let payloads = {
            let mut room = room_arc.write().await;
            match room.player_mut(session_id) {
                Some(player) => player.ready = ready,
                None => return,
            }
            view::room_payloads(&room)
        };
        self.sessions.dispatch(payloads).await;
    }

    // =========================================================================
    // GAME HANDLERS
    // =========================================================================

    async fn on_start_game(&self, session_id: &SessionId, language: Option<&str>) {
        let Some(room_arc) = self.room_of_member(session_id).await else {
            self.send_error(session_id, ErrorCode::RoomNotFound).await;
            return;
        };

        let payloads = {
            let mut room = room_arc.write().await;
            if room.owner_id != *session_id {
                drop(room);
                self.send_error(session_id, ErrorCode::YouAreNotTheHost).await;
                return;
            }
            if room.status != RoomStatus::Lobby {
                drop(room);
                self.send_error(session_id, ErrorCode::GameAlreadyStarted).await;
                return;
            }
            if room.players.len() < self.game_config.min_players {
                drop(room);
                self.send_error(session_id, ErrorCode::NeedAtLeastNPlayers)
                    .await;
                return;
            }

            let mut rng = ThreadRandom;
            if !self.launch_game(&mut room, language, &mut rng) {
                return;
            }

            let handle = scheduler::spawn_room_ticker(
                room_arc.clone(),
                self.game_config.clone(),
                self.sessions.clone(),
                self.stats.clone(),
            );
            room.ticker = Some(handle);
            view::room_payloads(&room)
        };

        self.sessions.dispatch(payloads).await;
        self.broadcast_room_list().await;
    }

    /// Set up a fresh game on a validated room: words, imposter, turn
    /// order, roles, and the opening phase. Returns false when the word
    /// catalog cannot serve the request.
    fn launch_game(
        &self,
        room: &mut Room,
        language: Option<&str>,
        rng: &mut dyn RandomSource,
    ) -> bool {
        let language = language.unwrap_or(words::DEFAULT_LANGUAGE);
        let category = words::resolve_category(language, room.category.as_deref(), rng);
        let Some(word_list) = words::words_for(language, category) else {
            // resolve_category only returns names from the catalog.
            error!(room = %room.id, category, "word catalog lookup failed");
            return false;
        };
        let pair = engine::select_words(room.mode, word_list, rng);

        let imposter_idx = ((rng.next_unit() * room.players.len() as f64) as usize)
            .min(room.players.len() - 1);
        let imposter_id = room.players[imposter_idx].session_id.clone();

        for player in &mut room.players {
            player.eliminated = false;
            player.has_voted = false;
            player.role = Some(if player.session_id == imposter_id {
                Role::Imposter
            } else {
                Role::Citizen
            });
        }

        let ids: Vec<SessionId> = room.players.iter().map(|p| p.session_id.clone()).collect();
        let turn_order = engine::select_turn_order(
            &ids,
            &imposter_id,
            self.game_config.imposter_first_speaker_weight,
            rng,
        );

        let game = GameState::new(
            category.to_string(),
            pair.citizen,
            pair.imposter,
            imposter_id,
            turn_order,
        );
        info!(room = %room.id, game = %game.game_id, category, "game starting");

        room.game = Some(game);
        scheduler::transition_to(room, Phase::RoleReveal, &self.game_config);
        room.status = RoomStatus::Playing;
        room.started_at = Some(Instant::now());
        true
    }

    async fn on_submit_hint(&self, session_id: &SessionId, text: &str) {
        let Some(room_arc) = self.room_of_member(session_id).await else {
            self.send_error(session_id, ErrorCode::RoomNotFound).await;
            return;
        };

        let payloads = {
            let mut room = room_arc.write().await;
            let Some(game) = room.game.as_ref() else {
                drop(room);
                self.send_error(session_id, ErrorCode::GameNotStarted).await;
                return;
            };
            if game.phase != Phase::HintRound {
                drop(room);
                self.send_error(session_id, ErrorCode::WrongPhase).await;
                return;
            }
            if game.current_speaker() != Some(session_id) {
                drop(room);
                self.send_error(session_id, ErrorCode::NotYourTurn).await;
                return;
            }
            if engine::hint_matches_secret(text, &game.citizen_word) {
                drop(room);
                self.send_error(session_id, ErrorCode::CannotUseTheSecretWordAsHint)
                    .await;
                return;
            }

            let hint = engine::normalize_hint(text);
            if let Some(game) = room.game.as_mut() {
                game.hints.entry(session_id.clone()).or_default().push(hint);
            }
            scheduler::advance_turn(&mut room, &self.game_config);
            view::room_payloads(&room)
        };
        self.sessions.dispatch(payloads).await;
    }

    async fn on_submit_vote(&self, session_id: &SessionId, target: &SessionId) {
        let Some(room_arc) = self.room_of_member(session_id).await else {
            self.send_error(session_id, ErrorCode::RoomNotFound).await;
            return;
        };

        let payloads = {
            let mut room = room_arc.write().await;

            // Eliminated players are out of the electorate entirely.
            let voter_eliminated = room
                .player(session_id)
                .map(|p| p.eliminated)
                .unwrap_or(true);
            if voter_eliminated {
                drop(room);
                self.send_error(session_id, ErrorCode::NotAuthorized).await;
                return;
            }

            if let Err(err) =
                engine::validate_vote(room.game.as_ref(), &room.players, session_id, target)
            {
                drop(room);
                self.send_error(session_id, err.into()).await;
                return;
            }

            if let Some(game) = room.game.as_mut() {
                game.votes = engine::apply_vote(&game.votes, session_id, target);
            }
            if let Some(player) = room.player_mut(session_id) {
                player.has_voted = true;
            }

            // Last ballot in resolves the vote early. The VoteResult
            // pause still runs its course on the ticker, so any win is
            // decided there.
            let all_in = room
                .game
                .as_ref()
                .map(|g| engine::all_active_voted(&room.players, &g.votes))
                .unwrap_or(false);
            if all_in {
                scheduler::resolve_voting(&mut room, &self.game_config);
            }
            view::room_payloads(&room)
        };

        self.sessions.dispatch(payloads).await;
    }

    async fn on_play_again(&self, session_id: &SessionId) {
        let Some(room_arc) = self.room_of_member(session_id).await else {
            self.send_error(session_id, ErrorCode::RoomNotFound).await;
            return;
        };

        let payloads = {
            let mut room = room_arc.write().await;
            if room.owner_id != *session_id {
                drop(room);
                self.send_error(session_id, ErrorCode::YouAreNotTheHost).await;
                return;
            }
            if room.status != RoomStatus::Ended {
                drop(room);
                self.send_error(session_id, ErrorCode::WrongPhase).await;
                return;
            }
            room.reset_to_lobby();
            info!(room = %room.id, "room reset for another game");
            view::room_payloads(&room)
        };

        self.sessions.dispatch(payloads).await;
        self.broadcast_room_list().await;
    }

    async fn on_send_message(&self, session_id: &SessionId, text: &str) {
        let Some(room_arc) = self.room_of_member(session_id).await else {
            self.send_error(session_id, ErrorCode::RoomNotFound).await;
            return;
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let text: String = trimmed.chars().take(CHAT_MAX_LEN).collect();

        let (recipients, message) = {
            let room = room_arc.read().await;
            let Some(sender) = room.player(session_id) else {
                return;
            };
            let message = ChatMessage {
                sender_id: session_id.clone(),
                sender_name: sender.name.clone(),
                text,
            };
            let recipients: Vec<SessionId> =
                room.players.iter().map(|p| p.session_id.clone()).collect();
            (recipients, message)
        };

        for recipient in recipients {
            self.sessions
                .send(&recipient, ServerEvent::RoomMessage(message.clone()))
                .await;
        }
    }

    // =========================================================================
    // DEPARTURE
    // =========================================================================

    /// Remove a session from its room (if any), applying the full
    /// departure sequence: scrub, forced end, ownership transfer, room
    /// deletion, rebroadcast.
    async fn leave_current_room(&self, session_id: &SessionId, notify_leaver: bool) {
        let Some(room_arc) = self.store.room_of(session_id).await else {
            return;
        };
        self.store.unbind_session(session_id).await;

        let mut deleted_room_id = None;
        let mut summary = None;
        let payloads = {
            let mut room = room_arc.write().await;
            if room.remove_player(session_id).is_none() {
                // Index said the session was here but the room disagrees:
                // the room's state is no longer trustworthy.
                self.quarantine_room(&mut room).await;
                return;
            }

            if room.is_empty() {
                room.cancel_ticker();
                deleted_room_id = Some(room.id.clone());
                Vec::new()
            } else {
                if room.status == RoomStatus::Playing {
                    let imposter_left = room.scrub_departed(session_id);
                    if imposter_left {
                        summary = scheduler::force_game_end(&mut room, Winner::Citizens);
                    }
                    if room.status == RoomStatus::Playing
                        && room.players.len() < self.game_config.min_players
                    {
                        warn!(room = %room.id, "below minimum players, resetting to lobby");
                        room.reset_to_lobby();
                    }
                }
                view::room_payloads(&room)
            }
        };

        if let Some(room_id) = deleted_room_id {
            self.store.remove_room(&room_id).await;
            info!(room = %room_id, "room deleted, last player left");
        } else {
            self.sessions.dispatch(payloads).await;
        }

        if notify_leaver {
            self.sessions
                .send(session_id, ServerEvent::RoomUpdate(None))
                .await;
        }
        if let Some(summary) = summary {
            self.stats.record_game_end(summary).await;
        }
        self.broadcast_room_list().await;
    }

    /// Fatal-to-the-room invariant handling: clear state, tell the
    /// members, keep the process alive.
    async fn quarantine_room(&self, room: &mut Room) {
        error!(room = %room.id, "room invariant violated, clearing state");
        room.reset_to_lobby();
        for player in &room.players {
            self.sessions
                .send(
                    &player.session_id,
                    ServerEvent::RoomUpdate(Some(view::room_view(room))),
                )
                .await;
        }
    }

    /// The caller's room, verifying the membership invariant both ways.
    async fn room_of_member(&self, session_id: &SessionId) -> Option<Arc<tokio::sync::RwLock<Room>>> {
        let room_arc = self.store.room_of(session_id).await?;
        let is_member = room_arc.read().await.contains(session_id);
        if !is_member {
            let mut room = room_arc.write().await;
            self.quarantine_room(&mut room).await;
            self.store.unbind_session(session_id).await;
            return None;
        }
        Some(room_arc)
    }

    // =========================================================================
    // FRIEND OPS
    // =========================================================================

    async fn on_friend_event(
        &self,
        session_id: &SessionId,
        user_id: Option<UserId>,
        event: ClientEvent,
    ) {
        let Some(user_id) = user_id else {
            self.send_friend_error(
                session_id,
                FriendError::code(crate::friends::FriendErrorCode::NotAuthorized),
            )
            .await;
            return;
        };

        let result = match event {
            ClientEvent::SendFriendRequest { user_id: target } => {
                let outcome = self.friends.send_request(&user_id, &target).await;
                if outcome.is_ok() {
                    self.refresh_pending_requests(&target).await;
                }
                outcome
            }
            ClientEvent::AcceptFriendRequest { request_id } => {
                match self.friends.accept_request(&user_id, &request_id).await {
                    Ok(new_friend) => {
                        self.refresh_pending_requests(&user_id).await;
                        if self.presence.is_online(&new_friend).await {
                            self.send_to_user(
                                &user_id,
                                ServerEvent::FriendOnline {
                                    user_id: new_friend.clone(),
                                },
                            )
                            .await;
                        }
                        if self.presence.is_online(&user_id).await {
                            self.send_to_user(
                                &new_friend,
                                ServerEvent::FriendOnline {
                                    user_id: user_id.clone(),
                                },
                            )
                            .await;
                        }
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            ClientEvent::DeclineFriendRequest { request_id } => {
                let outcome = self.friends.decline_request(&user_id, &request_id).await;
                if outcome.is_ok() {
                    self.refresh_pending_requests(&user_id).await;
                }
                outcome
            }
            ClientEvent::CancelFriendRequest { request_id } => {
                self.friends.cancel_request(&user_id, &request_id).await
            }
            ClientEvent::RemoveFriend { user_id: friend } => {
                self.friends.remove_friend(&user_id, &friend).await
            }
            ClientEvent::SendRoomInvite { user_id: target } => {
                let room_id = match self.store.room_of(session_id).await {
                    Some(room_arc) => room_arc.read().await.id.clone(),
                    None => {
                        self.send_error(session_id, ErrorCode::RoomNotFound).await;
                        return;
                    }
                };
                let outcome = self
                    .friends
                    .send_room_invite(&user_id, &target, &room_id)
                    .await;
                if outcome.is_ok() {
                    self.refresh_pending_invites(&target).await;
                }
                outcome
            }
            ClientEvent::RespondToInvite { invite_id, accept } => {
                match self
                    .friends
                    .respond_to_invite(&user_id, &invite_id, accept)
                    .await
                {
                    Ok(_room_id) => {
                        // Accepting hands the room id back through the
                        // refreshed invite list; the client follows up
                        // with a normal join_room.
                        self.refresh_pending_invites(&user_id).await;
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            ClientEvent::GetPendingInvites => {
                self.refresh_pending_invites(&user_id).await;
                Ok(())
            }
            ClientEvent::GetPendingRequests => {
                self.refresh_pending_requests(&user_id).await;
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            self.send_friend_error(session_id, err).await;
        }
    }

    async fn refresh_pending_requests(&self, user_id: &UserId) {
        let requests = self.friends.pending_requests(user_id).await;
        self.send_to_user(user_id, ServerEvent::PendingRequests { requests })
            .await;
    }

    async fn refresh_pending_invites(&self, user_id: &UserId) {
        let invites = self.friends.pending_invites(user_id).await;
        self.send_to_user(user_id, ServerEvent::PendingInvites { invites })
            .await;
    }

    // =========================================================================
    // FANOUT HELPERS
    // =========================================================================

    async fn send_error(&self, session_id: &SessionId, code: ErrorCode) {
        self.sessions
            .send(session_id, ServerEvent::Error { code })
            .await;
    }

    async fn send_friend_error(&self, session_id: &SessionId, err: FriendError) {
        self.sessions
            .send(
                session_id,
                ServerEvent::FriendError {
                    code: err.code,
                    message: err.message,
                },
            )
            .await;
    }

    /// Send an event to every session of a user.
    async fn send_to_user(&self, user_id: &UserId, event: ServerEvent) {
        for session in self.sessions.sessions_of_user(user_id).await {
            self.sessions.send(&session, event.clone()).await;
        }
    }

    /// Send an event to every session of every friend of a user.
    async fn notify_friends(&self, user_id: &UserId, event: ServerEvent) {
        for friend in self.friends.friends_of(user_id).await {
            self.send_to_user(&friend, event.clone()).await;
        }
    }

    /// Assemble the public room listing.
    async fn room_list(&self) -> Vec<view::RoomListEntry> {
        let mut entries = Vec::new();
        for room_arc in self.store.all_rooms().await {
            let room = room_arc.read().await;
            entries.push(view::room_list_entry(&room, self.game_config.max_players));
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    async fn send_room_list_to(&self, session_id: &SessionId) {
        let rooms = self.room_list().await;
        self.sessions
            .send(session_id, ServerEvent::RoomList { rooms })
            .await;
    }

    async fn broadcast_room_list(&self) {
        let rooms = self.room_list().await;
        self.sessions
            .broadcast_lobby(ServerEvent::RoomList { rooms })
            .await;
    }
}

/// Trim and cap a display name, substituting a default for empties.
fn clean_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "Anonymous".to_string()
    } else {
        trimmed.chars().take(NAME_MAX_LEN).collect()
    }
}
