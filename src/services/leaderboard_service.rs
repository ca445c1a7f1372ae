//! Score and leaderboard operations over the shared key-value store.
//!
//! Every method is a short sequence of single-key commands. Nothing is locked
//! between them: two saves racing on the same post can make the leader
//! comparison in [`LeaderboardService::save_score`] see a stale leader, which
//! at worst duplicates or skips a highscore notice. The stored ranking itself
//! stays exact because each save only writes the caller's own member.

use std::sync::Arc;

use async_stream::try_stream;
use futures::Stream;
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    config::{HighscoreTrigger, LeaderboardSettings},
    dao::{
        keys,
        kv_store::KeyValueStore,
        models::{AppSettingsEntity, PlayerRecord, RankedMember},
        storage::StorageError,
    },
    dto::leaderboard::{
        ANONYMOUS_PLAYER, CommunityAggregate, LeaderboardEntry, PLACEHOLDER_TOP_PLAYER,
        PlayerStats,
    },
    error::ServiceError,
    platform::{
        identity::IdentityResolver,
        notification::{HighscoreNotice, NotificationQueue},
    },
    services::caller::CallerContext,
};

/// Leaderboard service bound to its store, identity provider and notification queue.
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn KeyValueStore>,
    identity: Arc<dyn IdentityResolver>,
    notifications: NotificationQueue,
    clock: Arc<dyn Clock>,
    settings: LeaderboardSettings,
    default_app_settings: Option<AppSettingsEntity>,
}

impl LeaderboardService {
    /// Build a service using the system clock.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        identity: Arc<dyn IdentityResolver>,
        notifications: NotificationQueue,
        settings: LeaderboardSettings,
    ) -> Self {
        Self {
            store,
            identity,
            notifications,
            clock: Arc::new(SystemClock),
            settings,
            default_app_settings: None,
        }
    }

    /// Replace the clock used for presence timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Settings served by [`Self::app_settings`] when none are stored.
    pub fn with_default_app_settings(mut self, settings: AppSettingsEntity) -> Self {
        self.default_app_settings = Some(settings);
        self
    }

    /// Raw stats of the caller; `None` without a caller identity.
    pub async fn player_record(
        &self,
        ctx: &CallerContext,
    ) -> Result<Option<PlayerRecord>, ServiceError> {
        let Some(user_id) = ctx.user_id.as_deref() else {
            return Ok(None);
        };
        let Some(post_id) = ctx.post_id.as_deref() else {
            return Ok(Some(PlayerRecord::default()));
        };
        Ok(Some(self.read_record(post_id, user_id).await?))
    }

    /// Stats of the caller; zero-valued when they never played, `None` without an identity.
    pub async fn player_stats(&self, ctx: &CallerContext) -> Result<Option<PlayerStats>, ServiceError> {
        Ok(self.player_record(ctx).await?.map(PlayerStats::from))
    }

    /// Stats of an arbitrary player of the caller's post; `None` for an empty id.
    pub async fn player_stats_by_user_id(
        &self,
        ctx: &CallerContext,
        user_id: &str,
    ) -> Result<Option<PlayerStats>, ServiceError> {
        if user_id.is_empty() {
            return Ok(None);
        }
        let Some(post_id) = ctx.post_id.as_deref() else {
            return Ok(Some(PlayerStats::default()));
        };
        Ok(Some(self.read_record(post_id, user_id).await?.into()))
    }

    /// Record a finished run.
    ///
    /// Overwrites the caller's leaderboard score with `new_highscore` (callers
    /// wanting max semantics compare first), adds `score_delta` to the
    /// community score and bumps every attempts counter by one. The returned
    /// aggregate names the leader as it was *before* this save.
    ///
    /// Once the writes are done the call succeeds: identity failures after
    /// that point only degrade the leader name and the highscore notice.
    pub async fn save_score(
        &self,
        ctx: &CallerContext,
        new_highscore: u64,
        score_delta: u64,
    ) -> Result<CommunityAggregate, ServiceError> {
        let Some(user_id) = ctx.user_id.as_deref() else {
            return Ok(CommunityAggregate::placeholder());
        };
        let delta = i64::try_from(score_delta)
            .map_err(|_| ServiceError::InvalidInput(format!("score {score_delta} is too large")))?;
        let post_id = ctx.post_id.as_deref();
        let community_id = ctx.community_id.as_str();

        let previous_top = match post_id {
            Some(post_id) => self.leader(post_id).await?,
            None => None,
        };

        if let Some(post_id) = post_id {
            self.store
                .z_add(
                    keys::post_highscores(post_id),
                    user_id.to_owned(),
                    new_highscore as f64,
                )
                .await?;
        }
        let community_score = self
            .store
            .h_incr_by(
                keys::community_score(community_id),
                community_id.to_owned(),
                delta,
            )
            .await?;
        let community_attempts = self
            .store
            .h_incr_by(
                keys::community_attempts(community_id),
                community_id.to_owned(),
                1,
            )
            .await?;
        if let Some(post_id) = post_id {
            self.store
                .h_incr_by(keys::post_attempts(post_id), user_id.to_owned(), 1)
                .await?;
        }

        let new_top = match post_id {
            Some(post_id) => self.leader(post_id).await?,
            None => None,
        };

        let aggregate = CommunityAggregate {
            community_score,
            community_attempts: u64::try_from(community_attempts).unwrap_or_default(),
            top_player: self.leader_name(previous_top.as_ref()).await,
        };

        let (Some(post_id), Some(new_top)) = (post_id, new_top) else {
            debug!(user_id, "score saved without post context; skipping highscore check");
            return Ok(aggregate);
        };

        if self.is_new_highscore(previous_top.as_ref(), &new_top, score_delta) {
            match self.identity.username(new_top.member.clone()).await {
                Ok(Some(user_name)) => {
                    info!(user = %user_name, post_id, score = new_top.score, "new highscore");
                    self.notifications.enqueue(HighscoreNotice {
                        user_name,
                        post_id: post_id.to_owned(),
                        score: new_top.score,
                    });
                }
                Ok(None) => {
                    warn!(user_id = %new_top.member, post_id, "new leader has no username; skipping notice");
                }
                Err(err) => {
                    warn!(error = %err, user_id = %new_top.member, post_id, "new leader lookup failed; skipping notice");
                }
            }
        }

        Ok(aggregate)
    }

    /// Lazily stream the best `limit` players of the caller's post, best first.
    ///
    /// Ranks are read once up front; names (and attempts when requested) are
    /// resolved as the stream is polled. A failed name lookup lists the player
    /// as anonymous instead of ending the stream.
    pub fn top_players(
        &self,
        ctx: &CallerContext,
        limit: usize,
        with_attempts: bool,
    ) -> impl Stream<Item = Result<LeaderboardEntry, ServiceError>> + Send + 'static {
        let service = self.clone();
        let post_id = ctx.post_id.clone();

        try_stream! {
            if let (Some(post_id), Some(stop)) = (post_id, limit.checked_sub(1)) {
                let ranked = service
                    .store
                    .z_range_rev(keys::post_highscores(&post_id), 0, stop)
                    .await?;

                for RankedMember { member, score } in ranked {
                    let user_name = match service.identity.username(member.clone()).await {
                        Ok(Some(user_name)) => user_name,
                        Ok(None) => ANONYMOUS_PLAYER.to_owned(),
                        Err(err) => {
                            warn!(error = %err, user_id = %member, "username lookup failed; listing as anonymous");
                            ANONYMOUS_PLAYER.to_owned()
                        }
                    };
                    let attempts = if with_attempts {
                        Some(service.read_attempts(&post_id, &member).await?.unwrap_or_default())
                    } else {
                        None
                    };

                    yield LeaderboardEntry {
                        user_id: member,
                        user_name,
                        score,
                        attempts,
                    };
                }
            }
        }
    }

    /// Read the community counters and the post's current leader.
    pub async fn community_stats(
        &self,
        ctx: &CallerContext,
    ) -> Result<CommunityAggregate, ServiceError> {
        let community_id = ctx.community_id.as_str();
        let community_score = self
            .read_counter(keys::community_score(community_id), community_id)
            .await?;
        let community_attempts = self
            .read_counter(keys::community_attempts(community_id), community_id)
            .await?;
        let leader = match ctx.post_id.as_deref() {
            Some(post_id) => self.leader(post_id).await?,
            None => None,
        };

        Ok(CommunityAggregate {
            community_score,
            community_attempts: u64::try_from(community_attempts).unwrap_or_default(),
            top_player: self.leader_name(leader.as_ref()).await,
        })
    }

    /// Mark the caller as online, prune stale presence entries and count the rest.
    pub async fn community_online_players(&self, ctx: &CallerContext) -> Result<u64, ServiceError> {
        let key = self.settings.presence_key.clone();
        let now = self.clock.now_millis();
        let ttl = u64::try_from(self.settings.presence_ttl.as_millis()).unwrap_or(u64::MAX);

        if let Some(user_id) = ctx.user_id.clone() {
            self.store
                .h_set(key.clone(), user_id, now.to_string())
                .await?;
        }

        let (fresh, stale): (Vec<_>, Vec<_>) = self
            .store
            .h_get_all(key.clone())
            .await?
            .into_iter()
            .partition(|(_, seen)| {
                seen.parse::<u64>()
                    .is_ok_and(|seen| now.saturating_sub(seen) < ttl)
            });

        if !stale.is_empty() {
            let fields = stale.into_iter().map(|(user_id, _)| user_id).collect::<Vec<_>>();
            let removed = self.store.h_del(key, fields).await?;
            debug!(removed, "pruned stale presence entries");
        }

        Ok(fresh.len() as u64)
    }

    /// Installation settings, falling back to the configured defaults.
    pub async fn app_settings(&self) -> Result<AppSettingsEntity, ServiceError> {
        let stored = self.store.get(keys::APP_SETTINGS_KEY.to_owned()).await?;
        let parsed = stored.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(settings) => Some(settings),
            Err(err) => {
                warn!(error = %err, "stored app settings are unreadable; using defaults");
                None
            }
        });

        parsed
            .or_else(|| self.default_app_settings.clone())
            .ok_or_else(|| ServiceError::NotFound("no app settings configured".into()))
    }

    /// Persist new installation settings.
    pub async fn update_app_settings(&self, settings: &AppSettingsEntity) -> Result<(), ServiceError> {
        let raw = serde_json::to_string(settings)
            .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
        self.store.set(keys::APP_SETTINGS_KEY.to_owned(), raw).await?;
        Ok(())
    }

    fn is_new_highscore(
        &self,
        previous_top: Option<&RankedMember>,
        new_top: &RankedMember,
        score_delta: u64,
    ) -> bool {
        let Some(previous_top) = previous_top else {
            return true;
        };
        match self.settings.trigger {
            HighscoreTrigger::LeaderChange => previous_top.member != new_top.member,
            HighscoreTrigger::ScoreBeatsLeader => score_delta as f64 > previous_top.score,
        }
    }

    async fn leader(&self, post_id: &str) -> Result<Option<RankedMember>, ServiceError> {
        let mut top = self
            .store
            .z_range_rev(keys::post_highscores(post_id), 0, 0)
            .await?;
        Ok(top.pop())
    }

    /// Display name of `leader`, or the placeholder when there is none or it cannot be resolved.
    async fn leader_name(&self, leader: Option<&RankedMember>) -> String {
        let Some(leader) = leader else {
            return PLACEHOLDER_TOP_PLAYER.to_owned();
        };
        match self.identity.username(leader.member.clone()).await {
            Ok(Some(name)) => name,
            Ok(None) => PLACEHOLDER_TOP_PLAYER.to_owned(),
            Err(err) => {
                warn!(error = %err, user_id = %leader.member, "leader lookup failed; using placeholder");
                PLACEHOLDER_TOP_PLAYER.to_owned()
            }
        }
    }

    async fn read_record(&self, post_id: &str, user_id: &str) -> Result<PlayerRecord, ServiceError> {
        let attempts = self.read_attempts(post_id, user_id).await?;
        let highscore = self
            .store
            .z_score(keys::post_highscores(post_id), user_id.to_owned())
            .await?;
        Ok(PlayerRecord {
            highscore,
            attempts,
        })
    }

    async fn read_attempts(&self, post_id: &str, user_id: &str) -> Result<Option<u64>, ServiceError> {
        let key = keys::post_attempts(post_id);
        let raw = self.store.h_get(key.clone(), user_id.to_owned()).await?;
        raw.map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| StorageError::corrupt(format!("{key}/{user_id}"), raw).into())
        })
        .transpose()
    }

    async fn read_counter(&self, key: String, field: &str) -> Result<i64, ServiceError> {
        let raw = self.store.h_get(key.clone(), field.to_owned()).await?;
        match raw {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| StorageError::corrupt(format!("{key}/{field}"), raw).into()),
            None => Ok(0),
        }
    }
}
