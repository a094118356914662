use std::borrow::Cow;

use chrono::{DateTime, Utc};
use log::debug;
use redis::{AsyncCommands, Script, aio::ConnectionManager};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::{ReactionOutcome, Store, sort_newest_first, username_key};
use crate::{
    engine,
    errors::ServiceError,
    id::{AlertId, UserId},
    keys::KeyContext,
    runtime::{ScriptCall, run_script, scripts},
    types::{
        Alert, AlertComment, AlertFilter, AlertPatch, AlertReaction, ProfileContact, ReactionKind, ReactionRequest,
        User, UserProfile, round_coordinate,
    },
};

/// Service segment of every key this store writes.
pub const REDIS_SERVICE: &str = "alerts";

/// Redis-backed store. Documents are JSON strings; every mutation chain is a
/// single Lua script so Redis applies it atomically.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, ServiceError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, prefix))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix, REDIS_SERVICE)
    }

    async fn call<B, R>(&self, script: &Script, now: DateTime<Utc>, body: B) -> Result<R, ServiceError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let call = ScriptCall::new(self.keys().namespace(), now, body);
        let mut conn = self.conn.clone();
        run_script(&mut conn, script, &call).await
    }

    async fn load<T: DeserializeOwned>(&self, key: String) -> Result<Option<T>, ServiceError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&key).await?;
        raw.map(|raw| decode(&key, &raw)).transpose()
    }

    async fn load_alerts(&self, ids: Vec<String>) -> Result<Vec<Alert>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys = self.keys();
        let alert_keys: Vec<String> = ids.iter().map(|id| keys.alert(id)).collect();
        let mut conn = self.conn.clone();
        let raws: Vec<Option<String>> = redis::cmd("MGET").arg(&alert_keys).query_async(&mut conn).await?;
        alert_keys
            .iter()
            .zip(raws)
            .filter_map(|(key, raw)| raw.map(|raw| decode(key, &raw)))
            .collect()
    }

    async fn ensure_alert_exists(&self, alert_id: &AlertId) -> Result<(), ServiceError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(self.keys().alert(alert_id.as_str())).await?;
        if exists {
            Ok(())
        } else {
            Err(ServiceError::not_found("alert", alert_id.as_str()))
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, ServiceError> {
    serde_json::from_str(raw).map_err(|err| ServiceError::Other {
        message: Cow::Owned(format!("corrupt document at {key}: {err}")),
    })
}

#[derive(Serialize)]
struct CreateUserBody<'a> {
    user: &'a User,
    username_key: String,
}

#[derive(Serialize)]
struct UserBody<'a> {
    user_id: &'a UserId,
}

#[derive(Serialize)]
struct UpdateProfileBody<'a> {
    user_id: &'a UserId,
    contact: &'a ProfileContact,
}

#[derive(Serialize)]
struct CreateAlertBody<'a> {
    alert: &'a Alert,
    score: i64,
}

#[derive(Serialize)]
struct AlertBody<'a> {
    alert_id: &'a AlertId,
}

#[derive(Serialize)]
struct OwnerActionBody<'a> {
    alert_id: &'a AlertId,
    requester: &'a UserId,
}

#[derive(Serialize)]
struct UpdateAlertBody<'a> {
    alert_id: &'a AlertId,
    requester: &'a UserId,
    patch: &'a AlertPatch,
}

#[derive(Serialize)]
struct SetReactionBody<'a> {
    alert_id: &'a AlertId,
    user_id: &'a UserId,
    request: ReactionRequest,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    comment: &'a AlertComment,
}

#[derive(Deserialize)]
struct UserCreated {
    user: User,
    profile: UserProfile,
}

#[derive(Deserialize)]
struct ProfileResponse {
    profile: UserProfile,
}

#[derive(Deserialize)]
struct AlertResponse {
    alert: Alert,
}

#[derive(Deserialize)]
struct AlertWithProfile {
    alert: Alert,
    profile: UserProfile,
}

#[derive(Deserialize)]
struct ReactionResponse {
    alert: Alert,
    #[serde(default)]
    reaction: Option<AlertReaction>,
    #[serde(default)]
    previous: Option<ReactionKind>,
    profile: UserProfile,
}

#[derive(Deserialize)]
struct CommentResponse {
    comment: AlertComment,
}

impl Store for RedisStore {
    async fn create_user(&self, user: User) -> Result<(User, UserProfile), ServiceError> {
        let body = CreateUserBody {
            username_key: username_key(&user.username),
            user: &user,
        };
        let created: UserCreated = self.call(&scripts::CREATE_USER_SCRIPT, user.created_at, body).await?;
        debug!("created user {} ({})", created.user.id, created.user.username);
        Ok((created.user, created.profile))
    }

    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, ServiceError> {
        self.load(self.keys().user(user_id.as_str())).await
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>, ServiceError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(self.keys().user_index()).await?;
        let mut ids: Vec<UserId> = members.into_iter().map(UserId::from).collect();
        ids.sort();
        Ok(ids)
    }

    async fn profile(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<UserProfile, ServiceError> {
        if let Some(profile) = self.load(self.keys().profile(user_id.as_str())).await? {
            return Ok(profile);
        }
        debug!("profile for {user_id} missing, creating it");
        self.recompute_statistics(user_id, now).await
    }

    async fn update_profile_contact(
        &self,
        user_id: &UserId,
        contact: ProfileContact,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ServiceError> {
        let body = UpdateProfileBody {
            user_id,
            contact: &contact,
        };
        let response: ProfileResponse = self.call(&scripts::UPDATE_PROFILE_SCRIPT, now, body).await?;
        Ok(response.profile)
    }

    async fn insert_alert(&self, alert: Alert) -> Result<(Alert, UserProfile), ServiceError> {
        let body = CreateAlertBody {
            alert: &alert,
            score: alert.created_at.timestamp_millis(),
        };
        let response: AlertWithProfile = self.call(&scripts::CREATE_ALERT_SCRIPT, alert.created_at, body).await?;
        Ok((response.alert, response.profile))
    }

    async fn get_alert(&self, alert_id: &AlertId) -> Result<Option<Alert>, ServiceError> {
        self.load(self.keys().alert(alert_id.as_str())).await
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, ServiceError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = match &filter.owner {
            Some(owner) => conn.smembers(self.keys().owned_alerts(owner.as_str())).await?,
            None => conn.zrevrange(self.keys().alert_timeline(), 0, -1).await?,
        };
        let mut alerts: Vec<Alert> = self
            .load_alerts(ids)
            .await?
            .into_iter()
            .filter(|alert| filter.matches(alert))
            .collect();
        sort_newest_first(&mut alerts);
        Ok(alerts)
    }

    async fn update_alert(
        &self,
        alert_id: &AlertId,
        requester: &UserId,
        mut patch: AlertPatch,
        now: DateTime<Utc>,
    ) -> Result<Alert, ServiceError> {
        patch.latitude = patch.latitude.map(round_coordinate);
        patch.longitude = patch.longitude.map(round_coordinate);
        let body = UpdateAlertBody {
            alert_id,
            requester,
            patch: &patch,
        };
        let response: AlertResponse = self.call(&scripts::UPDATE_ALERT_SCRIPT, now, body).await?;
        Ok(response.alert)
    }

    async fn delete_alert(
        &self,
        alert_id: &AlertId,
        requester: &UserId,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ServiceError> {
        let body = OwnerActionBody { alert_id, requester };
        let response: ProfileResponse = self.call(&scripts::DELETE_ALERT_SCRIPT, now, body).await?;
        Ok(response.profile)
    }

    async fn close_alert(
        &self,
        alert_id: &AlertId,
        requester: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(Alert, UserProfile), ServiceError> {
        let body = OwnerActionBody { alert_id, requester };
        let response: AlertWithProfile = self.call(&scripts::CLOSE_ALERT_SCRIPT, now, body).await?;
        Ok((response.alert, response.profile))
    }

    async fn set_reaction(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
        request: ReactionRequest,
        now: DateTime<Utc>,
    ) -> Result<ReactionOutcome, ServiceError> {
        let body = SetReactionBody {
            alert_id,
            user_id,
            request,
        };
        let response: ReactionResponse = self.call(&scripts::SET_REACTION_SCRIPT, now, body).await?;
        Ok(ReactionOutcome {
            transition: engine::plan_reaction(response.previous, request),
            alert: response.alert,
            reaction: response.reaction,
            owner_profile: response.profile,
        })
    }

    async fn reaction_of(&self, alert_id: &AlertId, user_id: &UserId) -> Result<Option<ReactionKind>, ServiceError> {
        let key = self.keys().reactions(alert_id.as_str());
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.hget(&key, user_id.as_str()).await?;
        let row: Option<AlertReaction> = raw.map(|raw| decode(&key, &raw)).transpose()?;
        Ok(row.map(|row| row.reaction_type))
    }

    async fn reaction_count(&self, alert_id: &AlertId) -> Result<usize, ServiceError> {
        let mut conn = self.conn.clone();
        Ok(conn.hlen(self.keys().reactions(alert_id.as_str())).await?)
    }

    async fn insert_comment(&self, comment: AlertComment) -> Result<AlertComment, ServiceError> {
        let body = CommentBody { comment: &comment };
        let response: CommentResponse = self.call(&scripts::ADD_COMMENT_SCRIPT, comment.created_at, body).await?;
        Ok(response.comment)
    }

    async fn comments(&self, alert_id: &AlertId) -> Result<Vec<AlertComment>, ServiceError> {
        self.ensure_alert_exists(alert_id).await?;
        let key = self.keys().comments(alert_id.as_str());
        let mut conn = self.conn.clone();
        let raws: Vec<String> = conn.lrange(&key, 0, -1).await?;
        raws.iter().map(|raw| decode(&key, raw)).collect()
    }

    async fn recompute_counters(&self, alert_id: &AlertId) -> Result<Alert, ServiceError> {
        let response: AlertResponse = self
            .call(&scripts::RECOMPUTE_COUNTERS_SCRIPT, Utc::now(), AlertBody { alert_id })
            .await?;
        Ok(response.alert)
    }

    async fn recompute_statistics(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<UserProfile, ServiceError> {
        let response: ProfileResponse = self
            .call(&scripts::RECOMPUTE_STATISTICS_SCRIPT, now, UserBody { user_id })
            .await?;
        Ok(response.profile)
    }
}
