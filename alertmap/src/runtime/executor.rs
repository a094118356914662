use std::borrow::Cow;

use chrono::{DateTime, Utc};
use redis::{Script, aio::ConnectionLike};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    engine::{REPUTATION_WEIGHTS, ReputationWeights},
    errors::ServiceError,
};

/// JSON argument handed to every script. The shared fields feed the prelude;
/// `body` carries the script-specific inputs.
#[derive(Debug, Serialize)]
pub struct ScriptCall<B: Serialize> {
    pub namespace: String,
    pub weights: ReputationWeights,
    pub now: DateTime<Utc>,
    #[serde(flatten)]
    pub body: B,
}

impl<B: Serialize> ScriptCall<B> {
    pub fn new(namespace: String, now: DateTime<Utc>, body: B) -> Self {
        Self {
            namespace,
            weights: REPUTATION_WEIGHTS,
            now,
            body,
        }
    }
}

pub async fn run_script<C, B, R>(conn: &mut C, script: &Script, call: &ScriptCall<B>) -> Result<R, ServiceError>
where
    C: ConnectionLike + Send,
    B: Serialize,
    R: DeserializeOwned,
{
    let payload = serde_json::to_string(call).map_err(|err| ServiceError::Other {
        message: Cow::Owned(format!("failed to serialize script call: {err}")),
    })?;

    let mut invocation = script.prepare_invoke();
    invocation.arg(payload);
    let raw: String = invocation.invoke_async(conn).await?;

    let value: Value = serde_json::from_str(&raw).map_err(|err| ServiceError::Other {
        message: Cow::Owned(format!("failed to parse lua response: {err}")),
    })?;

    if let Some(error) = value.get("error") {
        return Err(error_from_response(error, &value));
    }

    serde_json::from_value(value).map_err(|err| ServiceError::Other {
        message: Cow::Owned(format!("unexpected lua response shape: {err}")),
    })
}

fn error_from_response(error: &Value, value: &Value) -> ServiceError {
    let message = || {
        value
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    match error.as_str() {
        Some("not_found") => {
            let entity = match value.get("entity").and_then(|v| v.as_str()) {
                Some("user") => "user",
                Some("alert") => "alert",
                Some("profile") => "profile",
                _ => "entity",
            };
            let entity_id = value.get("entity_id").and_then(|v| v.as_str()).map(|s| s.to_string());
            ServiceError::NotFound { entity, entity_id }
        }
        Some("permission_denied") => ServiceError::permission_denied(message()),
        Some("invalid_state") => ServiceError::invalid_state(message()),
        Some("conflict") => ServiceError::conflict(message()),
        Some(other) => ServiceError::Other {
            message: Cow::Owned(other.to_string()),
        },
        None => ServiceError::Other {
            message: Cow::Borrowed("lua_error"),
        },
    }
}
