/// Redis key construction for every record the service persists.
///
/// All keys live under `prefix:service:`; the Lua scripts rebuild the same
/// layout from the namespace string, so the two must change together.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
    pub service: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str, service: &'a str) -> Self {
        Self { prefix, service }
    }

    pub fn namespace(&self) -> String {
        format!("{}:{}", self.prefix, self.service)
    }

    pub fn entity(&self, collection: &str, entity_id: &str) -> String {
        format!("{}:{}:{}:{}", self.prefix, self.service, collection, entity_id)
    }

    pub fn user(&self, user_id: &str) -> String {
        self.entity("users", user_id)
    }

    /// Unique index entry mapping a normalized username to its user id.
    pub fn username_index(&self, username_key: &str) -> String {
        format!(
            "{}:{}:users:unique:username:{}",
            self.prefix, self.service, username_key
        )
    }

    pub fn profile(&self, user_id: &str) -> String {
        self.entity("profiles", user_id)
    }

    pub fn alert(&self, alert_id: &str) -> String {
        self.entity("alerts", alert_id)
    }

    /// Reaction ledger for one alert: a hash keyed by user id.
    pub fn reactions(&self, alert_id: &str) -> String {
        self.entity("reactions", alert_id)
    }

    /// Comment list for one alert, newest first.
    pub fn comments(&self, alert_id: &str) -> String {
        self.entity("comments", alert_id)
    }

    pub fn relation(&self, alias: &str, left_id: &str) -> String {
        format!("{}:{}:rel:{}:{}", self.prefix, self.service, alias, left_id)
    }

    /// Set of alert ids owned by a user.
    pub fn owned_alerts(&self, user_id: &str) -> String {
        self.relation("owned_alerts", user_id)
    }

    /// Sorted set of every alert id scored by creation time in milliseconds.
    pub fn alert_timeline(&self) -> String {
        format!("{}:{}:idx:alerts", self.prefix, self.service)
    }

    /// Set of every registered user id.
    pub fn user_index(&self) -> String {
        format!("{}:{}:idx:users", self.prefix, self.service)
    }
}
