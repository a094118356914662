use redis::Script;
use std::sync::LazyLock;

macro_rules! lua_script {
    ($file:literal) => {
        concat!(include_str!("../../lua/prelude.lua"), include_str!(concat!("../../lua/", $file)))
    };
}

pub const CREATE_USER_SCRIPT_BODY: &str = lua_script!("create_user.lua");
pub const UPDATE_PROFILE_SCRIPT_BODY: &str = lua_script!("update_profile.lua");
pub const RECOMPUTE_STATISTICS_SCRIPT_BODY: &str = lua_script!("recompute_statistics.lua");
pub const CREATE_ALERT_SCRIPT_BODY: &str = lua_script!("create_alert.lua");
pub const UPDATE_ALERT_SCRIPT_BODY: &str = lua_script!("update_alert.lua");
pub const DELETE_ALERT_SCRIPT_BODY: &str = lua_script!("delete_alert.lua");
pub const CLOSE_ALERT_SCRIPT_BODY: &str = lua_script!("close_alert.lua");
pub const SET_REACTION_SCRIPT_BODY: &str = lua_script!("set_reaction.lua");
pub const ADD_COMMENT_SCRIPT_BODY: &str = lua_script!("add_comment.lua");
pub const RECOMPUTE_COUNTERS_SCRIPT_BODY: &str = lua_script!("recompute_counters.lua");

pub static CREATE_USER_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(CREATE_USER_SCRIPT_BODY));
pub static UPDATE_PROFILE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(UPDATE_PROFILE_SCRIPT_BODY));
pub static RECOMPUTE_STATISTICS_SCRIPT: LazyLock<Script> =
    LazyLock::new(|| Script::new(RECOMPUTE_STATISTICS_SCRIPT_BODY));
pub static CREATE_ALERT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(CREATE_ALERT_SCRIPT_BODY));
pub static UPDATE_ALERT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(UPDATE_ALERT_SCRIPT_BODY));
pub static DELETE_ALERT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(DELETE_ALERT_SCRIPT_BODY));
pub static CLOSE_ALERT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(CLOSE_ALERT_SCRIPT_BODY));
pub static SET_REACTION_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(SET_REACTION_SCRIPT_BODY));
pub static ADD_COMMENT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(ADD_COMMENT_SCRIPT_BODY));
pub static RECOMPUTE_COUNTERS_SCRIPT: LazyLock<Script> =
    LazyLock::new(|| Script::new(RECOMPUTE_COUNTERS_SCRIPT_BODY));
