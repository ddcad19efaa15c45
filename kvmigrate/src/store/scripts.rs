use redis::Script;
use std::sync::LazyLock;

pub const COMMIT_VERSION_SCRIPT_BODY: &str = include_str!("../../lua/commit_version.lua");

pub static COMMIT_VERSION_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(COMMIT_VERSION_SCRIPT_BODY));
