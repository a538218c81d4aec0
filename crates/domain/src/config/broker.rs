use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Broker (durable work queues)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "d_uri")]
    pub uri: String,
    #[serde(default = "d_reconnect_attempts")]
    pub reconnect_attempts: u32,
    #[serde(default = "d_reconnect_initial_delay_ms")]
    pub reconnect_initial_delay_ms: u64,
    #[serde(default = "d_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    #[serde(default = "d_prefetch")]
    pub prefetch: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            uri: d_uri(),
            reconnect_attempts: d_reconnect_attempts(),
            reconnect_initial_delay_ms: d_reconnect_initial_delay_ms(),
            reconnect_max_delay_ms: d_reconnect_max_delay_ms(),
            prefetch: d_prefetch(),
        }
    }
}

fn d_uri() -> String {
    "amqp://127.0.0.1:5672/%2f".into()
}
fn d_reconnect_attempts() -> u32 {
    0 // 0 = unbounded, matching the worker's "a loop reconnects and resumes" behavior
}
fn d_reconnect_initial_delay_ms() -> u64 {
    500
}
fn d_reconnect_max_delay_ms() -> u64 {
    30_000
}
fn d_prefetch() -> u16 {
    1
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Worker runtime (C8)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default = "d_task_wall_time_cap_seconds")]
    pub task_wall_time_cap_seconds: u64,
    #[serde(default = "d_reply_basic_auth_user")]
    pub reply_basic_auth_user: String,
    #[serde(default = "d_reply_basic_auth_pass")]
    pub reply_basic_auth_pass: String,
    #[serde(default = "d_reply_max_attempts")]
    pub reply_max_attempts: u32,
    #[serde(default = "d_reply_initial_delay_ms")]
    pub reply_initial_delay_ms: u64,
    #[serde(default = "d_reply_max_delay_ms")]
    pub reply_max_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            task_wall_time_cap_seconds: d_task_wall_time_cap_seconds(),
            reply_basic_auth_user: d_reply_basic_auth_user(),
            reply_basic_auth_pass: d_reply_basic_auth_pass(),
            reply_max_attempts: d_reply_max_attempts(),
            reply_initial_delay_ms: d_reply_initial_delay_ms(),
            reply_max_delay_ms: d_reply_max_delay_ms(),
        }
    }
}

fn d_task_wall_time_cap_seconds() -> u64 {
    3 * 60 * 60
}
fn d_reply_basic_auth_user() -> String {
    "worker".into()
}
fn d_reply_basic_auth_pass() -> String {
    String::new()
}
fn d_reply_max_attempts() -> u32 {
    5
}
fn d_reply_initial_delay_ms() -> u64 {
    500
}
fn d_reply_max_delay_ms() -> u64 {
    30_000
}
