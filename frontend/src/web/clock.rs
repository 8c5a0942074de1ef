use coursedesk_shared::Timestamp;

/// 当前时间（`Date.now()`）
pub fn now() -> Timestamp {
    Timestamp::new(js_sys::Date::now() as i64)
}
