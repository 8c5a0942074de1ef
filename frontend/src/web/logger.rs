//! 控制台日志
//!
//! `log` 门面的浏览器后端，按级别分发到 `console.debug/info/warn/error`。

use log::{Level, Log, Metadata, Record};
use wasm_bindgen::JsValue;

struct ConsoleLogger {
    level: Level,
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}", record.target(), record.args());
        let msg = JsValue::from_str(&line);
        match record.level() {
            Level::Error => web_sys::console::error_1(&msg),
            Level::Warn => web_sys::console::warn_1(&msg),
            Level::Info => web_sys::console::info_1(&msg),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

/// 安装控制台日志，重复调用无效果
pub fn init(level: Level) {
    let logger = Box::new(ConsoleLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level.to_level_filter());
    }
}
