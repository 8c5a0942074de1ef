use leptos::prelude::*;

/// 通知显示时长
const TOAST_DURATION: std::time::Duration = std::time::Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// 递增序号，用于判断到期的是不是当前这条
    pub id: u64,
    pub message: String,
    pub is_error: bool,
}

/// 全局临时通知（同时只显示一条）
#[derive(Clone, Copy)]
pub struct Toasts {
    current: RwSignal<Option<Toast>>,
    next_id: StoredValue<u64>,
}

impl Toasts {
    pub fn provide() -> Self {
        let toasts = Self {
            current: RwSignal::new(None),
            next_id: StoredValue::new(0),
        };
        provide_context(toasts);
        toasts
    }

    fn show(&self, message: String, is_error: bool) {
        let id = self.next_id.get_value() + 1;
        self.next_id.set_value(id);
        self.current.set(Some(Toast {
            id,
            message,
            is_error,
        }));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message.into(), false);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message.into(), true);
    }
}

/// 仅当槽中仍是编号为 `id` 的通知时清除
fn expire(slot: &mut Option<Toast>, id: u64) -> bool {
    if slot.as_ref().is_some_and(|t| t.id == id) {
        *slot = None;
        true
    } else {
        false
    }
}

pub fn use_toasts() -> Toasts {
    use_context::<Toasts>().expect("Toasts should be provided")
}

/// 通知提示框，3 秒后自动清除
#[component]
pub fn Notifications() -> impl IntoView {
    let toasts = use_toasts();
    let current = toasts.current;

    Effect::new(move |_| {
        if let Some(id) = current.with(|t| t.as_ref().map(|t| t.id)) {
            set_timeout(
                move || {
                    current.update(|slot| {
                        expire(slot, id);
                    })
                },
                TOAST_DURATION,
            );
        }
    });

    move || {
        current.get().map(|toast| {
            let class = if toast.is_error {
                "alert alert-error shadow-lg"
            } else {
                "alert alert-success shadow-lg"
            };
            view! {
                <div class="toast toast-top toast-end z-50">
                    <div class=class>
                        <span>{toast.message}</span>
                    </div>
                </div>
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toast(id: u64) -> Option<Toast> {
        Some(Toast {
            id,
            message: format!("toast {}", id),
            is_error: false,
        })
    }

    #[test]
    fn test_stale_timer_keeps_newer_toast() {
        let mut slot = toast(2);
        assert!(!expire(&mut slot, 1));
        assert_eq!(slot.as_ref().map(|t| t.id), Some(2));

        assert!(expire(&mut slot, 2));
        assert!(slot.is_none());
        assert!(!expire(&mut slot, 2));
    }
}
