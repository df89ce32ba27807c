use serde::Serialize;

/// Body of every failed response: `{"ok": false, "error": ...}`.
#[derive(Serialize)]
pub struct ApiError<E> {
    ok: bool,
    pub error: E,
}

impl<E> ApiError<E> {
    pub fn new(error: E) -> Self {
        Self { ok: false, error }
    }
}

/// Body of every successful response: `{"ok": true}`.
#[derive(Serialize)]
pub struct ApiSuccess {
    ok: bool,
    /// Set if the submission has been discarded by the spam filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot: Option<bool>,
}

impl ApiSuccess {
    pub fn delivered() -> Self {
        Self {
            ok: true,
            bot: None,
        }
    }

    pub fn bot() -> Self {
        Self {
            ok: true,
            bot: Some(true),
        }
    }
}
