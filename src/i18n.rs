#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn from_env() -> Self {
        std::env::var("LANG")
            .ok()
            .map(|v| Self::from_tag(&v))
            .unwrap_or_default()
    }

    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().to_ascii_lowercase().starts_with("zh") {
            Self::Zh
        } else {
            Self::En
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NoViewProvided,
    NoViewExisted,
    NoDailyNote,
    SyncFailed,
    SyncDone,
    MissingConfig,
}

pub fn text(locale: Locale, message: Message) -> &'static str {
    match (locale, message) {
        (Locale::En, Message::NoViewProvided) => "Please provide a view name",
        (Locale::En, Message::NoViewExisted) => "View does not exist",
        (Locale::En, Message::NoDailyNote) => "Daily note does not exist",
        (Locale::En, Message::SyncFailed) => "Failed to sync daily records",
        (Locale::En, Message::SyncDone) => "Daily records synced",
        (Locale::En, Message::MissingConfig) => {
            "Please set the daily record API and token in the settings"
        }
        (Locale::Zh, Message::NoViewProvided) => "请提供视图名称",
        (Locale::Zh, Message::NoViewExisted) => "视图不存在",
        (Locale::Zh, Message::NoDailyNote) => "日记文件不存在",
        (Locale::Zh, Message::SyncFailed) => "同步每日记录失败",
        (Locale::Zh, Message::SyncDone) => "每日记录已同步",
        (Locale::Zh, Message::MissingConfig) => "请在设置中填写每日记录的 API 与 Token",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_locale_from_language_tag() {
        assert_eq!(Locale::from_tag("zh_CN.UTF-8"), Locale::Zh);
        assert_eq!(Locale::from_tag("en_US.UTF-8"), Locale::En);
        assert_eq!(Locale::from_tag(""), Locale::En);
    }
}
