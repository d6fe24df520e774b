//! Localized user-facing strings.

use std::collections::HashMap;

/// Message keys known to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Welcome,
    DescriptionAccepted,
    Error,
    UnsupportedContent,
    ReportPrompt,
    ReportThanks,
    /// Contains a `{model}` placeholder for the current model name.
    SelectModel,
    /// Contains a `{model}` placeholder for the chosen model name.
    ModelChanged,
}

impl MessageKey {
    pub const ALL: [Self; 8] = [
        Self::Welcome,
        Self::DescriptionAccepted,
        Self::Error,
        Self::UnsupportedContent,
        Self::ReportPrompt,
        Self::ReportThanks,
        Self::SelectModel,
        Self::ModelChanged,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::DescriptionAccepted => "description_accepted",
            Self::Error => "error",
            Self::UnsupportedContent => "unsupported_content",
            Self::ReportPrompt => "report_prompt",
            Self::ReportThanks => "report_thanks",
            Self::SelectModel => "select_model",
            Self::ModelChanged => "model_changed",
        }
    }

    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

pub const DEFAULT_LANGUAGE: &str = "en";

/// Lookup of localized strings with fallback to [`DEFAULT_LANGUAGE`].
pub trait MessageCatalog: Send + Sync {
    fn get_message(&self, key: MessageKey, language_code: &str) -> String;
}

/// Map a platform language code onto a catalog language.
#[must_use]
pub fn normalize_language(code: &str) -> String {
    let primary = code
        .split(['-', '_'])
        .next()
        .unwrap_or(code)
        .to_ascii_lowercase();
    match primary.as_str() {
        // legacy Hebrew code
        "iw" => "he".to_string(),
        _ => primary,
    }
}

/// Built-in `en`/`ru`/`he` strings plus per-language overrides from config.
#[derive(Debug, Clone, Default)]
pub struct BuiltinCatalog {
    overrides: HashMap<String, HashMap<MessageKey, String>>,
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `messages.<lang>.<key>` overrides. Unknown keys are ignored and
    /// returned so the caller can warn about them.
    pub fn with_overrides(
        mut self,
        overrides: &HashMap<String, HashMap<String, String>>,
    ) -> (Self, Vec<String>) {
        let mut unknown = Vec::new();
        for (lang, entries) in overrides {
            let lang = normalize_language(lang);
            for (key, text) in entries {
                match MessageKey::parse(key) {
                    Some(k) => {
                        self.overrides
                            .entry(lang.clone())
                            .or_default()
                            .insert(k, text.clone());
                    },
                    None => unknown.push(format!("{lang}.{key}")),
                }
            }
        }
        unknown.sort();
        (self, unknown)
    }

    fn lookup(&self, key: MessageKey, lang: &str) -> Option<String> {
        if let Some(text) = self.overrides.get(lang).and_then(|m| m.get(&key)) {
            return Some(text.clone());
        }
        builtin(key, lang).map(ToString::to_string)
    }
}

impl MessageCatalog for BuiltinCatalog {
    fn get_message(&self, key: MessageKey, language_code: &str) -> String {
        let lang = normalize_language(language_code);
        self.lookup(key, &lang)
            .or_else(|| self.lookup(key, DEFAULT_LANGUAGE))
            .unwrap_or_else(|| key.as_str().to_string())
    }
}

fn builtin(key: MessageKey, lang: &str) -> Option<&'static str> {
    use MessageKey::*;
    let text = match (lang, key) {
        ("en", Welcome) => EN_WELCOME,
        ("en", DescriptionAccepted) => EN_DESCRIPTION_ACCEPTED,
        ("en", Error) => {
            "I apologize, but an error occurred. Please try again or contact support if the issue persists."
        },
        ("en", UnsupportedContent) => {
            "I can only process text messages at the moment. Please send me a text message instead of photos, videos, or other media. 📝"
        },
        ("en", ReportPrompt) => "Please describe the issue: ",
        ("en", ReportThanks) => "Thank you for reporting the issue, starting new chat...",
        ("en", SelectModel) => "Current model: {model}\n\nSelect a model:",
        ("en", ModelChanged) => {
            "✅ Model changed to: {model}\n\nYour next messages will use this model."
        },

        ("ru", Welcome) => RU_WELCOME,
        ("ru", DescriptionAccepted) => RU_DESCRIPTION_ACCEPTED,
        ("ru", Error) => {
            "Извините, произошла ошибка. Пожалуйста, попробуйте еще раз или обратитесь в поддержку, если проблема не устранена."
        },
        ("ru", UnsupportedContent) => {
            "Я могу обрабатывать только текстовые сообщения. Пожалуйста, отправьте мне текстовое сообщение вместо фотографий, видео или других медиафайлов. 📝"
        },
        ("ru", ReportPrompt) => "Пожалуйста, опишите проблему: ",
        ("ru", ReportThanks) => "Спасибо за сообщение о проблеме, начинаем новый чат...",
        ("ru", SelectModel) => "Текущая модель: {model}\n\nВыберите модель:",
        ("ru", ModelChanged) => {
            "✅ Модель изменена на: {model}\n\nСледующие сообщения будут использовать эту модель."
        },

        ("he", Welcome) => HE_WELCOME,
        ("he", DescriptionAccepted) => HE_DESCRIPTION_ACCEPTED,
        ("he", Error) => "אני מתנצל, אך אירעה שגיאה. אנא נסה שוב או פנה לתמיכה אם הבעיה נמשכת.",
        ("he", UnsupportedContent) => {
            "אני יכול לעבד רק הודעות טקסט כרגע. אנא שלח לי הודעת טקסט במקום תמונות, סרטונים או מדיה אחרת. 📝"
        },
        ("he", ReportPrompt) => "אנא תאר את הבעיה: ",
        ("he", ReportThanks) => "תודה על הדיווח, מתחילים שיחה חדשה...",
        ("he", SelectModel) => "המודל הנוכחי: {model}\n\nבחר מודל:",
        ("he", ModelChanged) => "✅ המודל שונה ל: {model}\n\nההודעות הבאות ישתמשו במודל זה.",

        _ => return None,
    };
    Some(text)
}

const EN_WELCOME: &str = "👋 Welcome! I'm your Business Assistant Bot.

I'm here to help you create an AI assistant for your business that can answer customer questions accurately and professionally.

Please tell me about your business. Include details such as:
- Main products or services you offer
- Working hours and schedule
- Location and contact methods
- Pricing information
- Special features or unique selling points
- Any policies customers should know about

The more details you provide, the better I'll be able to assist your customers! 🎯";

const EN_DESCRIPTION_ACCEPTED: &str = "✨ Perfect! I've recorded your business details.

You can now chat with me as if you were a customer. I'll respond based on the information you provided.

Feel free to ask any questions about your business, and I'll do my best to help! 🚀";

const RU_WELCOME: &str = "👋 Добро пожаловать! Я ваш бизнес-ассистент.

Я помогу создать AI-ассистента для вашего бизнеса, который сможет профессионально отвечать на вопросы клиентов.

Пожалуйста, опишите ваш бизнес. Укажите:
- Основные товары/услуги
- График работы
- Контактные данные и местоположение
- Ценовую политику
- Уникальные особенности вашего бизнеса
- Важные правила и условия

Чем больше деталей вы предоставите, тем лучше я смогу помогать вашим клиентам! 🎯";

const RU_DESCRIPTION_ACCEPTED: &str = "✨ Отлично! Я записал информацию о вашем бизнесе.

Теперь вы можете общаться со мной как клиент. Я буду отвечать на основе предоставленной вами информации.

Не стесняйтесь задавать любые вопросы о вашем бизнесе, и я сделаю все возможное, чтобы помочь! 🚀";

const HE_WELCOME: &str = "👋 ברוך הבא! אני הבוט העסקי שלך.

אני כאן כדי לעזור לך ליצור עוזר AI לעסק שלך שיוכל לענות על שאלות לקוחות בצורה מדויקת ומקצועית.

אנא ספר לי על העסק שלך. כלול פרטים כמו:
- המוצרים או השירותים העיקריים שאתה מציע
- שעות עבודה ולוח זמנים
- מיקום ושיטות יצירת קשר
- מידע על תמחור
- מאפיינים מיוחדים או נקודות מכירה ייחודיות
- כל מדיניות שלקוחות צריכים לדעת עליה

ככל שתספק יותר פרטים, כך אוכל לעזור ללקוחות שלך טוב יותר! 🎯";

const HE_DESCRIPTION_ACCEPTED: &str = "✨ מושלם! רשמתי את פרטי העסק שלך.

כעת אתה יכול לשוחח איתי כאילו היית לקוח. אני אגיב בהתבסס על המידע שסיפקת.

אל תהסס לשאול כל שאלה על העסק שלך, ואני אעשה כמיטב יכולתי לעזור! 🚀";
