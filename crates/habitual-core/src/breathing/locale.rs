use serde::{Deserialize, Serialize};

use super::technique::Phase;

/// User-facing language. Russian is the product's primary locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

const RU_NUMBERS: [&str; 10] = [
    "Один", "Два", "Три", "Четыре", "Пять", "Шесть", "Семь", "Восемь", "Девять", "Десять",
];
const EN_NUMBERS: [&str; 10] = [
    "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
];

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ru" => Some(Locale::Ru),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn phase_label(self, phase: Phase) -> &'static str {
        match (self, phase) {
            (Locale::Ru, Phase::Inhale) => "Вдох",
            (Locale::Ru, Phase::Exhale) => "Выдох",
            (Locale::Ru, Phase::HoldStart | Phase::HoldEnd) => "Задержка",
            (Locale::En, Phase::Inhale) => "Inhale",
            (Locale::En, Phase::Exhale) => "Exhale",
            (Locale::En, Phase::HoldStart | Phase::HoldEnd) => "Hold",
        }
    }

    /// Spoken name for 1..=10; anything else has no name.
    pub fn number_name(self, n: u8) -> Option<&'static str> {
        let table = match self {
            Locale::Ru => &RU_NUMBERS,
            Locale::En => &EN_NUMBERS,
        };
        (1..=10).contains(&n).then(|| table[usize::from(n) - 1])
    }

    pub fn pause_label(self) -> &'static str {
        match self {
            Locale::Ru => "Пауза",
            Locale::En => "Pause",
        }
    }

    pub fn resume_label(self) -> &'static str {
        match self {
            Locale::Ru => "Продолжить",
            Locale::En => "Resume",
        }
    }

    pub fn cancel_prompt(self) -> &'static str {
        match self {
            Locale::Ru => "Вы уверены, что хотите отменить сессию?",
            Locale::En => "Are you sure you want to cancel the session?",
        }
    }

    pub fn completed_message(self) -> &'static str {
        match self {
            Locale::Ru => "Сессия завершена! Вы молодец.",
            Locale::En => "Session complete! Well done.",
        }
    }

    pub fn rate_limited_message(self) -> &'static str {
        match self {
            Locale::Ru => "Слишком часто. Попробуйте через 3 секунды.",
            Locale::En => "Too fast. Try again in 3 seconds.",
        }
    }

    pub fn save_failed_message(self) -> &'static str {
        match self {
            Locale::Ru => "Ошибка при сохранении.",
            Locale::En => "Could not save.",
        }
    }

    pub fn connection_failed_message(self) -> &'static str {
        match self {
            Locale::Ru => "Ошибка соединения.",
            Locale::En => "Connection error.",
        }
    }

    /// Static path the cue recordings are served from.
    pub fn audio_base_path(self) -> String {
        format!("/static/audio/{}/", self.code())
    }
}
