//! Chat deep links.
//!
//! An order is submitted by sending the customer's browser to a Telegram or
//! WhatsApp chat with the order text pre-filled. Nothing comes back: once the
//! link is built, the storefront is done.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL for Telegram chat links.
pub const TELEGRAM_BASE_URL: &str = "https://t.me/";

/// Base URL for WhatsApp click-to-chat links.
pub const WHATSAPP_BASE_URL: &str = "https://wa.me/";

/// Chat app an order is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Telegram,
    WhatsApp,
}

impl Channel {
    /// Display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Telegram => "Telegram",
            Self::WhatsApp => "WhatsApp",
        }
    }

    /// Form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
            Self::WhatsApp => "whatsapp",
        }
    }
}

impl FromStr for Channel {
    type Err = HandoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "telegram" => Ok(Self::Telegram),
            "whatsapp" => Ok(Self::WhatsApp),
            other => Err(HandoffError::UnknownChannel(other.to_string())),
        }
    }
}

/// Reasons a handoff cannot start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandoffError {
    /// No Telegram username is configured for this order.
    #[error("no Telegram username is configured")]
    MissingTelegramUsername,

    /// No WhatsApp number is configured, or it has no digits.
    #[error("no WhatsApp number is configured")]
    MissingWhatsAppNumber,

    /// The requested channel is not one we hand off to.
    #[error("unknown messaging channel: {0}")]
    UnknownChannel(String),
}

/// Build a Telegram chat link with pre-filled text.
///
/// Accepts `name`, `@name` or `https://t.me/name`.
///
/// # Errors
///
/// Returns [`HandoffError::MissingTelegramUsername`] if the username is empty
/// or has characters other than ASCII letters, digits and `_`.
pub fn telegram_link(username: &str, text: &str) -> Result<String, HandoffError> {
    let username = normalize_telegram_username(username)
        .ok_or(HandoffError::MissingTelegramUsername)?;
    Ok(format!(
        "{TELEGRAM_BASE_URL}{username}?text={}",
        urlencoding::encode(text)
    ))
}

/// Build a WhatsApp chat link with pre-filled text.
///
/// Every non-digit character of `number` is dropped, so `+213 555-12-34-56`
/// becomes `213555123456`.
///
/// # Errors
///
/// Returns [`HandoffError::MissingWhatsAppNumber`] if no digits remain.
pub fn whatsapp_link(number: &str, text: &str) -> Result<String, HandoffError> {
    let digits = whatsapp_digits(number).ok_or(HandoffError::MissingWhatsAppNumber)?;
    Ok(format!(
        "{WHATSAPP_BASE_URL}{digits}?text={}",
        urlencoding::encode(text)
    ))
}

fn normalize_telegram_username(username: &str) -> Option<&str> {
    let username = username.trim();
    let username = username
        .strip_prefix("https://t.me/")
        .or_else(|| username.strip_prefix("t.me/"))
        .unwrap_or(username)
        .trim_start_matches('@')
        .trim_end_matches('/');
    let valid = !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(username)
}

fn whatsapp_digits(number: &str) -> Option<String> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

/// Where orders are sent.
///
/// Settings come in layers (product, partner, site, environment); the first
/// layer with a usable value for a channel wins. See [`ContactSettings::or`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSettings {
    pub telegram_username: Option<String>,
    pub whatsapp_number: Option<String>,
}

impl ContactSettings {
    #[must_use]
    pub fn new(telegram_username: Option<String>, whatsapp_number: Option<String>) -> Self {
        Self {
            telegram_username,
            whatsapp_number,
        }
    }

    /// Fill blank channels from `fallback`.
    #[must_use]
    pub fn or(self, fallback: &Self) -> Self {
        let telegram_username = self
            .telegram_username
            .filter(|u| normalize_telegram_username(u).is_some())
            .or_else(|| fallback.telegram_username.clone());
        let whatsapp_number = self
            .whatsapp_number
            .filter(|n| whatsapp_digits(n).is_some())
            .or_else(|| fallback.whatsapp_number.clone());
        Self {
            telegram_username,
            whatsapp_number,
        }
    }

    /// Whether an order could be sent over `channel`.
    #[must_use]
    pub fn supports(&self, channel: Channel) -> bool {
        match channel {
            Channel::Telegram => self
                .telegram_username
                .as_deref()
                .and_then(normalize_telegram_username)
                .is_some(),
            Channel::WhatsApp => self
                .whatsapp_number
                .as_deref()
                .and_then(whatsapp_digits)
                .is_some(),
        }
    }

    /// Channels with a usable destination, Telegram first.
    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        [Channel::Telegram, Channel::WhatsApp]
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }

    /// Build the deep link for `channel` carrying `text`.
    ///
    /// # Errors
    ///
    /// Returns a [`HandoffError`] if the channel has no usable destination.
    pub fn deep_link(&self, channel: Channel, text: &str) -> Result<String, HandoffError> {
        match channel {
            Channel::Telegram => telegram_link(
                self.telegram_username.as_deref().unwrap_or_default(),
                text,
            ),
            Channel::WhatsApp => {
                whatsapp_link(self.whatsapp_number.as_deref().unwrap_or_default(), text)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_link() {
        let link = telegram_link("ra9ia_shop", "Hello world").unwrap();
        assert_eq!(link, "https://t.me/ra9ia_shop?text=Hello%20world");
    }

    #[test]
    fn test_telegram_link_accepts_handle_forms() {
        for username in ["@ra9ia_shop", "https://t.me/ra9ia_shop", " t.me/ra9ia_shop/ "] {
            let link = telegram_link(username, "x").unwrap();
            assert_eq!(link, "https://t.me/ra9ia_shop?text=x");
        }
    }

    #[test]
    fn test_telegram_link_empty_username() {
        assert_eq!(
            telegram_link("  @ ", "x"),
            Err(HandoffError::MissingTelegramUsername)
        );
    }

    #[test]
    fn test_telegram_username_with_stray_characters_is_missing() {
        for username in ["ra9ia\nshop", "ra9ia shop", "ra9ia/shop", "ra9ia?x=1", "ra9ïa"] {
            assert_eq!(
                telegram_link(username, "x"),
                Err(HandoffError::MissingTelegramUsername),
                "{username:?}"
            );
        }
    }

    #[test]
    fn test_invalid_telegram_username_falls_back() {
        let site = ContactSettings::new(Some("ra9ia_shop".to_string()), None);
        let partner = ContactSettings::new(Some("bad\u{7}name".to_string()), None).or(&site);
        assert!(partner.supports(Channel::Telegram));
        assert_eq!(
            partner.deep_link(Channel::Telegram, "x").unwrap(),
            "https://t.me/ra9ia_shop?text=x"
        );
    }

    #[test]
    fn test_whatsapp_link_strips_non_digits() {
        let link = whatsapp_link("+213 (555) 12-34-56", "Order\nTotal: 200 DA").unwrap();
        assert_eq!(
            link,
            "https://wa.me/213555123456?text=Order%0ATotal%3A%20200%20DA"
        );
    }

    #[test]
    fn test_whatsapp_link_without_digits_aborts() {
        assert_eq!(whatsapp_link("", "x"), Err(HandoffError::MissingWhatsAppNumber));
        assert_eq!(
            whatsapp_link("+ - ()", "x"),
            Err(HandoffError::MissingWhatsAppNumber)
        );
    }

    #[test]
    fn test_channel_from_str() {
        assert_eq!("WhatsApp".parse::<Channel>().unwrap(), Channel::WhatsApp);
        assert_eq!("telegram".parse::<Channel>().unwrap(), Channel::Telegram);
        assert!(matches!(
            "sms".parse::<Channel>(),
            Err(HandoffError::UnknownChannel(_))
        ));
    }

    #[test]
    fn test_layered_settings_prefer_first_usable_value() {
        let product = ContactSettings::new(None, Some("  ".to_string()));
        let partner = ContactSettings::new(Some("partner_shop".to_string()), None);
        let site = ContactSettings::new(
            Some("ra9ia_shop".to_string()),
            Some("+213555000111".to_string()),
        );

        let resolved = product.or(&partner).or(&site);
        assert_eq!(resolved.telegram_username.as_deref(), Some("partner_shop"));
        assert_eq!(resolved.whatsapp_number.as_deref(), Some("+213555000111"));
    }

    #[test]
    fn test_channels_and_deep_link() {
        let settings = ContactSettings::new(Some("ra9ia_shop".to_string()), None);
        assert_eq!(settings.channels(), vec![Channel::Telegram]);
        assert!(settings.deep_link(Channel::Telegram, "hi").is_ok());
        assert_eq!(
            settings.deep_link(Channel::WhatsApp, "hi"),
            Err(HandoffError::MissingWhatsAppNumber)
        );
    }
}
