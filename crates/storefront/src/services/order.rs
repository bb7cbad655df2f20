//! Order handoff.
//!
//! Turns a submitted order form into an [`OrderMessage`] and the chat deep
//! link that carries it. The form is trusted as-is; the shop confirms orders
//! by hand in the chat.

use chrono::{DateTime, Utc};
use ra9ia_core::{
    CartLineItem, Channel, ContactSettings, CurrencyCode, CustomerContact, HandoffError,
    OrderMessage, OrderReference, ShippingAddress,
};
use rand::Rng;
use serde::Deserialize;

/// Fields shared by the cart checkout and the buy-now forms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderForm {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// `telegram` or `whatsapp`.
    pub channel: String,
}

impl OrderForm {
    /// Validation message for the form, if any.
    #[must_use]
    pub fn problem(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("Please enter your name.");
        }
        let has_contact = [&self.phone, &self.email, &self.telegram]
            .into_iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()));
        if !has_contact {
            return Some(
                "Please leave a phone number, email or Telegram handle so we can reach you.",
            );
        }
        None
    }

    fn customer(&self) -> CustomerContact {
        CustomerContact {
            name: self.name.trim().to_string(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            telegram: self.telegram.clone(),
        }
    }

    fn shipping(&self) -> ShippingAddress {
        ShippingAddress {
            street: self.street.clone(),
            city: self.city.clone(),
            region: self.region.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }
}

/// A composed order ready to leave the storefront.
#[derive(Debug, Clone)]
pub struct Handoff {
    pub reference: OrderReference,
    pub channel: Channel,
    pub url: String,
}

/// Generate a reference for an order placed at `placed_at`.
#[must_use]
pub fn new_reference(placed_at: DateTime<Utc>) -> OrderReference {
    let suffix: u16 = rand::rng().random();
    OrderReference::new(placed_at, suffix)
}

/// Build the order message for `items` from a submitted form.
#[must_use]
pub fn build_message(
    form: &OrderForm,
    items: Vec<CartLineItem>,
    store_name: &str,
    currency: CurrencyCode,
    placed_at: DateTime<Utc>,
) -> OrderMessage {
    let shipping = form.shipping();
    OrderMessage {
        store_name: store_name.to_string(),
        reference: new_reference(placed_at),
        customer: form.customer(),
        items,
        currency,
        shipping: (!shipping.is_empty()).then_some(shipping),
        note: form.note.clone(),
        placed_at,
    }
}

/// Compose `message` and build the deep link for the form's channel.
///
/// # Errors
///
/// Returns a [`HandoffError`] if the channel is unknown or has no destination.
pub fn hand_off(
    message: &OrderMessage,
    channel: &str,
    contact: &ContactSettings,
) -> Result<Handoff, HandoffError> {
    let channel: Channel = channel.parse()?;
    let url = contact.deep_link(channel, &message.compose())?;
    tracing::info!(
        reference = %message.reference,
        channel = channel.label(),
        items = message.items.len(),
        "Order handed off"
    );
    Ok(Handoff {
        reference: message.reference.clone(),
        channel,
        url,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use ra9ia_core::ProductId;
    use rust_decimal::Decimal;

    use super::*;

    fn form(channel: &str) -> OrderForm {
        OrderForm {
            name: "Amina".to_string(),
            phone: Some("0555 12 34 56".to_string()),
            city: Some("Oran".to_string()),
            channel: channel.to_string(),
            ..OrderForm::default()
        }
    }

    fn items() -> Vec<CartLineItem> {
        vec![CartLineItem::new(ProductId::new("p1"), "Abaya Noir", Decimal::from(100), 2)]
    }

    fn placed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
    }

    fn message_for(form: &OrderForm) -> OrderMessage {
        build_message(form, items(), "Ra9ia Collection", CurrencyCode::DZD, placed_at())
    }

    #[test]
    fn test_form_problems() {
        assert!(form("telegram").problem().is_none());

        let mut missing_name = form("telegram");
        missing_name.name = "  ".to_string();
        assert!(missing_name.problem().is_some());

        let mut no_contact = form("telegram");
        no_contact.phone = Some(String::new());
        assert!(no_contact.problem().is_some());
    }

    #[test]
    fn test_reference_uses_order_date() {
        let reference = new_reference(placed_at());
        assert!(reference.as_str().starts_with("R9-20261018-"));
        assert_eq!(reference.as_str().len(), "R9-20261018-0000".len());
    }

    #[test]
    fn test_build_message_omits_blank_address() {
        let mut blank = form("telegram");
        blank.city = None;
        let message = message_for(&blank);
        assert!(message.shipping.is_none());

        let message = message_for(&form("telegram"));
        assert_eq!(message.shipping.unwrap().city.as_deref(), Some("Oran"));
    }

    #[test]
    fn test_hand_off_whatsapp() {
        let message = message_for(&form("whatsapp"));
        let contact = ContactSettings::new(None, Some("+213 555 00 01 11".to_string()));

        let handoff = hand_off(&message, "whatsapp", &contact).unwrap();
        assert_eq!(handoff.channel, Channel::WhatsApp);
        assert!(handoff.url.starts_with("https://wa.me/213555000111?text="));
        assert!(handoff.url.contains("Abaya%20Noir"));
    }

    #[test]
    fn test_hand_off_without_number_aborts() {
        let message = message_for(&form("whatsapp"));
        let contact = ContactSettings::new(Some("ra9ia_shop".to_string()), Some(String::new()));

        assert_eq!(
            hand_off(&message, "whatsapp", &contact).unwrap_err(),
            HandoffError::MissingWhatsAppNumber
        );
    }

    #[test]
    fn test_hand_off_unknown_channel() {
        let message = message_for(&form("sms"));
        assert!(matches!(
            hand_off(&message, "sms", &ContactSettings::default()),
            Err(HandoffError::UnknownChannel(_))
        ));
    }
}
