//! Order message composition.
//!
//! Orders are not recorded anywhere: the storefront renders an
//! [`OrderMessage`] into plain text and hands it to a chat app, where a human
//! confirms it. Composition is a pure function of its input; the timestamp and
//! reference are passed in, never read from the clock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartLineItem;
use crate::pricing;
use crate::types::{CurrencyCode, Price};

/// Contact details the customer typed into the order form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Telegram username, with or without the leading `@`.
    pub telegram: Option<String>,
}

/// Delivery address. Every field is optional; blank fields are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    /// Wilaya, province or state.
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl ShippingAddress {
    fn parts(&self) -> Vec<&str> {
        [
            &self.street,
            &self.city,
            &self.region,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| present(part.as_deref()))
        .collect()
    }

    /// True when no field carries any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts().is_empty()
    }
}

/// Human-readable order reference, e.g. `R9-20261018-4F2A`.
///
/// Only ever embedded in the message text; the shop uses it to talk about the
/// order with the customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderReference(String);

impl OrderReference {
    /// Build a reference from the order date and a random suffix.
    #[must_use]
    pub fn new(placed_at: DateTime<Utc>, suffix: u16) -> Self {
        Self(format!("R9-{}-{suffix:04X}", placed_at.format("%Y%m%d")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything that goes into one order message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMessage {
    pub store_name: String,
    pub reference: OrderReference,
    pub customer: CustomerContact,
    pub items: Vec<CartLineItem>,
    pub currency: CurrencyCode,
    pub shipping: Option<ShippingAddress>,
    pub note: Option<String>,
    pub placed_at: DateTime<Utc>,
}

impl OrderMessage {
    /// Grand total of the order, from the shared pricing module.
    #[must_use]
    pub fn total(&self) -> Decimal {
        pricing::subtotal(&self.items)
    }

    /// Render the message text.
    ///
    /// Sections always appear in this order: header, customer, items, total,
    /// shipping address, notes, date. Optional sections with nothing in them are
    /// left out.
    #[must_use]
    pub fn compose(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push(format!("New order - {}", self.store_name));
        lines.push(format!("Reference: {}", self.reference));

        lines.push(String::new());
        lines.push("Customer".to_string());
        lines.push(format!("Name: {}", self.customer.name.trim()));
        if let Some(email) = present(self.customer.email.as_deref()) {
            lines.push(format!("Email: {email}"));
        }
        if let Some(phone) = present(self.customer.phone.as_deref()) {
            lines.push(format!("Phone: {phone}"));
        }
        if let Some(handle) = present(self.customer.telegram.as_deref()) {
            lines.push(format!("Telegram: @{}", handle.trim_start_matches('@')));
        }

        lines.push(String::new());
        lines.push("Items".to_string());
        for (index, item) in self.items.iter().enumerate() {
            lines.push(format!("{}. {}", index + 1, item.name));

            let variant = [
                item.color.as_deref().map(|c| format!("Color: {c}")),
                item.size.as_deref().map(|s| format!("Size: {s}")),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
            if !variant.is_empty() {
                lines.push(format!("   {}", variant.join(" | ")));
            }

            lines.push(format!(
                "   {} x {} = {}",
                item.quantity,
                self.money(item.unit_price),
                self.money(pricing::line_total(item)),
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {}", self.money(self.total())));

        if let Some(address) = self.shipping.as_ref().filter(|a| !a.is_empty()) {
            lines.push(String::new());
            lines.push("Shipping address".to_string());
            lines.push(address.parts().join(", "));
        }

        if let Some(note) = present(self.note.as_deref()) {
            lines.push(String::new());
            lines.push("Notes".to_string());
            lines.push(note.to_string());
        }

        lines.push(String::new());
        lines.push(format!(
            "Date: {}",
            self.placed_at.format("%Y-%m-%d %H:%M UTC")
        ));

        lines.join("\n")
    }

    fn money(&self, amount: Decimal) -> String {
        Price::new(amount, self.currency).display()
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::ProductId;

    fn placed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 14, 5, 0).unwrap()
    }

    fn message() -> OrderMessage {
        OrderMessage {
            store_name: "Ra9ia Collection".to_string(),
            reference: OrderReference::new(placed_at(), 0x4F2A),
            customer: CustomerContact {
                name: "Amina".to_string(),
                email: Some("amina@mail.com".to_string()),
                phone: Some("+213 555 12 34 56".to_string()),
                telegram: Some("amina_b".to_string()),
            },
            items: vec![
                CartLineItem::new(ProductId::new("p1"), "Abaya Noir", Decimal::from(100), 2)
                    .with_color(Some("black".to_string()))
                    .with_size(Some("M".to_string())),
                CartLineItem::new(ProductId::new("p2"), "Hijab Soie", Decimal::from(1500), 1),
            ],
            currency: CurrencyCode::DZD,
            shipping: Some(ShippingAddress {
                street: Some("12 rue Didouche Mourad".to_string()),
                city: Some("Alger".to_string()),
                region: None,
                postal_code: Some("16000".to_string()),
                country: Some(String::new()),
            }),
            note: Some("Call before delivery".to_string()),
            placed_at: placed_at(),
        }
    }

    #[test]
    fn test_reference_format() {
        assert_eq!(
            OrderReference::new(placed_at(), 0x4F2A).as_str(),
            "R9-20261018-4F2A"
        );
        assert_eq!(OrderReference::new(placed_at(), 7).as_str(), "R9-20261018-0007");
    }

    #[test]
    fn test_compose_full_message() {
        let expected = "\
New order - Ra9ia Collection
Reference: R9-20261018-4F2A

Customer
Name: Amina
Email: amina@mail.com
Phone: +213 555 12 34 56
Telegram: @amina_b

Items
1. Abaya Noir
   Color: black | Size: M
   2 x 100 DA = 200 DA
2. Hijab Soie
   1 x 1500 DA = 1500 DA

Total: 1700 DA

Shipping address
12 rue Didouche Mourad, Alger, 16000

Notes
Call before delivery

Date: 2026-10-18 14:05 UTC";

        assert_eq!(message().compose(), expected);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let msg = message();
        assert_eq!(msg.compose(), msg.compose());
        assert_eq!(msg.compose(), message().compose());
    }

    #[test]
    fn test_optional_sections_omitted() {
        let mut msg = message();
        msg.customer.email = None;
        msg.customer.phone = Some("  ".to_string());
        msg.customer.telegram = None;
        msg.shipping = Some(ShippingAddress::default());
        msg.note = None;

        let text = msg.compose();
        assert!(!text.contains("Email:"));
        assert!(!text.contains("Phone:"));
        assert!(!text.contains("Telegram:"));
        assert!(!text.contains("Shipping address"));
        assert!(!text.contains("Notes"));
        assert!(text.ends_with("Date: 2026-10-18 14:05 UTC"));
    }

    #[test]
    fn test_telegram_handle_not_doubled() {
        let mut msg = message();
        msg.customer.telegram = Some("@amina_b".to_string());
        assert!(msg.compose().contains("Telegram: @amina_b\n"));
    }

    #[test]
    fn test_total_matches_cart_subtotal() {
        let msg = message();
        let mut cart = crate::Cart::new();
        for item in &msg.items {
            cart.add_item(item.clone());
        }
        assert_eq!(msg.total(), cart.subtotal());
    }
}
