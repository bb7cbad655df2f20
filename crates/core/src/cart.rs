//! Shopping cart.
//!
//! A cart is an ordered list of [`CartLineItem`]s. Two lines are the same line
//! when their [`LineKey`] (product, color, size) matches; adding a line that
//! already exists increases its quantity instead of appending.
//!
//! The cart does not know where it is stored. Callers restore it with
//! [`Cart::restore`] and write [`Cart::to_stored`] back after every mutation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ProductId;
use crate::pricing;

/// Identity of a cart line: product plus the selected variant.
///
/// Empty color or size strings are treated as "not selected", so a form that
/// posts `color=` lands on the same line as one that omits the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl LineKey {
    #[must_use]
    pub fn new(product_id: ProductId, color: Option<String>, size: Option<String>) -> Self {
        Self {
            product_id,
            color: non_empty(color),
            size: non_empty(size),
        }
    }
}

/// One cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    /// Always at least 1 once the line is in a cart.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Image URL shown next to the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Product slug, for linking back to the product page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CartLineItem {
    /// Create a line without variant selection.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity,
            color: None,
            size: None,
            image: None,
            slug: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = non_empty(color);
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: Option<String>) -> Self {
        self.size = non_empty(size);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = non_empty(image);
        self
    }

    #[must_use]
    pub fn with_slug(mut self, slug: Option<String>) -> Self {
        self.slug = non_empty(slug);
        self
    }

    /// The identity key of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.color.clone(), self.size.clone())
    }

    fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id
            && non_empty_ref(self.color.as_deref()) == key.color.as_deref()
            && non_empty_ref(self.size.as_deref()) == key.size.as_deref()
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        pricing::line_total(self)
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Restore a cart from its stored representation.
    ///
    /// Missing, corrupt or legacy data yields an empty cart. Lines with a zero
    /// quantity are dropped.
    #[must_use]
    pub fn restore(stored: Option<&str>) -> Self {
        let Some(raw) = stored else {
            return Self::new();
        };

        match serde_json::from_str::<Vec<CartLineItem>>(raw) {
            Ok(mut items) => {
                items.retain(|item| item.quantity > 0);
                Self { items }
            }
            Err(_) => Self::new(),
        }
    }

    /// Serialize the full line list for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_stored(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by its identity key.
    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.matches(key))
    }

    /// Add a line, merging into an existing line with the same key.
    ///
    /// Price and stock are not checked. A zero quantity is ignored.
    pub fn add_item(&mut self, item: CartLineItem) {
        if item.quantity == 0 {
            return;
        }

        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|line| line.matches(&key)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(CartLineItem {
                color: key.color,
                size: key.size,
                ..item
            });
        }
    }

    /// Set the quantity of a line. Zero or less removes the line.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(key);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.items.iter_mut().find(|line| line.matches(key)) {
            line.quantity = quantity;
        }
    }

    /// Remove a line. Does nothing if the line is absent.
    pub fn remove_item(&mut self, key: &LineKey) {
        self.items.retain(|line| !line.matches(key));
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        pricing::item_count(&self.items)
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        pricing::subtotal(&self.items)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty_ref(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
