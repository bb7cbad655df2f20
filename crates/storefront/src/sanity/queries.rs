//! GROQ queries.
//!
//! Projections rename Sanity's nested shapes (`slug.current`, `asset->url`)
//! into the flat structs in [`super::types`].

/// Filter every product list applies: drafts without a slug, name or price
/// are not sellable.
macro_rules! sellable_product {
    () => {
        r#"_type == "product" && defined(slug.current) && defined(name) && defined(price)"#
    };
}

/// Projection shared by every product query.
macro_rules! product_projection {
    () => {
        r#"{
  _id,
  name,
  "slug": slug.current,
  price,
  compareAtPrice,
  description,
  "images": images[]{ "url": asset->url, alt },
  colors,
  sizes,
  inStock,
  stockQuantity,
  featured,
  telegramUsername,
  whatsappNumber,
  "partner": partner->{ _id, name, "slug": slug.current, telegramUsername, whatsappNumber }
}"#
    };
}

/// Projection shared by collection queries, without products.
macro_rules! collection_projection {
    () => {
        r#"_id,
  title,
  "slug": slug.current,
  description,
  "image": image{ "url": asset->url, alt }"#
    };
}

/// Projection shared by partner queries, without products.
macro_rules! partner_projection {
    () => {
        r#"_id,
  name,
  "slug": slug.current,
  description,
  city,
  "logo": logo{ "url": asset->url, alt },
  telegramUsername,
  whatsappNumber"#
    };
}

pub const SITE_SETTINGS: &str = r#"*[_type == "siteSettings"][0]{
  storeName,
  announcement,
  telegramUsername,
  whatsappNumber
}"#;

pub const PRODUCTS: &str = concat!(
    "*[",
    sellable_product!(),
    r#"] | order(_createdAt desc) "#,
    product_projection!()
);

pub const FEATURED_PRODUCTS: &str = concat!(
    "*[",
    sellable_product!(),
    r#" && featured == true] | order(_createdAt desc)[0...8] "#,
    product_projection!()
);

/// Params: `$slug`.
pub const PRODUCT_BY_SLUG: &str = concat!(
    "*[",
    sellable_product!(),
    r#" && slug.current == $slug][0] "#,
    product_projection!()
);

pub const COLLECTIONS: &str = concat!(
    r#"*[_type == "collection" && defined(slug.current)] | order(title asc){
  "#,
    collection_projection!(),
    "\n}"
);

/// Params: `$slug`.
pub const COLLECTION_BY_SLUG: &str = concat!(
    r#"*[_type == "collection" && slug.current == $slug][0]{
  "#,
    collection_projection!(),
    r#",
  "products": products[]->["#,
    sellable_product!(),
    "] ",
    product_projection!(),
    "\n}"
);

pub const PARTNERS: &str = concat!(
    r#"*[_type == "partner" && defined(slug.current)] | order(name asc){
  "#,
    partner_projection!(),
    "\n}"
);

/// Params: `$slug`.
pub const PARTNER_BY_SLUG: &str = concat!(
    r#"*[_type == "partner" && slug.current == $slug][0]{
  "#,
    partner_projection!(),
    r#",
  "products": *["#,
    sellable_product!(),
    r#" && references(^._id)] | order(_createdAt desc) "#,
    product_projection!(),
    "\n}"
);

/// Count unsent notifications for the same person and variant.
///
/// Params: `$email`, `$productId`, `$color`, `$size` (the last two may be null).
pub const PENDING_RESTOCK_COUNT: &str = r#"count(*[
  _type == "restockNotification"
  && email == $email
  && product._ref == $productId
  && color == $color
  && size == $size
  && notified != true
])"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_queries_share_projection() {
        for query in [PRODUCTS, FEATURED_PRODUCTS, PRODUCT_BY_SLUG] {
            assert!(query.contains(r#""slug": slug.current"#));
            assert!(query.contains("partner->"));
        }
    }

    #[test]
    fn test_every_product_query_requires_price_and_name() {
        for query in [
            PRODUCTS,
            FEATURED_PRODUCTS,
            PRODUCT_BY_SLUG,
            COLLECTION_BY_SLUG,
            PARTNER_BY_SLUG,
        ] {
            assert!(query.contains("defined(price)"), "{query}");
            assert!(query.contains("defined(name)"), "{query}");
        }
    }

    #[test]
    fn test_nested_product_lists() {
        assert!(COLLECTION_BY_SLUG.contains(r#""products": products[]->["#));
        assert!(PARTNER_BY_SLUG.contains("references(^._id)"));
    }

    #[test]
    fn test_slug_queries_take_slug_param() {
        for query in [PRODUCT_BY_SLUG, COLLECTION_BY_SLUG, PARTNER_BY_SLUG] {
            assert!(query.contains("$slug"));
        }
    }
}
