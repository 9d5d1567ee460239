use std::{fmt, path::Path};

use anyhow::Context as _;

use crate::foundation::error::{TryOnError, TryOnResult};

/// A price in integer cents.
///
/// Serialized as a decimal amount (`199.99`) so catalog and stored-collection JSON keep
/// their familiar shape; converted to cents on the way in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Self = Self(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Parse a decimal amount, rounding to the nearest cent.
    pub fn from_decimal(amount: f64) -> TryOnResult<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(TryOnError::validation(format!(
                "price must be a finite amount >= 0, got {amount}"
            )));
        }
        let cents = (amount * 100.0).round();
        if cents > u64::MAX as f64 {
            return Err(TryOnError::validation("price is too large"));
        }
        Ok(Self(cents as u64))
    }

    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_mul(self, qty: u32) -> Option<Self> {
        self.0.checked_mul(u64::from(qty)).map(Self)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl serde::Serialize for Money {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> serde::Deserialize<'de> for Money {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Money::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: Money,
    pub description: String,
    pub category: String,
    /// Image URI: `https://`, `data:` or a local path.
    pub image: String,
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// Read-only product list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog, rejecting empty or duplicate ids.
    pub fn new(products: Vec<Product>) -> TryOnResult<Self> {
        let mut seen = std::collections::HashSet::new();
        for p in &products {
            if p.id.trim().is_empty() {
                return Err(TryOnError::validation(format!(
                    "product '{}' has an empty id",
                    p.title
                )));
            }
            if !seen.insert(p.id.as_str()) {
                return Err(TryOnError::validation(format!(
                    "duplicate product id '{}'",
                    p.id
                )));
            }
        }
        Ok(Self { products })
    }

    pub fn from_json(json: &str) -> TryOnResult<Self> {
        let products: Vec<Product> = serde_json::from_str(json)
            .map_err(|e| TryOnError::serde(format!("catalog json: {e}")))?;
        Self::new(products)
    }

    pub fn from_json_file(path: &Path) -> TryOnResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// The storefront's stock catalog.
    pub fn builtin() -> Self {
        const SIZES_XS_XL: &[&str] = &["XS", "S", "M", "L", "XL"];
        const SIZES_XS_L: &[&str] = &["XS", "S", "M", "L"];
        const SIZES_S_XL: &[&str] = &["S", "M", "L", "XL"];

        let rows: [(&str, &str, u64, &str, &str, &str, &[&str]); 9] = [
            (
                "1",
                "Classic Black Blazer",
                19999,
                "Timeless elegance meets modern sophistication. Perfect for any occasion.",
                "Blazers",
                "photo-1591047139829-d91aecb6caea",
                SIZES_XS_XL,
            ),
            (
                "2",
                "Silk Evening Dress",
                34999,
                "Luxurious silk evening dress with flowing silhouette.",
                "Dresses",
                "photo-1595777457583-95e059d581b8",
                SIZES_XS_L,
            ),
            (
                "3",
                "Designer Denim Jacket",
                15999,
                "Contemporary denim with premium finish and perfect fit.",
                "Jackets",
                "photo-1551028719-00167b16eac5",
                SIZES_S_XL,
            ),
            (
                "4",
                "Cashmere Sweater",
                24999,
                "Ultra-soft cashmere for ultimate comfort and style.",
                "Sweaters",
                "photo-1434389677669-e08b4cac3105",
                SIZES_XS_XL,
            ),
            (
                "5",
                "Leather Biker Jacket",
                39999,
                "Premium leather with attitude. A wardrobe essential.",
                "Jackets",
                "photo-1521223890158-f9f7c3d5d504",
                SIZES_S_XL,
            ),
            (
                "6",
                "Floral Maxi Dress",
                17999,
                "Bohemian elegance with contemporary flair.",
                "Dresses",
                "photo-1572804013309-59a88b7e92f1",
                SIZES_XS_XL,
            ),
            (
                "7",
                "Tailored Wool Coat",
                44999,
                "Classic winter essential with impeccable tailoring.",
                "Coats",
                "photo-1539533018447-63fcce2678e3",
                SIZES_S_XL,
            ),
            (
                "8",
                "Satin Slip Dress",
                12999,
                "Effortless sophistication in luxe satin.",
                "Dresses",
                "photo-1566174053879-31528523f8ae",
                SIZES_XS_L,
            ),
            (
                "9",
                "Oversized Trench Coat",
                32999,
                "Modern take on a timeless classic.",
                "Coats",
                "photo-1591369822096-ffd140ec948f",
                SIZES_S_XL,
            ),
        ];

        let products = rows
            .into_iter()
            .map(
                |(id, title, cents, description, category, photo, sizes)| Product {
                    id: id.to_string(),
                    title: title.to_string(),
                    price: Money::from_cents(cents),
                    description: description.to_string(),
                    category: category.to_string(),
                    image: format!("https://images.unsplash.com/{photo}?w=800&q=80"),
                    sizes: sizes.iter().map(|s| s.to_string()).collect(),
                },
            )
            .collect();
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for p in &self.products {
            if !out.contains(&p.category.as_str()) {
                out.push(&p.category);
            }
        }
        out
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(move |p| p.category == category)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/catalog.rs"]
mod tests;
