use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// A purchasable item. Defined at process start, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub price: Decimal,
    pub description: String,
}

/// Static product table keyed by product name.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: BTreeMap<String, Product>,
}

impl Catalog {
    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.products.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Product)> {
        self.products.iter().map(|(name, p)| (name.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let mut products = BTreeMap::new();
        products.insert(
            "Mod".to_string(),
            Product {
                price: dec!(3.00),
                description: "Get Fly, Larger Anti-Raid Zone, Teleport and Mod Kits".to_string(),
            },
        );
        products.insert(
            "Mod+".to_string(),
            Product {
                price: dec!(7.00),
                description:
                    "Get Fly, XL Anti-Raid Zone, Teleport Players and Admin Kits w/Command Access"
                        .to_string(),
            },
        );
        products.insert(
            "Hardcore VIP 1 Month".to_string(),
            Product {
                price: dec!(3.00),
                description: "VIP Kit and Rank for 1 month".to_string(),
            },
        );
        products.insert(
            "Hardcore VIP Perma".to_string(),
            Product {
                price: dec!(30.00),
                description: "VIP Kit and Rank with a server Tag".to_string(),
            },
        );
        products.insert(
            "Ultra Server Rank Package".to_string(),
            Product {
                price: dec!(50.00),
                description: "Mod+ on Oxide Build-A-Base, Perma Hardcore VIP, Ultra Tag, 3 Custom Tag Roll Tokens, 2 Custom Tag Token".to_string(),
            },
        );
        Self { products }
    }
}

/// Format a money amount as a fixed-point string with two fractional
/// digits, the form the payment provider expects ("3.00").
pub fn format_amount(amount: Decimal) -> String {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount.to_string()
}
