use serde::{Deserialize, Serialize};

/// Product variant as reported by the recommendations service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    /// Purchasable as-is
    SimpleProductView,
    /// Needs options picked on the product page
    #[default]
    #[serde(other)]
    ComplexProductView,
}

/// Product handed to the footer slot for each rendered card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(default, alias = "__typename")]
    pub item_type: ItemType,
    pub sku: String,
    #[serde(default)]
    pub url_key: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ProductView {
    pub fn is_simple(&self) -> bool {
        self.item_type == ItemType::SimpleProductView
    }
}

/// Cart line submitted to the cart collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub sku: String,
    pub quantity: u32,
}

/// Labels under `Recommendations.ProductList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dictionary {
    pub add_to_cart: String,
    pub select_options: String,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self {
            add_to_cart: "Add to Cart".to_string(),
            select_options: "Select Options".to_string(),
        }
    }
}
