use buddycart_common::{Grams, Rupee};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//--------------------------------------       Product        --------------------------------------------------------
/// A catalog entry from `GET /products/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Rupee,
    pub weight_grams: Grams,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      NewCartItem     --------------------------------------------------------
/// The payload for `POST /cart/items` and `POST /clubbed-cart/{id}/items`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
    pub product_id: String,
    pub quantity: u32,
}

//--------------------------------------       CartLine       --------------------------------------------------------
/// A single line of the active cart. `total_price` is the server's snapshot for the line; clients display it rather
/// than recomputing `price * quantity` locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub total_price: Rupee,
    pub product: Product,
}

//--------------------------------------         Cart         --------------------------------------------------------
/// The active cart snapshot from `GET /cart/`. Always replaced wholesale on refresh; lines are never merged
/// client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cart_items: Vec<CartLine>,
}

impl Cart {
    /// The sum of the server-computed line totals.
    pub fn total(&self) -> Rupee {
        self.cart_items.iter().map(|line| line.total_price).sum()
    }

    /// The combined weight of everything in the cart.
    pub fn weight(&self) -> Grams {
        self.cart_items.iter().map(|line| line.product.weight_grams * i64::from(line.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cart_items.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.cart_items.iter().map(|line| line.quantity).sum()
    }
}

//--------------------------------------      CartCleared     --------------------------------------------------------
/// The acknowledgement from `DELETE /cart/clear`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCleared {
    pub success: bool,
    pub message: String,
    pub items_removed: i64,
}
