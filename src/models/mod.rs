pub mod context;
pub mod filters;
pub mod product;

pub use context::{
    CartItemContext, CartItemProduct, CategoryContext, HistoryEntry, PageContext,
    PageTypeContext, ProductContext, ShoppingCartContext,
};
pub use filters::{BlockConfig, Filters};
pub use product::{CartLine, Dictionary, ItemType, ProductView};
