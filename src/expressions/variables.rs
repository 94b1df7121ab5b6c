//! Expression Variables
//!
//! The closed set of roots (`item`, `order`) and fields an expression may reference.

use std::fmt;

use rust_decimal::Decimal;

use crate::expressions::{ExpressionError, value::Value};

/// Item attributes visible to expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemContext<'v> {
    /// Order line identifier.
    pub item_id: &'v str,

    /// SKU identifier.
    pub sku_id: &'v str,

    /// Product identifier.
    pub product_id: &'v str,

    /// Optional category identifier.
    pub category_id: Option<&'v str>,

    /// Regular unit price, in major units.
    pub price: Decimal,

    /// Optional sale unit price, in major units.
    pub sale_price: Option<Decimal>,

    /// Quantity ordered.
    pub quantity: u32,

    /// Line subtotal, in major units.
    pub subtotal: Decimal,
}

/// Order attributes visible to expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderContext<'v> {
    /// Order total, in major units.
    pub order_total: Decimal,

    /// Order subtotal, in major units.
    pub order_subtotal: Decimal,

    /// Optional customer identifier.
    pub customer_id: Option<&'v str>,
}

/// Roots bound for a single evaluation.
#[derive(Debug, Clone, Default)]
pub struct Variables<'v> {
    item: Option<ItemContext<'v>>,
    order: Option<OrderContext<'v>>,
}

impl<'v> Variables<'v> {
    /// Create an empty set of variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the `item` root.
    #[must_use]
    pub fn with_item(mut self, item: ItemContext<'v>) -> Self {
        self.item = Some(item);
        self
    }

    /// Bind the `order` root.
    #[must_use]
    pub fn with_order(mut self, order: OrderContext<'v>) -> Self {
        self.order = Some(order);
        self
    }

    pub(crate) fn resolve(&self, field: Field) -> Result<Value, ExpressionError> {
        match field {
            Field::Item(field) => self
                .item
                .as_ref()
                .map(|item| field.resolve(item))
                .ok_or(ExpressionError::UnboundRoot { root: Root::Item }),
            Field::Order(field) => self
                .order
                .as_ref()
                .map(|order| field.resolve(order))
                .ok_or(ExpressionError::UnboundRoot { root: Root::Order }),
        }
    }
}

/// A recognised expression root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    /// The order line under evaluation.
    Item,

    /// The order as a whole.
    Order,
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Item => "item",
            Self::Order => "order",
        })
    }
}

/// A fully resolved `root.Field` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Item(ItemField),
    Order(OrderField),
}

impl Field {
    /// Resolve a dotted path such as `item.CategoryID`.
    pub(crate) fn from_path(path: &str) -> Result<Self, ExpressionError> {
        let Some((root, name)) = path.split_once('.') else {
            return Err(ExpressionError::InvalidPath {
                path: path.to_string(),
            });
        };

        let field = match root {
            "item" => ItemField::from_name(name).map(Self::Item),
            "order" => OrderField::from_name(name).map(Self::Order),
            _ => {
                return Err(ExpressionError::UnknownRoot {
                    root: root.to_string(),
                });
            }
        };

        field.ok_or_else(|| ExpressionError::UnknownField {
            root: root.to_string(),
            field: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemField {
    ItemId,
    SkuId,
    CategoryId,
    Price,
    SalePrice,
    Quantity,
    Subtotal,
    ProductId,
}

impl ItemField {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ItemID" => Self::ItemId,
            "SKUID" => Self::SkuId,
            "CategoryID" => Self::CategoryId,
            "Price" => Self::Price,
            "SalePrice" => Self::SalePrice,
            "Quantity" => Self::Quantity,
            "Subtotal" => Self::Subtotal,
            "ProductID" => Self::ProductId,
            _ => return None,
        })
    }

    fn resolve(self, item: &ItemContext<'_>) -> Value {
        match self {
            Self::ItemId => Value::from(item.item_id),
            Self::SkuId => Value::from(item.sku_id),
            Self::CategoryId => Value::from(item.category_id),
            Self::Price => Value::from(item.price),
            Self::SalePrice => Value::from(item.sale_price),
            Self::Quantity => Value::from(Decimal::from(item.quantity)),
            Self::Subtotal => Value::from(item.subtotal),
            Self::ProductId => Value::from(item.product_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrderField {
    OrderTotal,
    OrderSubtotal,
    CustomerId,
}

impl OrderField {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "OrderTotal" => Self::OrderTotal,
            "OrderSubtotal" => Self::OrderSubtotal,
            "CustomerID" => Self::CustomerId,
            _ => return None,
        })
    }

    fn resolve(self, order: &OrderContext<'_>) -> Value {
        match self {
            Self::OrderTotal => Value::from(order.order_total),
            Self::OrderSubtotal => Value::from(order.order_subtotal),
            Self::CustomerId => Value::from(order.customer_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn shoe() -> ItemContext<'static> {
        ItemContext {
            item_id: "line-1",
            sku_id: "sku-1",
            product_id: "prod-1",
            category_id: Some("SHOES"),
            price: Decimal::new(2000, 2),
            sale_price: None,
            quantity: 3,
            subtotal: Decimal::new(6000, 2),
        }
    }

    #[test]
    fn resolves_item_fields() -> TestResult {
        let variables = Variables::new().with_item(shoe());

        let category = variables.resolve(Field::from_path("item.CategoryID")?)?;
        let quantity = variables.resolve(Field::from_path("item.Quantity")?)?;
        let sale_price = variables.resolve(Field::from_path("item.SalePrice")?)?;

        assert_eq!(category, Value::from("SHOES"));
        assert_eq!(quantity, Value::Number(Decimal::from(3)));
        assert_eq!(sale_price, Value::Missing);

        Ok(())
    }

    #[test]
    fn unknown_root_is_rejected() {
        let result = Field::from_path("cart.Total");

        assert!(matches!(result, Err(ExpressionError::UnknownRoot { root }) if root == "cart"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result = Field::from_path("item.Colour");

        assert!(matches!(
            result,
            Err(ExpressionError::UnknownField { root, field }) if root == "item" && field == "Colour"
        ));
    }

    #[test]
    fn path_without_field_is_rejected() {
        assert!(matches!(
            Field::from_path("item"),
            Err(ExpressionError::InvalidPath { .. })
        ));
    }

    #[test]
    fn unbound_root_is_an_error() -> TestResult {
        let variables = Variables::new().with_item(shoe());

        let result = variables.resolve(Field::from_path("order.OrderTotal")?);

        assert!(matches!(
            result,
            Err(ExpressionError::UnboundRoot { root: Root::Order })
        ));

        Ok(())
    }
}
