use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Stored product, including the internal id.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub description: String,
    pub image: String,
    pub price: Decimal,
}

impl Product {
    pub fn view(&self) -> ProductView {
        ProductView {
            name: self.name.clone(),
            sku: self.sku.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            price: self.price,
        }
    }

    pub fn info(&self) -> ProductInfo {
        ProductInfo { id: self.id, sku: self.sku.clone(), name: self.name.clone() }
    }
}

impl From<models::product::Model> for Product {
    fn from(m: models::product::Model) -> Self {
        Self { id: m.id, name: m.name, sku: m.sku, description: m.description, image: m.image, price: m.price }
    }
}

/// Create/update body. Also the public product view: the internal id is never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    pub description: String,
    pub image: String,
    pub price: Decimal,
}

pub type ProductView = ProductInput;

impl ProductInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        models::product::validate(&self.name, &self.sku, &self.description, &self.image, self.price)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductInfo {
    pub id: i32,
    #[serde(rename = "SKU")]
    pub sku: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
}

impl From<models::category::Model> for CategoryView {
    fn from(m: models::category::Model) -> Self {
        Self { id: m.id, name: m.name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryInput {
    pub name: String,
}

/// Category listing, optionally reduced to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CategoryListing {
    Full(Vec<CategoryView>),
    NamesOnly(Vec<CategoryName>),
}

/// How a link request names its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductRef {
    Id(i32),
    Sku(String),
}

/// Body of a link request. `CategoryId` may come from the path instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkInput {
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub product_id: Option<i32>,
    #[serde(default, rename = "ProductSKU")]
    pub product_sku: Option<String>,
}

impl LinkInput {
    /// Exactly one of `ProductId` / `ProductSKU` must be present.
    pub fn product_ref(&self) -> Result<ProductRef, ServiceError> {
        match (self.product_id, self.product_sku.as_deref()) {
            (Some(id), None) => Ok(ProductRef::Id(id)),
            (None, Some(sku)) if !sku.trim().is_empty() => Ok(ProductRef::Sku(sku.to_string())),
            (Some(_), Some(_)) => Err(ServiceError::Validation("give either ProductId or ProductSKU, not both".into())),
            _ => Err(ServiceError::Validation("ProductId or ProductSKU is required".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductLink {
    pub category_id: i32,
    pub product_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductSummary {
    pub product_id: i32,
    pub product_name: String,
    pub product_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryWithProducts {
    pub category_id: i32,
    pub category_name: String,
    pub products: Vec<ProductSummary>,
}

/// A newly created resource and the path where it can be read back.
#[derive(Debug, Clone, PartialEq)]
pub struct Created<T> {
    pub value: T,
    pub location: String,
}

/// Name search URL for a product, the target of a create's `Location`.
pub fn product_location(name: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!("/Products?name={encoded}")
}

pub fn category_location(id: i32) -> String {
    format!("/Categories/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_wire_names() {
        let p = ProductInput {
            name: "Boots".into(),
            sku: "BT-1".into(),
            description: "d".into(),
            image: "i.png".into(),
            price: Decimal::new(1250, 2),
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["SKU"], "BT-1");
        assert_eq!(v["Name"], "Boots");
        assert_eq!(v["Price"].as_f64(), Some(12.5));
        assert!(v.get("Id").is_none());
    }

    #[test]
    fn link_input_product_ref() {
        let by_id: LinkInput = serde_json::from_str(r#"{"CategoryId":1,"ProductId":7}"#).unwrap();
        assert_eq!(by_id.product_ref().unwrap(), ProductRef::Id(7));
        let by_sku: LinkInput = serde_json::from_str(r#"{"CategoryId":1,"ProductSKU":"A1"}"#).unwrap();
        assert_eq!(by_sku.product_ref().unwrap(), ProductRef::Sku("A1".into()));
        let both: LinkInput = serde_json::from_str(r#"{"ProductId":7,"ProductSKU":"A1"}"#).unwrap();
        assert!(both.product_ref().is_err());
        assert!(LinkInput::default().product_ref().is_err());
    }

    #[test]
    fn locations_are_encoded() {
        assert_eq!(product_location("Red Boots"), "/Products?name=Red+Boots");
        assert_eq!(product_location("a&b"), "/Products?name=a%26b");
        assert_eq!(category_location(3), "/Categories/3");
    }

    #[test]
    fn names_only_listing_serializes_flat() {
        let l = CategoryListing::NamesOnly(vec![CategoryName { name: "Shoes".into() }]);
        assert_eq!(serde_json::to_string(&l).unwrap(), r#"[{"Name":"Shoes"}]"#);
    }
}
