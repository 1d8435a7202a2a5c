//! Product catalog lookups.
//!
//! The storefront's catalog lives in a relational store elsewhere; this is the
//! read-only interface the HTTP layer depends on, plus a fixed in-memory
//! implementation so the protected and public routes have something to serve.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64, // minor units
    pub picture_url: String,
    pub product_brand: String,
    pub product_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductType {
    pub id: i64,
    pub name: String,
}

pub trait Catalog: Send + Sync {
    fn products(&self) -> Vec<Product>;
    fn product(&self, id: i64) -> Option<Product>;
    fn brands(&self) -> Vec<Brand>;
    fn types(&self) -> Vec<ProductType>;
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
    brands: Vec<Brand>,
    types: Vec<ProductType>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>, brands: Vec<Brand>, types: Vec<ProductType>) -> Self {
        Self {
            products,
            brands,
            types,
        }
    }

    /// Small fixed catalog used by the binary
    pub fn seeded() -> Self {
        let brands = vec![
            Brand { id: 1, name: "Angular".to_string() },
            Brand { id: 2, name: "NetCore".to_string() },
            Brand { id: 3, name: "React".to_string() },
        ];
        let types = vec![
            ProductType { id: 1, name: "Boards".to_string() },
            ProductType { id: 2, name: "Hats".to_string() },
        ];
        let product = |id: i64, name: &str, price: i64, brand: &Brand, kind: &ProductType| Product {
            id,
            name: name.to_string(),
            description: format!("{} by {}", name, brand.name),
            price,
            picture_url: format!("images/products/{}.png", name.to_lowercase().replace(' ', "-")),
            product_brand: brand.name.clone(),
            product_type: kind.name.clone(),
        };
        let products = vec![
            product(1, "Angular Speedster Board", 20000, &brands[0], &types[0]),
            product(2, "Core Board Speed Rush", 18000, &brands[1], &types[0]),
            product(3, "React Board Super Whizzy", 25000, &brands[2], &types[0]),
            product(4, "Green Angular Hat", 1500, &brands[0], &types[1]),
            product(5, "Purple React Woolen Hat", 1800, &brands[2], &types[1]),
        ];

        Self::new(products, brands, types)
    }
}

impl Catalog for InMemoryCatalog {
    fn products(&self) -> Vec<Product> {
        self.products.clone()
    }

    fn product(&self, id: i64) -> Option<Product> {
        self.products.iter().find(|p| p.id == id).cloned()
    }

    fn brands(&self) -> Vec<Brand> {
        self.brands.clone()
    }

    fn types(&self) -> Vec<ProductType> {
        self.types.clone()
    }
}
