//! Product catalog service.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use billing_core::validation::{validate_product_name, validate_unit_price};
use billing_core::{Identity, Money, Page, PageRequest, Product};
use billing_db::{NewProduct, ProductUpdate};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub unit_price: Money,
}

/// Fields left as `None` are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub unit_price: Option<Money>,
}

pub struct ProductService {
    state: Arc<AppState>,
}

impl ProductService {
    pub fn new(state: Arc<AppState>) -> Self {
        ProductService { state }
    }

    pub async fn create(&self, caller: &Identity, request: CreateProductRequest) -> ApiResult<Product> {
        validate_product_name(&request.name)?;
        validate_unit_price(request.unit_price)?;

        let product = self
            .state
            .db
            .products()
            .insert(
                &NewProduct {
                    name: request.name,
                    unit_price: request.unit_price,
                },
                Some(&caller.user_id),
            )
            .await?;

        info!(prod_id = %product.prod_id, name = %product.name, "Product created");
        Ok(product)
    }

    pub async fn list(&self, page: PageRequest) -> ApiResult<Page<Product>> {
        page.validate()?;
        Ok(self.state.db.products().list(page).await?)
    }

    pub async fn get(&self, prod_id: &str) -> ApiResult<Product> {
        self.state
            .db
            .products()
            .get_by_id(prod_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
    }

    /// Changes the catalog entry. Receipts already issued keep their prices.
    pub async fn update(&self, prod_id: &str, request: UpdateProductRequest) -> ApiResult<Product> {
        if let Some(name) = &request.name {
            validate_product_name(name)?;
        }
        if let Some(price) = request.unit_price {
            validate_unit_price(price)?;
        }

        let product = self
            .state
            .db
            .products()
            .update(
                prod_id,
                &ProductUpdate {
                    name: request.name,
                    unit_price: request.unit_price,
                },
            )
            .await?;

        info!(prod_id = %prod_id, "Product updated");
        Ok(product)
    }

    pub async fn delete(&self, prod_id: &str) -> ApiResult<()> {
        self.state.db.products().soft_delete(prod_id).await?;
        info!(prod_id = %prod_id, "Product deleted");
        Ok(())
    }
}
