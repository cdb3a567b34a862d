//src/nutrition.rs
use crate::error::NutritionError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// A food item as the provider describes it. Missing fields stay `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    pub food_name: String,
    pub brand_name: Option<String>,
    pub nix_item_id: Option<String>,
    pub serving_qty: Option<f64>,
    pub serving_unit: Option<String>,
    pub serving_weight_grams: Option<f64>,
    pub nf_calories: Option<f64>,
    pub nf_total_fat: Option<f64>,
    pub nf_saturated_fat: Option<f64>,
    pub nf_cholesterol: Option<f64>,
    pub nf_sodium: Option<f64>,
    pub nf_total_carbohydrate: Option<f64>,
    pub nf_dietary_fiber: Option<f64>,
    pub nf_sugars: Option<f64>,
    pub nf_protein: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FoodsResponse {
    foods: Vec<ProductRecord>,
}

#[derive(Debug, Serialize)]
struct NaturalQuery<'a> {
    query: &'a str,
    timezone: &'a str,
    locale: &'a str,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct InstantSearchResponse {
    branded: Vec<ProductRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ServingSize {
    pub quantity: f64,
    pub grams: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Nutrients {
    pub total_fat: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub cholesterol: Option<f64>,
    pub sodium: Option<f64>,
    pub total_carbs: Option<f64>,
    pub dietary_fiber: Option<f64>,
    pub sugars: Option<f64>,
    pub protein: Option<f64>,
}

/// Per-serving nutrition summary for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionFacts {
    pub product_name: String,
    pub brand_name: Option<String>,
    pub serving: ServingSize,
    pub serving_unit: Option<String>,
    pub calories_per_serving: f64,
    pub calories_per_100g: Option<f64>,
    pub nutrients: Nutrients,
}

/// Calories and serving size scaled to a number of servings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServingCalculation {
    pub servings: f64,
    pub total_calories: f64,
    pub original: ServingSize,
    pub requested: ServingSize,
}

impl From<ProductRecord> for NutritionFacts {
    fn from(food: ProductRecord) -> Self {
        let calories = food.nf_calories.unwrap_or(0.0);
        let calories_per_100g = food
            .serving_weight_grams
            .filter(|g| *g > 0.0)
            .map(|g| calories / g * 100.0);
        Self {
            product_name: food.food_name,
            brand_name: food.brand_name,
            serving: ServingSize {
                quantity: food.serving_qty.unwrap_or(1.0),
                grams: food.serving_weight_grams,
            },
            serving_unit: food.serving_unit,
            calories_per_serving: calories,
            calories_per_100g,
            nutrients: Nutrients {
                total_fat: food.nf_total_fat,
                saturated_fat: food.nf_saturated_fat,
                cholesterol: food.nf_cholesterol,
                sodium: food.nf_sodium,
                total_carbs: food.nf_total_carbohydrate,
                dietary_fiber: food.nf_dietary_fiber,
                sugars: food.nf_sugars,
                protein: food.nf_protein,
            },
        }
    }
}

impl NutritionFacts {
    pub fn for_servings(&self, servings: f64) -> ServingCalculation {
        ServingCalculation {
            servings,
            total_calories: self.calories_per_serving * servings,
            original: self.serving,
            requested: ServingSize {
                quantity: self.serving.quantity * servings,
                grams: self.serving.grams.map(|g| g * servings),
            },
        }
    }
}

/// Food lookup collaborator.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    /// `Ok(None)` when the barcode is unknown.
    async fn lookup_by_barcode(&self, upc: &str) -> Result<Option<ProductRecord>, NutritionError>;

    async fn search_by_text(&self, query: &str) -> Result<Vec<ProductRecord>, NutritionError>;

    /// Parses free text such as "2 eggs and a banana" into one record per food.
    async fn search_natural(&self, query: &str) -> Result<Vec<ProductRecord>, NutritionError>;
}

#[derive(Debug, Clone)]
pub struct NutritionixCredentials {
    pub app_id: String,
    pub app_key: String,
    pub remote_user_id: String,
}

pub struct NutritionixClient {
    http_client: Client,
    base_url: String,
    credentials: Option<NutritionixCredentials>,
}

impl NutritionixClient {
    /// # Errors
    /// Returns `NutritionError::Http` if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        credentials: Option<NutritionixCredentials>,
        timeout: Duration,
    ) -> Result<Self, NutritionError> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, NutritionError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(NutritionError::MissingCredentials)?;
        Ok(request
            .header("x-app-id", &creds.app_id)
            .header("x-app-key", &creds.app_key)
            .header("x-remote-user-id", &creds.remote_user_id))
    }
}

async fn check_status(response: Response) -> Result<Response, NutritionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error body".to_string());
    error!("Nutrition request failed with status {}: {}", status, body);
    Err(NutritionError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl NutritionLookup for NutritionixClient {
    async fn lookup_by_barcode(&self, upc: &str) -> Result<Option<ProductRecord>, NutritionError> {
        let url = format!("{}/search/item", self.base_url);
        debug!("GET {} upc={}", url, upc);
        let request = self.authorized(self.http_client.get(&url).query(&[("upc", upc)]))?;
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            info!("No product for barcode {}", upc);
            return Ok(None);
        }
        let foods: FoodsResponse = check_status(response).await?.json().await?;
        Ok(foods.foods.into_iter().next())
    }

    async fn search_by_text(&self, query: &str) -> Result<Vec<ProductRecord>, NutritionError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/search/instant", self.base_url);
        debug!("GET {} query={}", url, query);
        let request = self.authorized(self.http_client.get(&url).query(&[
            ("query", query),
            ("branded", "true"),
            ("common", "false"),
        ]))?;
        let response = request.send().await?;
        let results: InstantSearchResponse = check_status(response).await?.json().await?;
        info!("Food search '{}' returned {} items", query, results.branded.len());
        Ok(results.branded)
    }

    async fn search_natural(&self, query: &str) -> Result<Vec<ProductRecord>, NutritionError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/natural/nutrients", self.base_url);
        debug!("POST {} query={}", url, query);
        let body = NaturalQuery {
            query,
            timezone: "US/Eastern",
            locale: "en_US",
        };
        let request = self.authorized(self.http_client.post(&url).json(&body))?;
        let response = request.send().await?;
        let results: FoodsResponse = check_status(response).await?.json().await?;
        info!("Natural query '{}' matched {} foods", query, results.foods.len());
        Ok(results.foods)
    }
}
