//! Restaurant routes: the caller's own listing (multipart create/update with an
//! image) and the public lookup/search endpoints.

use std::collections::BTreeMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use tracing::info;

use super::extract::ApiQuery;
use super::search::{search, SearchPage, SearchParams};
use super::{AppState, MAX_IMAGE_BYTES};
use crate::error::{AppError, AppResult};
use crate::identity::IdentityContext;
use crate::models::{new_object_id, MenuItem, Restaurant};
use crate::storage::StoreError;

const IMAGE_FIELD: &str = "imageFile";

fn restaurant_not_found() -> AppError { AppError::not_found("restaurant_not_found", "restaurant not found") }

fn bad_form(e: impl std::fmt::Display) -> AppError { AppError::user("invalid_form".to_string(), e.to_string()) }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Editable restaurant fields decoded from the web client's form encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantForm {
    pub restaurant_name: String,
    pub city: String,
    pub country: String,
    pub delivery_price: i64,
    pub estimated_delivery_time: i64,
    pub cuisines: Vec<String>,
    pub menu_items: Vec<MenuItem>,
}

#[derive(Default)]
struct PartialItem {
    id: Option<String>,
    name: Option<String>,
    price: Option<String>,
}

/// `cuisines[3]` -> 3
fn index_of(rest: &str) -> Option<usize> {
    rest.strip_suffix(']').and_then(|i| i.parse().ok())
}

fn parse_amount(field: &str, raw: &str) -> AppResult<i64> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::user("invalid_form".to_string(), format!("{} must be a whole number", field)))?;
    if value < 0 {
        return Err(AppError::user("invalid_form".to_string(), format!("{} must not be negative", field)));
    }
    Ok(value)
}

impl RestaurantForm {
    /// Decode text fields such as `restaurantName`, `cuisines[0]`, `menuItems[0][price]`.
    pub fn from_fields(fields: &[(String, String)]) -> AppResult<Self> {
        let mut scalars: BTreeMap<&str, &str> = BTreeMap::new();
        let mut cuisines: BTreeMap<usize, String> = BTreeMap::new();
        let mut items: BTreeMap<usize, PartialItem> = BTreeMap::new();

        for (name, value) in fields {
            if name == "cuisines" || name == "cuisines[]" {
                let next = cuisines.keys().next_back().map_or(0, |k| k + 1);
                cuisines.insert(next, value.clone());
            } else if let Some(rest) = name.strip_prefix("cuisines[") {
                let idx = index_of(rest).ok_or_else(|| bad_form(format!("bad field name {}", name)))?;
                cuisines.insert(idx, value.clone());
            } else if let Some(rest) = name.strip_prefix("menuItems[") {
                let (idx, key) = rest
                    .split_once("][")
                    .and_then(|(i, k)| Some((i.parse::<usize>().ok()?, k.strip_suffix(']')?)))
                    .ok_or_else(|| bad_form(format!("bad field name {}", name)))?;
                let item = items.entry(idx).or_default();
                match key {
                    "_id" => item.id = Some(value.clone()).filter(|v| !v.trim().is_empty()),
                    "name" => item.name = Some(value.clone()),
                    "price" => item.price = Some(value.clone()),
                    _ => {}
                }
            } else {
                scalars.insert(name.as_str(), value.as_str());
            }
        }

        let required = |key: &str| -> AppResult<String> {
            scalars
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::user("invalid_form".to_string(), format!("{} is required", key)))
        };

        let mut menu_items = Vec::with_capacity(items.len());
        for (idx, item) in items {
            let id = match item.id {
                Some(id) => id,
                None => new_object_id()?,
            };
            let name = item.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
                .ok_or_else(|| bad_form(format!("menuItems[{}][name] is required", idx)))?;
            let price = item.price.ok_or_else(|| bad_form(format!("menuItems[{}][price] is required", idx)))?;
            menu_items.push(MenuItem {
                id,
                name,
                price: parse_amount(&format!("menuItems[{}][price]", idx), &price)?,
            });
        }

        Ok(Self {
            restaurant_name: required("restaurantName")?,
            city: required("city")?,
            country: required("country")?,
            delivery_price: parse_amount("deliveryPrice", &required("deliveryPrice")?)?,
            estimated_delivery_time: parse_amount("estimatedDeliveryTime", &required("estimatedDeliveryTime")?)?,
            cuisines: cuisines.into_values().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect(),
            menu_items,
        })
    }

    fn apply_to(self, restaurant: &mut Restaurant) {
        restaurant.restaurant_name = self.restaurant_name;
        restaurant.city = self.city;
        restaurant.country = self.country;
        restaurant.delivery_price = self.delivery_price;
        restaurant.estimated_delivery_time = self.estimated_delivery_time;
        restaurant.cuisines = self.cuisines;
        restaurant.menu_items = self.menu_items;
    }
}

/// Drain the multipart body into text fields and the optional image.
async fn read_form(multipart: Result<Multipart, MultipartRejection>) -> AppResult<(RestaurantForm, Option<ImageUpload>)> {
    let mut multipart = multipart?;
    let mut fields = Vec::new();
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            let mime = field.content_type().unwrap_or("application/octet-stream").to_string();
            let bytes = field.bytes().await.map_err(bad_form)?;
            if bytes.len() > MAX_IMAGE_BYTES {
                return Err(AppError::user("image_too_large", "Image must be 5MB or smaller"));
            }
            if !bytes.is_empty() {
                image = Some(ImageUpload { bytes: bytes.to_vec(), mime });
            }
        } else {
            fields.push((name, field.text().await.map_err(bad_form)?));
        }
    }
    Ok((RestaurantForm::from_fields(&fields)?, image))
}

async fn upload_image(state: &AppState, image: ImageUpload) -> AppResult<String> {
    state
        .uploader
        .upload(image.bytes, &image.mime)
        .await
        .map_err(|e| AppError::internal("upload_failed".to_string(), e.to_string()))
}

pub async fn get_my_restaurant(State(state): State<AppState>, Extension(ctx): Extension<IdentityContext>) -> AppResult<Json<Restaurant>> {
    match state.store.find_restaurant_by_owner(&ctx.user_id) {
        Ok(Some(r)) => Ok(Json(r)),
        Ok(None) => Err(restaurant_not_found()),
        Err(e) => Err(AppError::from(e).masked("Error fetching restaurant")),
    }
}

fn already_exists() -> AppError { AppError::conflict("restaurant_exists", "User restaurant already exists") }

pub async fn create_my_restaurant(
    State(state): State<AppState>,
    Extension(ctx): Extension<IdentityContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<Restaurant>)> {
    const FAILED: &str = "Something went wrong";
    if state.store.find_restaurant_by_owner(&ctx.user_id).map_err(|e| AppError::from(e).masked(FAILED))?.is_some() {
        return Err(already_exists());
    }
    let (form, image) = read_form(multipart).await?;
    let image = image.ok_or_else(|| AppError::user("image_required", "imageFile is required"))?;
    let image_url = upload_image(&state, image).await.map_err(|e| e.masked(FAILED))?;

    let mut restaurant = Restaurant {
        id: new_object_id()?,
        user: ctx.user_id.clone(),
        restaurant_name: String::new(),
        city: String::new(),
        country: String::new(),
        delivery_price: 0,
        estimated_delivery_time: 0,
        cuisines: Vec::new(),
        menu_items: Vec::new(),
        image_url,
        last_updated: Utc::now(),
    };
    form.apply_to(&mut restaurant);
    match state.store.insert_restaurant(restaurant) {
        Ok(saved) => {
            info!(target: "forkful::store", user = %ctx.user_id, restaurant = %saved.id, "restaurant created");
            Ok((StatusCode::CREATED, Json(saved)))
        }
        Err(StoreError::DuplicateKey { .. }) => Err(already_exists()),
        Err(e) => Err(AppError::from(e).masked(FAILED)),
    }
}

pub async fn update_my_restaurant(
    State(state): State<AppState>,
    Extension(ctx): Extension<IdentityContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Restaurant>> {
    const FAILED: &str = "Something went wrong";
    let mut restaurant = state
        .store
        .find_restaurant_by_owner(&ctx.user_id)
        .map_err(|e| AppError::from(e).masked(FAILED))?
        .ok_or_else(restaurant_not_found)?;
    let (form, image) = read_form(multipart).await?;
    form.apply_to(&mut restaurant);
    if let Some(image) = image {
        restaurant.image_url = upload_image(&state, image).await.map_err(|e| e.masked(FAILED))?;
    }
    restaurant.last_updated = Utc::now();
    match state.store.update_restaurant(&restaurant) {
        Ok(saved) => Ok(Json(saved)),
        Err(StoreError::NotFound { .. }) => Err(restaurant_not_found()),
        Err(e) => Err(AppError::from(e).masked(FAILED)),
    }
}

pub async fn get_restaurant(State(state): State<AppState>, Path(restaurant_id): Path<String>) -> AppResult<Json<Restaurant>> {
    match state.store.find_restaurant(&restaurant_id) {
        Ok(Some(r)) => Ok(Json(r)),
        Ok(None) => Err(restaurant_not_found()),
        Err(e) => Err(AppError::from(e).masked("Something went wrong")),
    }
}

pub async fn search_restaurants(
    State(state): State<AppState>,
    Path(city): Path<String>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> AppResult<Json<SearchPage>> {
    let in_city = state.store.restaurants_in_city(&city).map_err(|e| AppError::from(e).masked("Something went wrong"))?;
    Ok(Json(search(in_city, &params)))
}
