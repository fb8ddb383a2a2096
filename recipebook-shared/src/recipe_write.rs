/// Validated recipe create / update / delete
///
/// A write goes through three stages:
///
/// 1. [`check_draft`] validates the payload shape (required fields, non-empty
///    and duplicate-free tag/ingredient lists, amount bounds). Pure.
/// 2. [`check_references`] verifies every tag and ingredient ID resolves,
///    given the sets of IDs found in the database. Pure.
/// 3. The recipe row, its tag set and its ingredient-amount set are written
///    inside ONE transaction. Associations are replaced wholesale
///    (delete-then-insert); any failure rolls the whole write back, so a
///    recipe is never visible with a partial ingredient set.
///
/// Image bytes are stored before the transaction starts. If the transaction
/// fails the new file is removed again; after a successful update the
/// replaced file is removed.

use serde::Deserialize;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::media::{decode_data_url, recipe_image_name, DecodedImage, MediaError, MediaStore};
use crate::models::ingredient::Ingredient;
use crate::models::recipe::{IngredientLine, NewRecipe, Recipe, RecipeChanges};
use crate::models::tag::Tag;

/// Upper bound for amounts and cooking time (the range of a SMALLINT)
pub const MAX_SMALL_VALUE: i64 = 32_767;

/// `{id, amount}` pair as submitted by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmountInput {
    pub id: i64,
    pub amount: i64,
}

/// Raw recipe payload
///
/// Every field is optional so that one type serves both create (where the
/// scalars and the image are required) and update (where absent scalars
/// keep their stored values).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeDraft {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,

    /// Base64 data URL
    pub image: Option<String>,

    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<IngredientAmountInput>>,
}

/// Whether a draft creates a new recipe or updates an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// A draft that passed shape validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedDraft {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientLine>,
}

fn non_blank(value: Option<&String>) -> Option<&String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_ingredients(input: Option<&Vec<IngredientAmountInput>>) -> ServiceResult<Vec<IngredientLine>> {
    let input = input
        .filter(|items| !items.is_empty())
        .ok_or_else(|| ServiceError::validation("ingredients", "At least one ingredient is required"))?;

    let mut seen = HashSet::with_capacity(input.len());
    let mut lines = Vec::with_capacity(input.len());

    for item in input {
        if !seen.insert(item.id) {
            return Err(ServiceError::validation("ingredients", "Ingredients must be unique"));
        }

        if item.amount <= 0 {
            return Err(ServiceError::validation(
                "ingredients",
                "Ingredient amount must be greater than 0",
            ));
        }

        let amount = i32::try_from(item.amount)
            .ok()
            .filter(|amount| i64::from(*amount) <= MAX_SMALL_VALUE)
            .ok_or_else(|| {
                ServiceError::validation(
                    "ingredients",
                    format!("Ingredient amount must be at most {}", MAX_SMALL_VALUE),
                )
            })?;

        lines.push(IngredientLine {
            ingredient_id: item.id,
            amount,
        });
    }

    Ok(lines)
}

fn check_tags(input: Option<&Vec<i64>>) -> ServiceResult<Vec<i64>> {
    let input = input
        .filter(|items| !items.is_empty())
        .ok_or_else(|| ServiceError::validation("tags", "At least one tag is required"))?;

    let mut seen = HashSet::with_capacity(input.len());
    for id in input {
        if !seen.insert(*id) {
            return Err(ServiceError::validation("tags", "Tags must be unique"));
        }
    }

    Ok(input.clone())
}

fn check_cooking_time(value: Option<i64>) -> ServiceResult<Option<i32>> {
    value
        .map(|minutes| {
            i32::try_from(minutes)
                .ok()
                .filter(|m| *m >= 1 && i64::from(*m) <= MAX_SMALL_VALUE)
                .ok_or_else(|| {
                    ServiceError::validation(
                        "cooking_time",
                        format!("Cooking time must be between 1 and {}", MAX_SMALL_VALUE),
                    )
                })
        })
        .transpose()
}

/// Validates the shape of a draft
///
/// Checks run in a fixed order and the first failure is reported: image
/// (create only), ingredients, tags, then the scalar fields.
///
/// # Errors
///
/// Returns a field-keyed `ServiceError::Validation`.
pub fn check_draft(draft: &RecipeDraft, mode: WriteMode) -> ServiceResult<CheckedDraft> {
    let image = non_blank(draft.image.as_ref()).cloned();
    if mode == WriteMode::Create && image.is_none() {
        return Err(ServiceError::validation("image", "Recipe must have an image"));
    }

    let ingredients = check_ingredients(draft.ingredients.as_ref())?;
    let tags = check_tags(draft.tags.as_ref())?;

    if draft.name.is_some() && non_blank(draft.name.as_ref()).is_none() {
        return Err(ServiceError::validation("name", "This field may not be blank"));
    }
    if draft.text.is_some() && non_blank(draft.text.as_ref()).is_none() {
        return Err(ServiceError::validation("text", "This field may not be blank"));
    }
    let cooking_time = check_cooking_time(draft.cooking_time)?;

    if mode == WriteMode::Create {
        for (field, present) in [
            ("name", draft.name.is_some()),
            ("text", draft.text.is_some()),
            ("cooking_time", cooking_time.is_some()),
        ] {
            if !present {
                return Err(ServiceError::validation(field, "This field is required"));
            }
        }
    }

    Ok(CheckedDraft {
        name: draft.name.clone(),
        text: draft.text.clone(),
        cooking_time,
        image,
        tags,
        ingredients,
    })
}

/// Verifies every referenced tag and ingredient exists
///
/// # Errors
///
/// Returns a validation error naming the first unresolved ID.
pub fn check_references(
    draft: &CheckedDraft,
    known_tags: &HashSet<i64>,
    known_ingredients: &HashSet<i64>,
) -> ServiceResult<()> {
    if let Some(line) = draft
        .ingredients
        .iter()
        .find(|line| !known_ingredients.contains(&line.ingredient_id))
    {
        return Err(ServiceError::validation(
            "ingredients",
            format!("Ingredient with id {} does not exist", line.ingredient_id),
        ));
    }

    if let Some(id) = draft.tags.iter().find(|id| !known_tags.contains(id)) {
        return Err(ServiceError::validation(
            "tags",
            format!("Tag with id {} does not exist", id),
        ));
    }

    Ok(())
}

fn decode_image(payload: &str) -> ServiceResult<DecodedImage> {
    decode_data_url(payload).map_err(|e| match e {
        MediaError::InvalidPayload(msg) => ServiceError::validation("image", msg),
        other => ServiceError::Media(other),
    })
}

async fn verify_references(conn: &mut PgConnection, draft: &CheckedDraft) -> ServiceResult<()> {
    let ingredient_ids: Vec<i64> = draft.ingredients.iter().map(|line| line.ingredient_id).collect();

    let known_tags = Tag::existing_ids(&mut *conn, &draft.tags).await?;
    let known_ingredients = Ingredient::existing_ids(&mut *conn, &ingredient_ids).await?;

    check_references(draft, &known_tags, &known_ingredients)
}

async fn discard(store: &dyn MediaStore, name: &str) {
    if let Err(e) = store.delete(name).await {
        warn!(media = name, error = %e, "Failed to delete media file");
    }
}

async fn write_associations(
    conn: &mut PgConnection,
    recipe_id: i64,
    draft: &CheckedDraft,
) -> Result<(), sqlx::Error> {
    Recipe::replace_tags(&mut *conn, recipe_id, &draft.tags).await?;
    Recipe::replace_ingredients(&mut *conn, recipe_id, &draft.ingredients).await
}

async fn insert_in_tx(
    mut tx: Transaction<'_, Postgres>,
    author_id: i64,
    draft: &CheckedDraft,
    image: String,
) -> Result<Recipe, sqlx::Error> {
    let recipe = Recipe::insert(
        &mut tx,
        NewRecipe {
            author_id,
            name: draft.name.clone().unwrap_or_default(),
            text: draft.text.clone().unwrap_or_default(),
            image,
            cooking_time: draft.cooking_time.unwrap_or_default(),
        },
    )
    .await?;

    write_associations(&mut tx, recipe.id, draft).await?;
    tx.commit().await?;

    Ok(recipe)
}

async fn update_in_tx(
    mut tx: Transaction<'_, Postgres>,
    recipe_id: i64,
    draft: &CheckedDraft,
    image: Option<String>,
) -> Result<Recipe, sqlx::Error> {
    let recipe = Recipe::apply_changes(
        &mut tx,
        recipe_id,
        RecipeChanges {
            name: draft.name.clone(),
            text: draft.text.clone(),
            image,
            cooking_time: draft.cooking_time,
        },
    )
    .await?;

    write_associations(&mut tx, recipe_id, draft).await?;
    tx.commit().await?;

    Ok(recipe)
}

/// Creates a recipe authored by `author_id`
///
/// # Errors
///
/// - `Validation` for any payload or reference problem
/// - `Database` / `Media` on infrastructure failures
pub async fn create_recipe(
    pool: &PgPool,
    store: &dyn MediaStore,
    author_id: i64,
    draft: &RecipeDraft,
) -> ServiceResult<Recipe> {
    let checked = check_draft(draft, WriteMode::Create)?;
    let image = decode_image(checked.image.as_deref().unwrap_or_default())?;

    let mut tx = pool.begin().await?;
    verify_references(&mut tx, &checked).await?;

    let image_name = recipe_image_name(image.extension);
    store.save(&image_name, &image.bytes).await?;

    match insert_in_tx(tx, author_id, &checked, image_name.clone()).await {
        Ok(recipe) => {
            info!(recipe_id = recipe.id, author_id, "Recipe created");
            Ok(recipe)
        }
        Err(e) => {
            discard(store, &image_name).await;
            Err(e.into())
        }
    }
}

/// Updates a recipe on behalf of `user_id`
///
/// Tags and ingredients are required and replace the stored sets; absent
/// scalar fields and an absent image keep their stored values.
///
/// # Errors
///
/// - `NotFound` if the recipe does not exist
/// - `Forbidden` if `user_id` is not the author
/// - `Validation` for any payload or reference problem
pub async fn update_recipe(
    pool: &PgPool,
    store: &dyn MediaStore,
    user_id: i64,
    recipe_id: i64,
    draft: &RecipeDraft,
) -> ServiceResult<Recipe> {
    let mut tx = pool.begin().await?;

    let existing = Recipe::find_for_update(&mut tx, recipe_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Recipe not found".to_string()))?;

    if existing.author_id != user_id {
        return Err(ServiceError::Forbidden(
            "Only the author can modify this recipe".to_string(),
        ));
    }

    let checked = check_draft(draft, WriteMode::Update)?;
    let image = checked.image.as_deref().map(decode_image).transpose()?;
    verify_references(&mut tx, &checked).await?;

    let new_image = match image {
        Some(image) => {
            let name = recipe_image_name(image.extension);
            store.save(&name, &image.bytes).await?;
            Some(name)
        }
        None => None,
    };

    match update_in_tx(tx, recipe_id, &checked, new_image.clone()).await {
        Ok(recipe) => {
            if new_image.is_some() {
                discard(store, &existing.image).await;
            }
            info!(recipe_id, user_id, "Recipe updated");
            Ok(recipe)
        }
        Err(e) => {
            if let Some(name) = &new_image {
                discard(store, name).await;
            }
            Err(e.into())
        }
    }
}

/// Deletes a recipe on behalf of `user_id`
///
/// # Errors
///
/// - `NotFound` if the recipe does not exist
/// - `Forbidden` if `user_id` is not the author
pub async fn delete_recipe(
    pool: &PgPool,
    store: &dyn MediaStore,
    user_id: i64,
    recipe_id: i64,
) -> ServiceResult<()> {
    let recipe = Recipe::find_by_id(pool, recipe_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Recipe not found".to_string()))?;

    if recipe.author_id != user_id {
        return Err(ServiceError::Forbidden(
            "Only the author can delete this recipe".to_string(),
        ));
    }

    Recipe::delete(pool, recipe_id).await?;
    discard(store, &recipe.image).await;

    info!(recipe_id, user_id, "Recipe deleted");
    Ok(())
}
