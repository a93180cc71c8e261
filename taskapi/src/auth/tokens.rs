use axum::http::{HeaderMap, header::AUTHORIZATION};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::{access_token, user};

/// 64 hex characters of randomness.
#[must_use]
pub fn generate() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Lower-case hex SHA-256 of a token, as stored.
#[must_use]
pub fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// The token of an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Store a new token for `user_id` and return its plain text.
///
/// # Errors
///
/// Propagates the insert failure.
pub async fn issue<C: ConnectionTrait>(db: &C, user_id: i32, name: &str) -> Result<String, DbErr> {
    let token = generate();
    access_token::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_owned()),
        token_hash: Set(digest(&token)),
        last_used_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(token)
}

/// The owner of a plain token, without stamping it as used.
///
/// # Errors
///
/// Propagates the query failure; an unknown token is `Ok(None)`.
pub async fn owner<C: ConnectionTrait>(db: &C, token: &str) -> Result<Option<i32>, DbErr> {
    let found = access_token::Entity::find()
        .filter(access_token::Column::TokenHash.eq(digest(token)))
        .one(db)
        .await?;
    Ok(found.map(|access| access.user_id))
}

/// Look a plain token up and stamp it as used.
///
/// # Errors
///
/// Propagates query failures; an unknown token is `Ok(None)`.
pub async fn resolve<C: ConnectionTrait>(
    db: &C,
    token: &str,
) -> Result<Option<(access_token::Model, user::Model)>, DbErr> {
    let found = access_token::Entity::find()
        .filter(access_token::Column::TokenHash.eq(digest(token)))
        .find_also_related(user::Entity)
        .one(db)
        .await?;

    let Some((access, Some(owner))) = found else {
        return Ok(None);
    };

    let mut used: access_token::ActiveModel = access.into();
    used.last_used_at = Set(Some(Utc::now()));
    let access = used.update(db).await?;

    Ok(Some((access, owner)))
}

/// Delete every token of a user, returning how many went.
///
/// # Errors
///
/// Propagates the delete failure.
pub async fn revoke_all<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<u64, DbErr> {
    let result = access_token::Entity::delete_many()
        .filter(access_token::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
