//! リクエストからユーザー識別子を取り出す extractor
//!
//! 上流のレイヤーがリクエスト拡張に `UserId` を入れていればそれを優先する。

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};
use domain::UserId;
use shared::{find_cookie, resolve_user_id, USER_ID_HEADER, USER_ID_METADATA};
use std::convert::Infallible;

/// ブラウザ向け: 拡張 → `X-User-ID` ヘッダー → `X-User-ID` Cookie → 既定ユーザー
#[derive(Debug, Clone)]
pub struct WebUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for WebUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let explicit = parts.extensions.get::<UserId>();
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok());
        let cookie = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| find_cookie(raw, USER_ID_HEADER));

        Ok(Self(resolve_user_id(explicit, header, cookie.as_deref())))
    }
}

/// リモート呼び出し向け: 拡張 → `x-user-id` メタデータ → 既定ユーザー
#[derive(Debug, Clone)]
pub struct RpcUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for RpcUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let explicit = parts.extensions.get::<UserId>();
        let metadata = parts
            .headers
            .get(USER_ID_METADATA)
            .and_then(|v| v.to_str().ok());

        Ok(Self(resolve_user_id(explicit, metadata, None)))
    }
}
