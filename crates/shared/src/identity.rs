//! リクエストごとのユーザー識別子の解決
//!
//! 優先順位: 明示的に渡された値 → ヘッダー → Cookie → 既定ユーザー。
//! 認証は行わず、クライアントが送ってきた値をそのまま信頼する。

use domain::UserId;
use std::borrow::Cow;

/// ブラウザ向け HTTP で使うヘッダー名（Cookie 名も同じ）
pub const USER_ID_HEADER: &str = "X-User-ID";

/// リモート呼び出しのメタデータキー
pub const USER_ID_METADATA: &str = "x-user-id";

/// 候補を優先順に評価し、最初に見つかった空でない値を返す
pub fn resolve_user_id(
    explicit: Option<&UserId>,
    header: Option<&str>,
    cookie: Option<&str>,
) -> UserId {
    if let Some(user) = explicit.filter(|u| !u.as_str().trim().is_empty()) {
        return user.clone();
    }
    header
        .and_then(UserId::parse)
        .or_else(|| cookie.and_then(UserId::parse))
        .unwrap_or_default()
}

/// `Cookie` ヘッダーの値から指定名の Cookie を取り出す
///
/// ブラウザ側は `encodeURIComponent` で書き込むため、パーセントデコードして返す。
/// デコード結果が UTF-8 でなければ生の値をそのまま使う。
pub fn find_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<Cow<'a, str>> {
    let raw = cookie_header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"'))?;
    Some(urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw)))
}
