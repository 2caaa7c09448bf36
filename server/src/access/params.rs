//! Reading and rewriting the `sales_channel_id` request parameter.
//!
//! Storefront clients send the parameter as a scalar (`sales_channel_id=a`),
//! repeated (`sales_channel_id[]=a&sales_channel_id[]=b`), indexed
//! (`sales_channel_id[0]=a`), or as a JSON body field holding a string or an
//! array of strings.

use axum::http::Uri;
use serde_json::Value;

use super::filter::ChannelParamMode;
use super::models::ChannelId;

/// Name of the channel parameter in query strings and JSON bodies.
pub const CHANNEL_PARAM: &str = "sales_channel_id";

fn is_channel_key(key: &str) -> bool {
    key == CHANNEL_PARAM
        || key
            .strip_prefix(CHANNEL_PARAM)
            .and_then(|rest| rest.strip_prefix('['))
            .is_some_and(|rest| rest.ends_with(']'))
}

fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| serde_urlencoded::from_str(q).unwrap_or_default())
        .unwrap_or_default()
}

/// Channel ids named in the query string, in order, duplicates kept.
pub fn requested_from_query(query: Option<&str>) -> Vec<ChannelId> {
    query_pairs(query)
        .into_iter()
        .filter(|(key, value)| is_channel_key(key) && !value.is_empty())
        .map(|(_, value)| ChannelId(value))
        .collect()
}

/// Channel ids named in a JSON body.
///
/// Returns `None` when the body has no usable channel field, so the caller
/// can fall back to the query string.
pub fn requested_from_body(body: &Value) -> Option<Vec<ChannelId>> {
    match body.get(CHANNEL_PARAM)? {
        Value::String(id) => Some(vec![ChannelId(id.clone())]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ChannelId::from)
                .collect(),
        ),
        _ => None,
    }
}

/// Replace every channel parameter in `query` with `enforced`.
///
/// Other parameters keep their order. Array mode writes `sales_channel_id[]`
/// once per id; scalar mode writes a single `sales_channel_id`.
pub fn rewrite_query(query: Option<&str>, enforced: &[ChannelId], mode: ChannelParamMode) -> String {
    let mut pairs: Vec<(String, String)> = query_pairs(query)
        .into_iter()
        .filter(|(key, _)| !is_channel_key(key))
        .collect();

    let key = match mode {
        ChannelParamMode::Array => format!("{CHANNEL_PARAM}[]"),
        ChannelParamMode::Scalar => CHANNEL_PARAM.to_string(),
    };
    pairs.extend(enforced.iter().map(|id| (key.clone(), id.0.clone())));

    serde_urlencoded::to_string(&pairs).unwrap_or_default()
}

/// Rebuild `uri` with the channel parameter replaced by `enforced`.
pub fn rewrite_uri(
    uri: &Uri,
    enforced: &[ChannelId],
    mode: ChannelParamMode,
) -> Result<Uri, axum::http::Error> {
    let query = rewrite_query(uri.query(), enforced, mode);
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{query}", uri.path())
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse()?);
    Ok(Uri::from_parts(parts)?)
}

/// Overwrite the channel field of a JSON object body.
///
/// Returns `true` if the body carried the field and was changed.
pub fn rewrite_body(body: &mut Value, enforced: &[ChannelId], mode: ChannelParamMode) -> bool {
    let Some(field) = body.get_mut(CHANNEL_PARAM) else {
        return false;
    };

    *field = match mode {
        ChannelParamMode::Array => Value::Array(
            enforced
                .iter()
                .map(|id| Value::String(id.0.clone()))
                .collect(),
        ),
        ChannelParamMode::Scalar => enforced
            .first()
            .map_or(Value::Null, |id| Value::String(id.0.clone())),
    };
    true
}
