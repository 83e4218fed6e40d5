//! Browser cookie helpers: the signed-in user marker and one-shot
//! flash messages.
//!
//! Values are form-urlencoded so arbitrary message text survives the
//! cookie grammar. Flash messages are cleared by the page render that
//! displays them.

use axum::http::header::{HeaderMap, HeaderValue, COOKIE};

/// Cookie carrying the signed-in browser user name.
pub const USER_COOKIE: &str = "portal_user";

/// Cookie carrying a one-shot flash message.
pub const FLASH_COOKIE: &str = "portal_flash";

/// Read and decode one cookie from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            let pair = pair.trim();
            if let Some((key, value)) = pair.split_once('=') {
                if key == name {
                    return decode(value);
                }
            }
        }
    }
    None
}

/// Signed-in user name, if the browser session cookie is set.
pub fn user_name(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, USER_COOKIE).filter(|name| !name.is_empty())
}

/// Pending flash message, if any.
pub fn flash_message(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, FLASH_COOKIE).filter(|message| !message.is_empty())
}

/// `Set-Cookie` value storing an encoded cookie.
pub fn set(name: &str, value: &str) -> HeaderValue {
    let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
    HeaderValue::from_str(&format!("{}={}; Path=/; HttpOnly", name, encoded))
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `Set-Cookie` value clearing a cookie.
pub fn clear(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{}=; Path=/; Max-Age=0", name))
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn decode(encoded: &str) -> Option<String> {
    let pair = format!("v={}", encoded);
    url::form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
}
