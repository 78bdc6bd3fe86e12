//! One-shot status messages carried across a POST/redirect.
//!
//! The message rides in a cookie set on the redirect. The next page renders
//! it once and expires the cookie.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use lotes_core::storage::RepositoryError;

use super::AppError;

const COOKIE_NAME: &str = "flash_message";

/// Expires the flash cookie.
const CLEAR_COOKIE: &str = "flash_message=; Path=/; SameSite=Lax; Max-Age=0";

/// A status message as serialized into the cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashMessage {
    /// "error", "success" or "info".
    #[serde(rename = "type")]
    pub message_type: String,
    /// Text shown to the user.
    pub message: String,
    /// Hidden by the page script after a few seconds.
    pub auto_dismiss: bool,
}

impl FlashMessage {
    /// A failure. Stays on screen until closed.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message_type: "error".to_string(),
            message: message.into(),
            auto_dismiss: false,
        }
    }

    /// A completed action. Fades out on its own.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message_type: "success".to_string(),
            message: message.into(),
            auto_dismiss: true,
        }
    }

    /// A refused action the user can correct. Stays on screen until closed.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message_type: "info".to_string(),
            message: message.into(),
            auto_dismiss: false,
        }
    }

    /// JSON form of the message, before URL encoding.
    pub fn to_cookie_value(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// `Set-Cookie` value. The cookie is site-wide, `SameSite=Lax`, and
    /// lapses after a minute if no page consumes it.
    pub fn to_set_cookie_header(&self) -> String {
        let value = self.to_cookie_value();
        let encoded = urlencoding::encode(&value);
        format!("{COOKIE_NAME}={encoded}; Path=/; SameSite=Lax; Max-Age=60")
    }

    /// Reads the flash cookie from request headers.
    ///
    /// A missing or malformed cookie yields `None`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == COOKIE_NAME)
            .and_then(|(_, value)| urlencoding::decode(value).ok())
            .and_then(|json| serde_json::from_str(&json).ok())
    }
}

/// 303 redirect to `url` that carries `flash` to the next page.
pub fn redirect_with_flash(url: &str, flash: FlashMessage) -> Response {
    (
        [(SET_COOKIE, flash.to_set_cookie_header())],
        Redirect::to(url),
    )
        .into_response()
}

/// Turns a refused operation into a message for the user.
///
/// Unknown ids and broken batch or edit rules are expected mistakes and
/// become info messages. Anything else is a real failure.
pub fn refusal(error: RepositoryError) -> Result<FlashMessage, AppError> {
    match error {
        RepositoryError::NotFound { entity_type, id } => {
            let message = match entity_type {
                "Lote" => format!("Lote {id} não encontrado."),
                "Animal" => format!("Registro {id} não encontrado."),
                "LoteItem" => "Item não encontrado neste lote.".to_string(),
                other => format!("{other} não encontrado: {id}"),
            };
            Ok(FlashMessage::info(message))
        }
        RepositoryError::Conflict(e) => Ok(FlashMessage::info(e.to_string())),
        RepositoryError::Animal(e) => Ok(FlashMessage::info(e.to_string())),
        RepositoryError::InvalidData(msg) => Ok(FlashMessage::info(msg)),
        other => Err(other.into()),
    }
}

/// The flash message sent with this request, if any.
#[derive(Debug, Clone, Default)]
pub struct Flash(pub Option<FlashMessage>);

impl Flash {
    /// Finishes a page response, expiring the cookie once it has been shown.
    pub fn consume(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.0.is_some() {
            response
                .headers_mut()
                .append(SET_COOKIE, HeaderValue::from_static(CLEAR_COOKIE));
        }
        response
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash(FlashMessage::from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_error_flash_message() {
        let flash = FlashMessage::error("Falha ao salvar");
        assert_eq!(flash.message_type, "error");
        assert_eq!(flash.message, "Falha ao salvar");
        assert!(!flash.auto_dismiss);
    }

    #[test]
    fn test_success_flash_message() {
        let flash = FlashMessage::success("Lote salvo");
        assert_eq!(flash.message_type, "success");
        assert!(flash.auto_dismiss);
    }

    #[test]
    fn test_to_cookie_value() {
        let flash = FlashMessage::info("Nenhum registro");
        let json = flash.to_cookie_value();
        assert!(json.contains("\"type\":\"info\""));
        assert!(json.contains("\"message\":\"Nenhum registro\""));
        assert!(json.contains("\"autoDismiss\":false"));
    }

    #[test]
    fn test_to_set_cookie_header() {
        let header = FlashMessage::error("Test").to_set_cookie_header();
        assert!(header.starts_with("flash_message="));
        assert!(header.contains("Path=/"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Max-Age=60"));
    }

    #[test]
    fn test_cookie_round_trips_through_headers() {
        let flash = FlashMessage::success("Lote 3 concluído; GTA 010101-E");
        let header = flash.to_set_cookie_header();
        let cookie = header.split(';').next().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {cookie}")).unwrap(),
        );

        assert_eq!(FlashMessage::from_headers(&headers), Some(flash));
    }

    #[test]
    fn test_malformed_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("flash_message=%7Bnope"));
        assert_eq!(FlashMessage::from_headers(&headers), None);
    }

    #[test]
    fn test_consume_clears_only_when_shown() {
        let shown = Flash(Some(FlashMessage::info("x"))).consume(StatusCode::OK);
        assert_eq!(
            shown.headers().get(SET_COOKIE).unwrap(),
            "flash_message=; Path=/; SameSite=Lax; Max-Age=0"
        );

        let none = Flash(None).consume(StatusCode::OK);
        assert!(none.headers().get(SET_COOKIE).is_none());
    }

    #[test]
    fn test_refusal_messages() {
        let flash = refusal(RepositoryError::NotFound {
            entity_type: "Lote",
            id: "4".to_string(),
        })
        .unwrap();
        assert_eq!(flash.message, "Lote 4 não encontrado.");
        assert_eq!(flash.message_type, "info");

        assert!(refusal(RepositoryError::QueryFailed("locked".to_string())).is_err());
    }

    #[test]
    fn test_redirect_with_flash_sets_cookie() {
        let response = redirect_with_flash("/lotes", FlashMessage::success("ok"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().get(SET_COOKIE).is_some());
    }
}
