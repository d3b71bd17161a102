// Bridge responses

use http::{HeaderValue, Response, StatusCode, header};

const CONVERSATION_LOST_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Session expired</title></head>
<body>
<h1>Your login session has expired</h1>
<p>Your session expired, please retry. Return to the application you were trying to access and sign in again.</p>
</body>
</html>
"#;

/// What the bridge decided for one inbound request.
#[derive(Debug)]
pub enum BridgeResponse {
    /// Send the browser to the CAS login URL.
    Redirect(String),
    /// The host resumed the IdP flow and produced this response.
    Resume(Response<String>),
    /// No conversation to resume; show the session-expired page.
    ConversationLost,
}

impl BridgeResponse {
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Self::Redirect(url) => Some(url),
            _ => None,
        }
    }

    pub fn is_conversation_lost(&self) -> bool {
        matches!(self, Self::ConversationLost)
    }

    pub fn into_http(self) -> Response<String> {
        match self {
            Self::Redirect(url) => match HeaderValue::from_str(&url) {
                Ok(location) => {
                    let mut response = Response::new(String::new());
                    *response.status_mut() = StatusCode::FOUND;
                    response.headers_mut().insert(header::LOCATION, location);
                    response
                }
                Err(_) => {
                    let mut response = Response::new(String::new());
                    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    response
                }
            },
            Self::Resume(response) => response,
            Self::ConversationLost => {
                let mut response = Response::new(CONVERSATION_LOST_PAGE.to_string());
                *response.status_mut() = StatusCode::NOT_FOUND;
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/html; charset=utf-8"),
                );
                response
            }
        }
    }
}
