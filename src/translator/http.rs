// HTTP capture mapping
use crate::domain::{CustomData, HttpCapture, HttpRequestCapture, HttpResponseCapture, RequestInfo, ResponseInfo};
use url::form_urlencoded;

pub fn request_info(http: Option<&HttpCapture>) -> Option<RequestInfo> {
    http.and_then(|h| h.request.as_ref()).map(map_request)
}

pub fn response_info(http: Option<&HttpCapture>) -> Option<ResponseInfo> {
    http.and_then(|h| h.response.as_ref()).map(map_response)
}

fn map_request(request: &HttpRequestCapture) -> RequestInfo {
    let headers = request
        .headers
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key, value.as_str()))
        .collect();

    RequestInfo {
        http_method: request.method.clone(),
        url: request.uri.clone(),
        host_name: request.host.clone(),
        query_string: parse_query_string(&request.uri),
        headers,
        raw_data: text_content(request.body.as_bytes()),
    }
}

fn map_response(response: &HttpResponseCapture) -> ResponseInfo {
    ResponseInfo {
        status_code: response.status_code.unwrap_or(0),
        content: text_content(response.body.as_bytes()),
    }
}

/// Extracts the query string after the first `?` of a possibly relative URI.
///
/// Keys map to their first value; empty keys are dropped. Returns `None`
/// when the URI has no `?`.
pub fn parse_query_string(uri: &str) -> Option<CustomData> {
    let (_, query) = uri.split_once('?')?;

    Some(
        form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect(),
    )
}

/// UTF-8 body text, or an empty string if the bytes do not decode.
pub fn text_content(body: &[u8]) -> String {
    std::str::from_utf8(body).map(str::to_owned).unwrap_or_default()
}
