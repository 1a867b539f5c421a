use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Client, ClientError, ClientResult};

/// Making requests to the backend.
impl Client {
    /// Make a `GET` request to `path` (relative to the base URL) and
    /// deserialize the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend answers with a
    /// non-success status, or the response is not valid.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        parameters: &[(&str, String)],
    ) -> ClientResult<T> {
        let request = self.client.get(self.url(path)).query(parameters);
        Self::parse_response(&self.send(request).await?)
    }

    /// Like [`Self::get`], but a `404` is reported as `Ok(None)`.
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> ClientResult<Option<T>> {
        match self.send(self.client.get(self.url(path))).await {
            Ok(bytes) => Ok(Some(Self::parse_response(&bytes)?)),
            Err(ClientError::HttpStatus { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Make a bodiless `POST` request.
    pub(crate) async fn post<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.client.post(self.url(path));
        Self::parse_response(&self.send(request).await?)
    }

    /// Make a `POST` request with a JSON body.
    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self
            .client
            .post(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?);
        Self::parse_response(&self.send(request).await?)
    }

    /// Make a `DELETE` request, discarding the acknowledgement body.
    pub(crate) async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(self.client.delete(self.url(path))).await?;
        Ok(())
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ClientResult<Vec<u8>> {
        let response = request.send().await?;
        let status = response.status();
        let bytes: Vec<u8> = response.bytes().await?.into();
        if !status.is_success() {
            let message = Self::parse_error_message(&bytes);
            tracing::debug!("backend returned {status}: {message:?}");
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }
        Ok(bytes)
    }

    fn parse_response<T: DeserializeOwned>(bytes: &[u8]) -> ClientResult<T> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Extract the `error` field the backend puts in failure bodies.
    fn parse_error_message(bytes: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(bytes)
            .ok()
            .and_then(|body| body.error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// The body of a failed request.
struct ErrorBody {
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_paths() {
        let client = Client::new("http://localhost:5000/api").unwrap();
        assert_eq!(
            client.url("/player/status"),
            "http://localhost:5000/api/player/status"
        );
        assert_eq!(
            client.url("library/albums"),
            "http://localhost:5000/api/library/albums"
        );
    }

    #[test]
    fn test_parse_error_message() {
        assert_eq!(
            Client::parse_error_message(br#"{"error": "Invalid directory path"}"#),
            Some("Invalid directory path".to_string())
        );
        assert_eq!(Client::parse_error_message(b"<html>oops</html>"), None);
        assert_eq!(Client::parse_error_message(br#"{"message": "ok"}"#), None);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_transport_error() {
        // Nothing listens on port 9 on loopback; the connection is refused.
        let client = Client::new("http://127.0.0.1:9/api").unwrap();
        let error = client.get_status().await.unwrap_err();
        assert!(matches!(error, ClientError::ReqwestError(_)));
        assert!(error.is_transport());
    }
}
