use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

/// Identity of the caller, asserted by the upstream auth gateway.
///
/// Session and token mechanics live in the gateway; it forwards the
/// authenticated user id in the `x-user-id` header and this extractor only
/// parses it.
#[derive(Debug)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing x-user-id header".to_string(),
            ))?;

        let user_id = Uuid::parse_str(raw).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                "Invalid x-user-id header".to_string(),
            )
        })?;

        Ok(CurrentUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header("x-user-id", v);
        }
        let req = builder.body(()).expect("request builds");
        req.into_parts().0
    }

    #[tokio::test]
    async fn extracts_forwarded_user_id() {
        let user_id = Uuid::new_v4();
        let mut parts = parts_with_header(Some(&user_id.to_string()));
        let CurrentUser(got) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .expect("extraction succeeds");
        assert_eq!(got, user_id);
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let mut parts = parts_with_header(None);
        let (status, _) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_malformed_uuid() {
        let mut parts = parts_with_header(Some("not-a-uuid"));
        let (status, _) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
