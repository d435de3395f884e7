use crate::config::Config;
use crate::error::AppError;
use crate::push::Viewer;
use crate::{auth::jwt::verify_token, model::role::Role, models::TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Decodes a bearer access token into the caller.
    pub fn from_bearer(header: Option<&str>, secret: &str) -> Result<Self, AppError> {
        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

        let claims = verify_token(token, secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::Unauthorized("Access token required".into()));
        }

        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::Unauthorized("Invalid role".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Protected scopes already decoded the token in the middleware.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(AppError::Internal("Config missing".into()).into()));
        };

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        ready(AuthUser::from_bearer(header, &config.jwt_secret).map_err(Into::into))
    }
}

impl AuthUser {
    pub fn require_hr_or_ceo(&self) -> Result<(), AppError> {
        if self.role.is_manager() {
            Ok(())
        } else {
            Err(AppError::forbidden("HR/CEO only"))
        }
    }

    /// Employees and interns only ever see their own data.
    pub fn is_employee(&self) -> bool {
        matches!(self.role, Role::Employee | Role::Intern)
    }

    /// The user whose data a request targets: managers may name anyone,
    /// everybody else is pinned to themselves.
    pub fn scoped_user(&self, requested: Option<u64>) -> Option<u64> {
        if self.is_employee() {
            Some(self.user_id)
        } else {
            requested
        }
    }

    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};
    use actix_web::test::TestRequest;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "SERVER_ADDR" => Some("127.0.0.1:0".into()),
            "DATABASE_URL" => Some("mysql://localhost/test".into()),
            "JWT_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .unwrap()
    }

    #[actix_web::test]
    async fn extracts_user_from_access_token() {
        let token = generate_access_token(5, "hr@x.io".into(), Role::Hr.id(), "test-secret", 60).unwrap();
        let req = TestRequest::default()
            .app_data(Data::new(config()))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.user_id, 5);
        assert_eq!(user.role, Role::Hr);
        assert!(user.require_hr_or_ceo().is_ok());
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(Data::new(config()))
            .to_http_request();

        let err = AuthUser::extract(&req).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            actix_web::http::StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn refresh_token_cannot_authenticate_requests() {
        let (token, _) = generate_refresh_token(5, "e@x.io".into(), 3, "test-secret", 60).unwrap();
        let header = format!("Bearer {token}");
        assert!(AuthUser::from_bearer(Some(&header), "test-secret").is_err());
    }

    #[test]
    fn employees_are_pinned_to_themselves() {
        let employee = AuthUser {
            user_id: 3,
            email: "e@x.io".into(),
            role: Role::Intern,
        };
        assert_eq!(employee.scoped_user(Some(9)), Some(3));
        assert!(employee.require_hr_or_ceo().is_err());

        let ceo = AuthUser {
            user_id: 1,
            email: "c@x.io".into(),
            role: Role::Ceo,
        };
        assert_eq!(ceo.scoped_user(Some(9)), Some(9));
        assert_eq!(ceo.scoped_user(None), None);
    }
}
