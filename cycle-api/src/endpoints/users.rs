use super::UserId;
use crate::Endpoint;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{EmptyResponse, Method, Request, RequestData};

// Common

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

// Requests

#[derive(Default, Debug, Clone, Serialize)]
pub struct GetMe;

impl Request for GetMe {
    type Data = ();
    type Response = User;

    fn endpoint(&self) -> Cow<'_, str> {
        "/users/me".into()
    }
}

impl Endpoint for GetMe {}

#[derive(Clone, Serialize)]
pub struct ChangePassword {
    current_password: String,
    new_password: String,
}

impl ChangePassword {
    pub fn new(current_password: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            current_password: current_password.into(),
            new_password: new_password.into(),
        }
    }
}

impl Request for ChangePassword {
    type Data = Self;
    type Response = EmptyResponse;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/users/me/change-password".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

impl Endpoint for ChangePassword {}

#[derive(Default, Debug, Clone, Serialize)]
pub struct DeleteMe;

impl Request for DeleteMe {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        "/users/me".into()
    }
}

impl Endpoint for DeleteMe {}
