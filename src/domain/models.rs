use crate::db::DbUser;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User shape returned to clients. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: Option<i16>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
}

impl From<DbUser> for PublicUser {
    fn from(user: DbUser) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
            age: user.age,
            gender: user.gender,
            occupation: user.occupation,
        }
    }
}
