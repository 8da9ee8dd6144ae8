//! Typed inputs for every write operation. Each `validate` call either
//! yields a cleaned value or the first field that was rejected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::group::is_valid_slug;

const GROUP_TITLE_MAX: usize = 200;
const GROUP_DESCRIPTION_MAX: usize = 300;
const USERNAME_MAX: usize = 150;
const PASSWORD_MIN: usize = 8;

fn required_text(field: &'static str, raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "this field is required", raw));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostInput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

impl PostInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group_id: Uuid) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn validate(&self) -> Result<ValidPost, DomainError> {
        let text = required_text("text", &self.text)?;
        let image = match &self.image {
            Some(image) if image.trim().is_empty() => {
                return Err(DomainError::validation(
                    "image",
                    "image reference must not be blank",
                    image,
                ));
            }
            Some(image) => Some(image.trim().to_string()),
            None => None,
        };

        Ok(ValidPost {
            text,
            group_id: self.group_id,
            image,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub text: String,
}

impl CommentInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn validate(&self) -> Result<String, DomainError> {
        required_text("text", &self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInput {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

impl GroupInput {
    pub fn validate(&self) -> Result<GroupInput, DomainError> {
        let title = required_text("title", &self.title)?;
        if title.chars().count() > GROUP_TITLE_MAX {
            return Err(DomainError::validation(
                "title",
                format!("at most {} characters", GROUP_TITLE_MAX),
                &self.title,
            ));
        }

        let slug = self.slug.trim();
        if !is_valid_slug(slug) {
            return Err(DomainError::validation(
                "slug",
                "letters, digits, hyphens and underscores only",
                &self.slug,
            ));
        }

        let description = self.description.trim();
        if description.chars().count() > GROUP_DESCRIPTION_MAX {
            return Err(DomainError::validation(
                "description",
                format!("at most {} characters", GROUP_DESCRIPTION_MAX),
                &self.description,
            ));
        }

        Ok(GroupInput {
            title,
            slug: slug.to_string(),
            description: description.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), DomainError> {
        let username = self.username.trim();
        if username.is_empty()
            || username.chars().count() > USERNAME_MAX
            || !username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            return Err(DomainError::validation(
                "username",
                "up to 150 letters, digits and @/./+/-/_",
                &self.username,
            ));
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => {
                return Err(DomainError::validation(
                    "email",
                    "enter a valid email address",
                    &self.email,
                ));
            }
        }

        if self.password.chars().count() < PASSWORD_MIN {
            // never echo the password back
            return Err(DomainError::validation(
                "password",
                format!("at least {} characters", PASSWORD_MIN),
                serde_json::Value::Null,
            ));
        }

        Ok(())
    }
}
