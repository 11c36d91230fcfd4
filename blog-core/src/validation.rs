//! Form validation shared by the server and the client.
//!
//! Every validator returns a [`ValidationErrors`] map from field name to a
//! single message. A field that is absent from the map is valid. Lengths are
//! counted in `char`s.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{CategoryRequest, ContactRequest, PostRequest, SignupRequest};

pub const TITLE_MAX: usize = 50;
pub const CONTENT_MAX: usize = 1000;
pub const CATEGORY_NAME_MAX: usize = 50;
pub const CONTACT_NAME_MAX: usize = 30;
pub const CONTACT_MESSAGE_MAX: usize = 500;
pub const PASSWORD_MIN: usize = 8;

pub mod field {
    pub const NAME: &str = "name";
    pub const TITLE: &str = "title";
    pub const CONTENT: &str = "content";
    pub const THUMBNAIL_URL: &str = "thumbnailUrl";
    pub const THUMBNAIL_IMAGE_KEY: &str = "thumbnailImageKey";
    pub const CATEGORIES: &str = "categories";
    pub const EMAIL: &str = "email";
    pub const MESSAGE: &str = "message";
    pub const PASSWORD: &str = "password";
}

pub mod messages {
    pub const CATEGORY_NAME_REQUIRED: &str = "Category name is required.";
    pub const CATEGORY_NAME_TOO_LONG: &str = "Category name must be 50 characters or fewer.";
    pub const TITLE_REQUIRED: &str = "Title is required.";
    pub const TITLE_TOO_LONG: &str = "Title must be 50 characters or fewer.";
    pub const CONTENT_REQUIRED: &str = "Content is required.";
    pub const CONTENT_TOO_LONG: &str = "Content must be 1000 characters or fewer.";
    pub const THUMBNAIL_URL_REQUIRED: &str = "Thumbnail URL is required.";
    pub const THUMBNAIL_URL_INVALID: &str = "Please enter a valid URL.";
    pub const THUMBNAIL_IMAGE_REQUIRED: &str = "Thumbnail image is required.";
    pub const CATEGORIES_REQUIRED: &str = "Select at least one category.";
    pub const CONTACT_NAME_REQUIRED: &str = "Name is required.";
    pub const CONTACT_NAME_TOO_LONG: &str = "Name must be 30 characters or fewer.";
    pub const EMAIL_REQUIRED: &str = "Email is required.";
    pub const EMAIL_INVALID: &str = "Please enter a valid email address.";
    pub const MESSAGE_REQUIRED: &str = "Message is required.";
    pub const MESSAGE_TOO_LONG: &str = "Message must be 500 characters or fewer.";
    pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters.";
}

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?://)\S+$").expect("valid url regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    fn check(&mut self, field: &str, result: Option<&'static str>) {
        if let Some(message) = result {
            self.insert(field, message);
        }
    }

    /// `Ok(())` when nothing was reported, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Whether a post must carry a thumbnail image key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThumbnailPolicy {
    #[default]
    Optional,
    Required,
}

fn required_max(
    value: &str,
    max: usize,
    required: &'static str,
    too_long: &'static str,
) -> Option<&'static str> {
    if value.trim().is_empty() {
        Some(required)
    } else if value.chars().count() > max {
        Some(too_long)
    } else {
        None
    }
}

pub fn validate_category(form: &CategoryRequest) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check(
        field::NAME,
        required_max(
            &form.name,
            CATEGORY_NAME_MAX,
            messages::CATEGORY_NAME_REQUIRED,
            messages::CATEGORY_NAME_TOO_LONG,
        ),
    );
    errors
}

pub fn validate_post(form: &PostRequest, thumbnail: ThumbnailPolicy) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check(
        field::TITLE,
        required_max(
            &form.title,
            TITLE_MAX,
            messages::TITLE_REQUIRED,
            messages::TITLE_TOO_LONG,
        ),
    );
    errors.check(
        field::CONTENT,
        required_max(
            &form.content,
            CONTENT_MAX,
            messages::CONTENT_REQUIRED,
            messages::CONTENT_TOO_LONG,
        ),
    );

    let has_thumbnail = form
        .thumbnail_image_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());
    if thumbnail == ThumbnailPolicy::Required && !has_thumbnail {
        errors.insert(field::THUMBNAIL_IMAGE_KEY, messages::THUMBNAIL_IMAGE_REQUIRED);
    }

    if form.categories.is_empty() {
        errors.insert(field::CATEGORIES, messages::CATEGORIES_REQUIRED);
    }
    errors
}

/// Rule for the legacy literal `thumbnailUrl` field.
pub fn validate_thumbnail_url(url: &str) -> Option<&'static str> {
    if url.trim().is_empty() {
        Some(messages::THUMBNAIL_URL_REQUIRED)
    } else if !URL_RE.is_match(url) {
        Some(messages::THUMBNAIL_URL_INVALID)
    } else {
        None
    }
}

fn validate_email(email: &str) -> Option<&'static str> {
    if email.trim().is_empty() {
        Some(messages::EMAIL_REQUIRED)
    } else if !EMAIL_RE.is_match(email.trim()) {
        Some(messages::EMAIL_INVALID)
    } else {
        None
    }
}

pub fn validate_contact(form: &ContactRequest) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check(
        field::NAME,
        required_max(
            &form.name,
            CONTACT_NAME_MAX,
            messages::CONTACT_NAME_REQUIRED,
            messages::CONTACT_NAME_TOO_LONG,
        ),
    );
    errors.check(field::EMAIL, validate_email(&form.email));
    errors.check(
        field::MESSAGE,
        required_max(
            &form.message,
            CONTACT_MESSAGE_MAX,
            messages::MESSAGE_REQUIRED,
            messages::MESSAGE_TOO_LONG,
        ),
    );
    errors
}

pub fn validate_signup(form: &SignupRequest) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check(field::EMAIL, validate_email(&form.email));
    if form.password.chars().count() < PASSWORD_MIN {
        errors.insert(field::PASSWORD, messages::PASSWORD_TOO_SHORT);
    }
    errors
}
