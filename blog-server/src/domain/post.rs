use blog_core::validation::{ThumbnailPolicy, validate_category, validate_post};
use blog_core::{CategoryId, CategoryRequest, PostRequest, ValidationErrors};

/// Post fields that passed validation and are ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub thumbnail_image_key: Option<String>,
    pub category_ids: Vec<CategoryId>,
}

impl TryFrom<PostRequest> for NewPost {
    type Error = ValidationErrors;

    fn try_from(req: PostRequest) -> Result<Self, Self::Error> {
        validate_post(&req, ThumbnailPolicy::Optional).into_result()?;

        let mut category_ids = Vec::with_capacity(req.categories.len());
        for id in req.category_ids() {
            if !category_ids.contains(&id) {
                category_ids.push(id);
            }
        }

        Ok(Self {
            title: req.title,
            content: req.content,
            thumbnail_image_key: req
                .thumbnail_image_key
                .filter(|key| !key.trim().is_empty()),
            category_ids,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

impl TryFrom<CategoryRequest> for NewCategory {
    type Error = ValidationErrors;

    fn try_from(req: CategoryRequest) -> Result<Self, Self::Error> {
        validate_category(&req).into_result()?;
        Ok(Self { name: req.name })
    }
}
