use axum::{body::Bytes, extract::Multipart};
use mime::Mime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{errors::AppError, models::{Group, Post}};

pub const MAX_IMAGE_SIZE_MB: usize = 10;
const MAX_IMAGE_SIZE_BYTES: usize = MAX_IMAGE_SIZE_MB * 1024 * 1024;
const IMAGE_EXTENSIONS: &[&str] = &["gif", "jpg", "jpeg", "png", "webp", "bmp"];

const REQUIRED: &str = "This field is required.";

/// Field name -> messages, the shape every re-rendered form carries.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

fn add_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// An uploaded file as read from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: Option<String>,
    pub content_type: Option<Mime>,
    pub data: Bytes,
}

impl UploadedImage {
    fn looks_like_image(&self) -> bool {
        if let Some(ct) = &self.content_type {
            if ct.type_() == mime::IMAGE {
                return true;
            }
        }
        self.filename
            .as_deref()
            .and_then(|name| Path::new(name).extension().and_then(|e| e.to_str()))
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

/// Raw values of a submitted post form.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<UploadedImage>,
}

/// A post form that passed validation.
#[derive(Debug)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedImage>,
}

/// The post form as rendered back to the client: values plus errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostFormView {
    pub text: String,
    pub group: Option<i64>,
    pub image: Option<String>,
    pub errors: FieldErrors,
}

impl PostFormView {
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id(),
            image: post.image.clone(),
            errors: FieldErrors::new(),
        }
    }
}

impl PostSubmission {
    /// Reads `text`, `group` and `image` from a multipart body. Unknown fields
    /// are ignored; an empty file part counts as no image.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = PostSubmission::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::malformed(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match name.as_str() {
                "text" => {
                    let text = field.text().await.map_err(|e| AppError::malformed(e.to_string()))?;
                    submission.text = Some(text);
                }
                "group" => {
                    let group = field.text().await.map_err(|e| AppError::malformed(e.to_string()))?;
                    submission.group = Some(group);
                }
                "image" => {
                    let filename = field.file_name().map(str::to_owned);
                    let content_type = field.content_type().and_then(|ct| ct.parse::<Mime>().ok());
                    let data = field.bytes().await.map_err(|e| AppError::malformed(e.to_string()))?;
                    if !data.is_empty() {
                        submission.image = Some(UploadedImage {
                            filename,
                            content_type,
                            data,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(submission)
    }

    /// Validates against the existing groups. On failure returns the form
    /// with the entered values preserved and the errors per field.
    pub fn validate(self, groups: &[Group]) -> Result<ValidPost, PostFormView> {
        let mut errors = FieldErrors::new();

        let text = self.text.as_deref().unwrap_or("").trim().to_string();
        if text.is_empty() {
            add_error(&mut errors, "text", REQUIRED);
        }

        let raw_group = self.group.as_deref().map(str::trim).unwrap_or("");
        let group_id = if raw_group.is_empty() {
            None
        } else {
            match raw_group.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    add_error(
                        &mut errors,
                        "group",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                    None
                }
            }
        };

        if let Some(image) = &self.image {
            if !image.looks_like_image() {
                add_error(
                    &mut errors,
                    "image",
                    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                );
            } else if image.data.len() > MAX_IMAGE_SIZE_BYTES {
                add_error(
                    &mut errors,
                    "image",
                    format!("Image size exceeds limit ({} MB).", MAX_IMAGE_SIZE_MB),
                );
            }
        }

        if errors.is_empty() {
            Ok(ValidPost {
                text,
                group_id,
                image: self.image,
            })
        } else {
            Err(PostFormView {
                text: self.text.unwrap_or_default(),
                group: raw_group.parse::<i64>().ok(),
                image: None,
                errors,
            })
        }
    }
}

/// Submitted comment form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    /// The trimmed text, or None when the form is invalid.
    pub fn cleaned_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// The comment form as rendered on the post detail page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommentFormView {
    pub text: String,
    pub errors: FieldErrors,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![Group {
            id: 1,
            title: "Cats".into(),
            slug: "cats".into(),
            description: String::new(),
        }]
    }

    fn gif() -> UploadedImage {
        UploadedImage {
            filename: Some("small.gif".into()),
            content_type: Some(mime::IMAGE_GIF),
            data: Bytes::from_static(b"GIF89a"),
        }
    }

    #[test]
    fn valid_submission_is_trimmed_and_bound() {
        let submission = PostSubmission {
            text: Some("  hello  ".into()),
            group: Some("1".into()),
            image: Some(gif()),
        };
        let valid = submission.validate(&groups()).unwrap();
        assert_eq!(valid.text, "hello");
        assert_eq!(valid.group_id, Some(1));
        assert!(valid.image.is_some());
    }

    #[test]
    fn empty_group_means_no_group() {
        let submission = PostSubmission {
            text: Some("hello".into()),
            group: Some(String::new()),
            image: None,
        };
        assert_eq!(submission.validate(&groups()).unwrap().group_id, None);
    }

    #[test]
    fn blank_text_and_unknown_group_are_reported() {
        let submission = PostSubmission {
            text: Some("   ".into()),
            group: Some("42".into()),
            image: None,
        };
        let form = submission.validate(&groups()).unwrap_err();
        assert!(form.errors.contains_key("text"));
        assert!(form.errors.contains_key("group"));
        assert_eq!(form.group, Some(42));
        assert_eq!(form.text, "   ");
    }

    #[test]
    fn non_image_upload_is_rejected() {
        let submission = PostSubmission {
            text: Some("hello".into()),
            group: None,
            image: Some(UploadedImage {
                filename: Some("notes.txt".into()),
                content_type: Some(mime::TEXT_PLAIN),
                data: Bytes::from_static(b"plain"),
            }),
        };
        let form = submission.validate(&groups()).unwrap_err();
        assert_eq!(form.errors.len(), 1);
        assert!(form.errors.contains_key("image"));
    }

    #[test]
    fn comment_requires_text() {
        assert_eq!(CommentForm { text: " ".into() }.cleaned_text(), None);
        assert_eq!(CommentForm { text: " hi ".into() }.cleaned_text(), Some("hi"));
    }
}
