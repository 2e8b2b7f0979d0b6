//! Workflow request and result types.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// The content workflows offered by the studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    ProductDescription,
    BlogPost,
    SocialPost,
    Email,
    AdCopy,
    VideoScript,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 6] = [
        Self::ProductDescription,
        Self::BlogPost,
        Self::SocialPost,
        Self::Email,
        Self::AdCopy,
        Self::VideoScript,
    ];
}

impl std::fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ProductDescription => "product_description",
            Self::BlogPost => "blog_post",
            Self::SocialPost => "social_post",
            Self::Email => "email",
            Self::AdCopy => "ad_copy",
            Self::VideoScript => "video_script",
        };
        write!(f, "{s}")
    }
}

/// Voice of the generated copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Persuasive,
    Fun,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostLength {
    Short,
    #[default]
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    #[default]
    Instagram,
    Facebook,
    Linkedin,
    Twitter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    #[default]
    Promotional,
    Welcome,
    Newsletter,
    AbandonedCart,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdPlatform {
    #[default]
    GoogleAds,
    MetaAds,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDescriptionInput {
    pub product_name: String,
    /// Comma-separated feature list.
    #[serde(default)]
    pub features: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub tone: Tone,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogPostInput {
    pub topic: String,
    /// Comma-separated SEO keywords.
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub length: PostLength,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialPostInput {
    pub topic: String,
    #[serde(default)]
    pub platform: SocialPlatform,
    /// Comma-separated hashtags, with or without `#`.
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub call_to_action: Option<String>,
    #[serde(default)]
    pub tone: Tone,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailInput {
    pub offer: String,
    #[serde(default)]
    pub email_type: EmailType,
    #[serde(default)]
    pub audience: String,
    /// Discount percentage, if any.
    #[serde(default)]
    pub discount: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdCopyInput {
    pub product: String,
    #[serde(default)]
    pub platform: AdPlatform,
    #[serde(default)]
    pub benefit: String,
    #[serde(default)]
    pub audience: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoScriptInput {
    pub topic: String,
    #[serde(default = "default_duration")]
    pub duration_seconds: u32,
    #[serde(default)]
    pub audience: String,
    /// Comma-separated key points.
    #[serde(default)]
    pub key_points: String,
}

fn default_duration() -> u32 {
    60
}

/// A generation request, tagged by workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "workflow", rename_all = "snake_case")]
pub enum WorkflowRequest {
    ProductDescription(ProductDescriptionInput),
    BlogPost(BlogPostInput),
    SocialPost(SocialPostInput),
    Email(EmailInput),
    AdCopy(AdCopyInput),
    VideoScript(VideoScriptInput),
}

impl WorkflowRequest {
    pub fn kind(&self) -> WorkflowKind {
        match self {
            Self::ProductDescription(_) => WorkflowKind::ProductDescription,
            Self::BlogPost(_) => WorkflowKind::BlogPost,
            Self::SocialPost(_) => WorkflowKind::SocialPost,
            Self::Email(_) => WorkflowKind::Email,
            Self::AdCopy(_) => WorkflowKind::AdCopy,
            Self::VideoScript(_) => WorkflowKind::VideoScript,
        }
    }

    /// Reject requests missing their required field.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let (field, value) = match self {
            Self::ProductDescription(i) => ("product_name", &i.product_name),
            Self::BlogPost(i) => ("topic", &i.topic),
            Self::SocialPost(i) => ("topic", &i.topic),
            Self::Email(i) => ("offer", &i.offer),
            Self::AdCopy(i) => ("product", &i.product),
            Self::VideoScript(i) => ("topic", &i.topic),
        };
        if value.trim().is_empty() {
            return Err(WorkflowError::InvalidInput {
                workflow: self.kind().to_string(),
                reason: format!("{field} is required"),
            });
        }
        if let Self::VideoScript(i) = self {
            if !(15..=600).contains(&i.duration_seconds) {
                return Err(WorkflowError::InvalidInput {
                    workflow: self.kind().to_string(),
                    reason: "duration_seconds must be between 15 and 600".into(),
                });
            }
        }
        Ok(())
    }
}

/// Generated marketing copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedContent {
    pub workflow: WorkflowKind,
    pub title: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_deserializes_by_tag() {
        let req: WorkflowRequest = serde_json::from_value(serde_json::json!({
            "workflow": "social_post",
            "topic": "Lançamento de verão",
            "platform": "linkedin"
        }))
        .unwrap();
        assert_eq!(req.kind(), WorkflowKind::SocialPost);
        match req {
            WorkflowRequest::SocialPost(input) => {
                assert_eq!(input.platform, SocialPlatform::Linkedin);
                assert_eq!(input.tone, Tone::Professional);
                assert!(input.call_to_action.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn video_duration_defaults() {
        let req: WorkflowRequest = serde_json::from_value(serde_json::json!({
            "workflow": "video_script",
            "topic": "Unboxing"
        }))
        .unwrap();
        match req {
            WorkflowRequest::VideoScript(input) => assert_eq!(input.duration_seconds, 60),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validate_requires_primary_field() {
        let req = WorkflowRequest::Email(EmailInput {
            offer: "   ".into(),
            ..EmailInput::default()
        });
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("offer is required"));

        let req = WorkflowRequest::AdCopy(AdCopyInput {
            product: "Tênis Runner".into(),
            ..AdCopyInput::default()
        });
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validate_bounds_video_duration() {
        let req = WorkflowRequest::VideoScript(VideoScriptInput {
            topic: "Tutorial".into(),
            duration_seconds: 5,
            ..VideoScriptInput::default()
        });
        assert!(req.validate().is_err());
    }

    #[test]
    fn kind_display_matches_serde() {
        for kind in WorkflowKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(format!("\"{kind}\""), json);
        }
    }
}
