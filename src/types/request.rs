//! Generation request types and validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{QuillonError, Result};

/// Maximum topic length, in characters.
pub const MAX_TOPIC_CHARS: usize = 500;
/// Maximum number of keywords per request.
pub const MAX_KEYWORDS: usize = 50;
/// Maximum requested length, in words.
pub const MAX_TARGET_LENGTH: u32 = 20_000;

/// Kind of content to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    BlogPost,
    Article,
    ProductDescription,
    SocialMedia,
    Email,
    LandingPage,
    AdCopy,
    MetaDescription,
    PressRelease,
    Newsletter,
}

impl ContentType {
    /// All recognised content types.
    pub const ALL: [ContentType; 10] = [
        ContentType::BlogPost,
        ContentType::Article,
        ContentType::ProductDescription,
        ContentType::SocialMedia,
        ContentType::Email,
        ContentType::LandingPage,
        ContentType::AdCopy,
        ContentType::MetaDescription,
        ContentType::PressRelease,
        ContentType::Newsletter,
    ];

    /// Wire name (snake_case).
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::BlogPost => "blog_post",
            ContentType::Article => "article",
            ContentType::ProductDescription => "product_description",
            ContentType::SocialMedia => "social_media",
            ContentType::Email => "email",
            ContentType::LandingPage => "landing_page",
            ContentType::AdCopy => "ad_copy",
            ContentType::MetaDescription => "meta_description",
            ContentType::PressRelease => "press_release",
            ContentType::Newsletter => "newsletter",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = QuillonError;

    fn from_str(s: &str) -> Result<Self> {
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| QuillonError::Validation(format!("unsupported content type '{s}'")))
    }
}

/// Writing persona applied to the generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl Personality {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tone: None,
            style: None,
        }
    }

    pub fn tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// A single content-generation request.
///
/// Only a subset of fields determines the cache key; see
/// [`fingerprint()`](crate::fingerprint::fingerprint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub content_type: ContentType,

    pub topic: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Desired length in words.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_length: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<Personality>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Free-form background passed through to the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
}

impl GenerationRequest {
    /// Create a request with the required fields.
    pub fn new(content_type: ContentType, topic: impl Into<String>) -> Self {
        Self {
            content_type,
            topic: topic.into(),
            keywords: Vec::new(),
            target_length: None,
            language: None,
            personality: None,
            template: None,
            context: None,
            requirements: Vec::new(),
        }
    }

    /// Add a keyword.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    /// Replace the keyword list.
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn target_length(mut self, words: u32) -> Self {
        self.target_length = Some(words);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn personality(mut self, personality: Personality) -> Self {
        self.personality = Some(personality);
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirements.push(requirement.into());
        self
    }

    /// Check the request before it is dispatched.
    ///
    /// Returns `Validation` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(QuillonError::Validation("topic must not be empty".into()));
        }
        if topic.chars().count() > MAX_TOPIC_CHARS {
            return Err(QuillonError::Validation(format!(
                "topic exceeds {MAX_TOPIC_CHARS} characters"
            )));
        }
        if self.keywords.len() > MAX_KEYWORDS {
            return Err(QuillonError::Validation(format!(
                "at most {MAX_KEYWORDS} keywords are allowed, got {}",
                self.keywords.len()
            )));
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(QuillonError::Validation("keywords must not be blank".into()));
        }
        if let Some(len) = self.target_length {
            if len == 0 || len > MAX_TARGET_LENGTH {
                return Err(QuillonError::Validation(format!(
                    "target_length must be within 1..={MAX_TARGET_LENGTH}, got {len}"
                )));
            }
        }
        check_not_blank("language", self.language.as_deref())?;
        check_not_blank("template", self.template.as_deref())?;
        check_not_blank(
            "personality name",
            self.personality.as_ref().map(|p| p.name.as_str()),
        )?;
        Ok(())
    }
}

fn check_not_blank(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if v.trim().is_empty() => Err(QuillonError::Validation(format!(
            "{field} must not be blank when set"
        ))),
        _ => Ok(()),
    }
}
