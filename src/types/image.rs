//! Image types attached to candidates.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// An image the model found on the web.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebImage {
    /// Image URL.
    pub url: String,
    /// Title, empty when the service gave none.
    pub title: String,
    /// Alt text, empty when the service gave none.
    pub alt: String,
}

/// An image generated by the model.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    /// Image URL.
    pub url: String,
    /// `[Generated Image N]`, or `[Generated Image]` without a number.
    pub title: String,
    /// Alt text, empty when the service gave none.
    pub alt: String,
    /// Session cookies at projection time; required to fetch the full-size image.
    #[serde(skip)]
    pub cookies: BTreeMap<String, String>,
}

impl fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("url", &self.url)
            .field("title", &self.title)
            .field("alt", &self.alt)
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Either kind of image, as returned by [`Candidate::images`](super::Candidate::images).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Image {
    /// Web-sourced image.
    Web(WebImage),
    /// Model-generated image.
    Generated(GeneratedImage),
}

impl Image {
    /// Image URL.
    pub fn url(&self) -> &str {
        match self {
            Image::Web(i) => &i.url,
            Image::Generated(i) => &i.url,
        }
    }

    /// Image title.
    pub fn title(&self) -> &str {
        match self {
            Image::Web(i) => &i.title,
            Image::Generated(i) => &i.title,
        }
    }

    /// Image alt text.
    pub fn alt(&self) -> &str {
        match self {
            Image::Web(i) => &i.alt,
            Image::Generated(i) => &i.alt,
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image(title='{}', url='{}', alt='{}')", self.title(), self.url(), self.alt())
    }
}

/// Title given to a generated image.
pub(crate) fn generated_image_title(number: Option<i64>) -> String {
    match number {
        Some(n) if n != 0 => format!("[Generated Image {n}]"),
        _ => "[Generated Image]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_image_title() {
        assert_eq!(generated_image_title(Some(3)), "[Generated Image 3]");
        assert_eq!(generated_image_title(Some(0)), "[Generated Image]");
        assert_eq!(generated_image_title(None), "[Generated Image]");
    }

    #[test]
    fn test_generated_image_debug_hides_cookie_values() {
        let mut cookies = BTreeMap::new();
        cookies.insert("__Secure-1PSID".to_string(), "secret".to_string());
        let image = GeneratedImage {
            url: "https://lh3.googleusercontent.com/x".to_string(),
            title: "[Generated Image 1]".to_string(),
            alt: String::new(),
            cookies,
        };
        let debug = format!("{:?}", image);
        assert!(debug.contains("__Secure-1PSID"));
        assert!(!debug.contains("secret"));
    }
}
