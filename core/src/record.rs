use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of documentation unit a record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Section,
    Page,
    Type,
    Method,
    Function,
    /// Any category the generator emits that has no dedicated variant
    /// (`macro`, `constant`, `module`, ...).
    #[serde(other)]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Section => "section",
            Category::Page => "page",
            Category::Type => "type",
            Category::Method => "method",
            Category::Function => "function",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "section" => Ok(Category::Section),
            "page" => Ok(Category::Page),
            "type" => Ok(Category::Type),
            "method" => Ok(Category::Method),
            "function" => Ok(Category::Function),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category `{other}`")),
        }
    }
}

/// One indexed documentation unit. `location` is the navigation anchor and
/// must be unique within a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub location: String,
    pub page: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
    pub category: Category,
}

impl Record {
    pub fn new(
        location: impl Into<String>,
        page: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            location: location.into(),
            page: page.into(),
            title: title.into(),
            text: text.into(),
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_deserializes_as_other() {
        let r: Record = serde_json::from_str(
            r##"{"location":"#m","page":"P","title":"@m","text":"","category":"macro"}"##,
        )
        .unwrap();
        assert_eq!(r.category, Category::Other);
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Function".parse::<Category>(), Ok(Category::Function));
        assert!("widget".parse::<Category>().is_err());
    }
}
