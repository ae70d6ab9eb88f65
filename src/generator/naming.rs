use heck::{ToSnakeCase, ToUpperCamelCase};

/// Names derived from one configured entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityNames {
    /// `order_item`
    pub snake: String,
    /// `OrderItem`
    pub camel: String,
    /// `order_items`
    pub plural: String,
}

impl EntityNames {
    pub fn new(entity: &str) -> Self {
        let snake = entity.to_snake_case();
        Self {
            camel: entity.to_upper_camel_case(),
            plural: pluralize(&snake),
            snake,
        }
    }

    /// `/order_items`
    pub fn route_path(&self) -> String {
        format!("/{}", self.plural)
    }
}

/// English plural for identifiers: `box` -> `boxes`, `category` -> `categories`.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }
    format!("{word}s")
}
