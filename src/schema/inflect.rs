//! English singularization for foreign-key inference
//!
//! `comments` -> `comment`, `categories` -> `category`, `people` -> `person`.

use inflector::string::singularize::to_singular;

/// Returns the singular form of an English plural noun.
///
/// Only the trailing word of a snake_case name is inflected:
/// `blog_posts` -> `blog_post`.
pub fn singularize(word: &str) -> String {
    let (prefix, last) = match word.rfind('_') {
        Some(pos) => word.split_at(pos + 1),
        None => ("", word),
    };

    format!("{}{}", prefix, to_singular(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("posts"), "post");
        assert_eq!(singularize("comments"), "comment");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
    }

    #[test]
    fn test_irregular_and_uncountable() {
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("children"), "child");
        assert_eq!(singularize("sheep"), "sheep");
    }

    #[test]
    fn test_already_singular() {
        assert_eq!(singularize("user"), "user");
        assert_eq!(singularize("profile"), "profile");
    }

    #[test]
    fn test_snake_case_tail() {
        assert_eq!(singularize("blog_posts"), "blog_post");
        assert_eq!(singularize("order_items"), "order_item");
    }
}
