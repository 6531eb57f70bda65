//! Business code generation for code-assignable entities.

use uuid::Uuid;

/// Produces codes for entities created with a blank code.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, kind: &str) -> String;
}

/// `<PREFIX>-<12 uppercase hex>`, where the prefix is the first three
/// alphanumeric characters of the entity kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, kind: &str) -> String {
        let prefix: String = kind
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_uppercase();
        let suffix = Uuid::new_v4().simple().to_string()[..12].to_uppercase();
        if prefix.is_empty() {
            suffix
        } else {
            format!("{}-{}", prefix, suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let code = RandomCodeGenerator.generate("document");
        let (prefix, suffix) = code.split_once('-').unwrap();
        assert_eq!(prefix, "DOC");
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_codes_are_unique() {
        let a = RandomCodeGenerator.generate("profile");
        let b = RandomCodeGenerator.generate("profile");
        assert_ne!(a, b);
    }
}
